//! Rental settlement module.
//!
//! Opens bookings against rental plans and settles them when the motorcycle
//! comes back: on time, early, or late.

pub mod bookings;
pub mod calculators;
pub mod errors;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod simulation;
pub mod store;

// Re-export commonly used items
pub use bookings::{BookingService, NewBooking};
pub use calculators::{calculate_settlement, round_money};
pub use errors::{BookingError, PlanError, SettlementError, StoreError};
pub use models::{Booking, BookingStatus, PlanTerms, RentalPlan, ReturnKind, SettlementBreakdown};
pub use routes::router;
pub use services::SettlementEngine;
pub use simulation::Simulator;
