//! Rental API route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::requests::{OpenBookingRequest, SettleBookingRequest, SimulateQuery};
use super::responses::{BookingResponse, PlanResponse, SettlementResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans/:plan_id", get(get_plan))
        .route("/bookings", post(open_booking))
        .route("/bookings/:booking_id", get(get_booking))
        .route("/bookings/:booking_id/simulate", get(simulate))
        .route("/bookings/:booking_id/settle", post(settle))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<PlanResponse>> {
    let plan = state.engine.get_plan(plan_id).await?;
    Ok(Json(plan.into()))
}

async fn open_booking(
    State(state): State<AppState>,
    Json(req): Json<OpenBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let booking = state.bookings.open_booking(req.into()).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = state.engine.get_booking(booking_id).await?;
    Ok(Json(booking.into()))
}

/// Preview the cost of returning at `return_at` (or now)
async fn simulate(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Query(query): Query<SimulateQuery>,
) -> Result<Json<SettlementResponse>> {
    let breakdown = state.simulator.simulate(booking_id, query.return_at).await?;
    Ok(Json(breakdown.into()))
}

/// Settle and close a booking; without a body the return is stamped now
async fn settle(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    body: Option<Json<SettleBookingRequest>>,
) -> Result<Json<SettlementResponse>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let breakdown = state
        .engine
        .finalize(booking_id, req.actual_return_date)
        .await?;
    Ok(Json(breakdown.into()))
}
