use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Json as RespJson,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::model::ride::{ChargeRideRequest, EndRideRequest, StartRideRequest};
use crate::model::{Payment, Ride};
use crate::routes::AppState;
use crate::session::FinishedRide;

pub fn ride_router() -> Router {
    Router::new()
        .route("/api/rides", post(start_ride))
        .route("/api/rides/:id", get(get_ride))
        .route("/api/rides/:id/pause", post(pause_ride))
        .route("/api/rides/:id/resume", post(resume_ride))
        .route("/api/rides/:id/end", post(end_ride))
        .route("/api/rides/:id/cancel", post(cancel_ride))
        .route("/api/rides/:id/payment", post(charge_ride))
}

fn parse_ride_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid ride id '{}'", raw)))
}

// Unlock a scooter with the scanned code
async fn start_ride(
    Extension(state): Extension<AppState>,
    Json(payload): Json<StartRideRequest>,
) -> ApiResult<(StatusCode, RespJson<Ride>)> {
    payload.validate()?;

    let ride = state
        .ledger
        .start_ride(
            &payload.user_id,
            &payload.scooter_id,
            &payload.qr_code,
            payload.location,
        )
        .await?;

    Ok((StatusCode::CREATED, RespJson(ride)))
}

async fn get_ride(
    Extension(state): Extension<AppState>,
    Path(ride_id): Path<String>,
) -> ApiResult<RespJson<Ride>> {
    let ride_id = parse_ride_id(&ride_id)?;
    Ok(RespJson(state.ledger.get_ride(ride_id).await?))
}

async fn pause_ride(
    Extension(state): Extension<AppState>,
    Path(ride_id): Path<String>,
) -> ApiResult<RespJson<Ride>> {
    let ride_id = parse_ride_id(&ride_id)?;
    Ok(RespJson(state.ledger.pause_ride(ride_id).await?))
}

async fn resume_ride(
    Extension(state): Extension<AppState>,
    Path(ride_id): Path<String>,
) -> ApiResult<RespJson<Ride>> {
    let ride_id = parse_ride_id(&ride_id)?;
    Ok(RespJson(state.ledger.resume_ride(ride_id).await?))
}

async fn end_ride(
    Extension(state): Extension<AppState>,
    Path(ride_id): Path<String>,
    Json(payload): Json<EndRideRequest>,
) -> ApiResult<RespJson<Ride>> {
    let ride_id = parse_ride_id(&ride_id)?;
    payload.validate()?;

    let end_time = payload.end_time.unwrap_or_else(Utc::now);
    Ok(RespJson(
        state.ledger.end_ride(ride_id, payload.location, end_time).await?,
    ))
}

async fn cancel_ride(
    Extension(state): Extension<AppState>,
    Path(ride_id): Path<String>,
) -> ApiResult<RespJson<Ride>> {
    let ride_id = parse_ride_id(&ride_id)?;
    Ok(RespJson(state.ledger.cancel_ride(ride_id).await?))
}

// Charge a completed ride. Falls back to the rider's default method.
async fn charge_ride(
    Extension(state): Extension<AppState>,
    Path(ride_id): Path<String>,
    payload: Option<Json<ChargeRideRequest>>,
) -> ApiResult<RespJson<FinishedRide>> {
    let ride_id = parse_ride_id(&ride_id)?;
    let Json(payload) = payload.unwrap_or_default();

    let ride = state.ledger.reserve_payment(ride_id).await?;
    let charged = charge_reserved(&state, &ride, payload.payment_method_id).await;
    if charged.is_err() {
        state.ledger.release_payment(ride_id).await;
    }
    let payment = charged?;
    let ride = state.ledger.record_payment(ride.id, payment.id).await?;

    Ok(RespJson(FinishedRide {
        ride,
        payment: Some(payment),
    }))
}

async fn charge_reserved(
    state: &AppState,
    ride: &Ride,
    payment_method_id: Option<String>,
) -> ApiResult<Payment> {
    if ride.cost == Decimal::ZERO {
        return Err(ApiError::BadRequest("ride has no fare to charge".to_string()));
    }

    let method_id = match payment_method_id {
        Some(id) => id,
        None => state
            .ledger
            .accounts()
            .default_payment_method(&ride.user_id)
            .await?
            .map(|m| m.id)
            .ok_or_else(|| ApiError::BadRequest("no payment method given and no default on file".to_string()))?,
    };

    Ok(state.gateway.charge(&method_id, ride.id, ride.cost).await?)
}
