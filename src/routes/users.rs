use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as RespJson,
    routing::get,
    Router,
};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::model::payment::AddPaymentMethodRequest;
use crate::model::ride::RideHistoryQuery;
use crate::model::{PaymentMethod, Ride, RideFilter, RideStatus, RideSummary, User};
use crate::routes::AppState;

pub fn users_router() -> Router {
    Router::new()
        .route("/:id", get(get_user))
        .route("/:id/rides", get(list_user_rides))
        .route("/:id/summary", get(ride_summary))
        .route(
            "/:id/payment-methods",
            get(list_payment_methods).post(add_payment_method),
        )
}

async fn get_user(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<RespJson<User>> {
    Ok(RespJson(state.ledger.accounts().get_user(&user_id).await?))
}

// Ride history, newest first
async fn list_user_rides(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<RideHistoryQuery>,
) -> ApiResult<RespJson<Vec<Ride>>> {
    let status = match params.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<RideStatus>().map_err(ApiError::BadRequest)?),
    };
    let filter = RideFilter {
        status,
        search: params.search,
    };

    Ok(RespJson(
        state.ledger.list_rides_for_user(&user_id, &filter).await,
    ))
}

async fn ride_summary(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
) -> RespJson<RideSummary> {
    RespJson(state.ledger.ride_summary(&user_id).await)
}

async fn list_payment_methods(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<RespJson<Vec<PaymentMethod>>> {
    Ok(RespJson(
        state.ledger.accounts().payment_methods(&user_id).await?,
    ))
}

async fn add_payment_method(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AddPaymentMethodRequest>,
) -> ApiResult<(StatusCode, RespJson<Vec<PaymentMethod>>)> {
    payload.validate()?;
    payload.validate_digits().map_err(ApiError::BadRequest)?;

    let user = state
        .ledger
        .accounts()
        .add_payment_method(&user_id, payload.into_method())
        .await?;

    Ok((StatusCode::CREATED, RespJson(user.payment_methods)))
}
