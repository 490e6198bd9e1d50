use axum::{
    extract::{Extension, Path, Query},
    response::Json as RespJson,
    routing::get,
    Router,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::model::scooter::{FareQuoteResponse, NearbyQuery, NearbyScooter, QuoteQuery};
use crate::model::{Coordinate, Scooter};
use crate::routes::AppState;

/// Minutes the payment screen estimates when the caller gives none.
const DEFAULT_QUOTE_MINUTES: u32 = 15;

pub fn scooter_router() -> Router {
    Router::new()
        .route("/api/scooters", get(list_scooters))
        .route("/api/scooters/nearby", get(nearby_scooters))
        .route("/api/scooters/:id", get(get_scooter))
        .route("/api/scooters/:id/quote", get(quote_fare))
}

async fn list_scooters(Extension(state): Extension<AppState>) -> RespJson<Vec<Scooter>> {
    RespJson(state.ledger.list_scooters().await)
}

async fn get_scooter(
    Extension(state): Extension<AppState>,
    Path(scooter_id): Path<String>,
) -> ApiResult<RespJson<Scooter>> {
    Ok(RespJson(state.ledger.get_scooter(&scooter_id).await?))
}

// Available scooters around a point, nearest first
async fn nearby_scooters(
    Extension(state): Extension<AppState>,
    Query(params): Query<NearbyQuery>,
) -> ApiResult<RespJson<Vec<NearbyScooter>>> {
    params.validate()?;

    let here = Coordinate::new(params.lat, params.lon);
    let radius = params.radius.unwrap_or(state.config.nearby_radius_meters);

    let scooters = state
        .ledger
        .nearby_available_scooters(here, radius)
        .await
        .into_iter()
        .map(|scooter| NearbyScooter {
            distance_meters: here.distance_meters(&scooter.location),
            scooter,
        })
        .collect();

    Ok(RespJson(scooters))
}

async fn quote_fare(
    Extension(state): Extension<AppState>,
    Path(scooter_id): Path<String>,
    Query(params): Query<QuoteQuery>,
) -> ApiResult<RespJson<FareQuoteResponse>> {
    let minutes = params.minutes.unwrap_or(DEFAULT_QUOTE_MINUTES);
    let scooter = state.ledger.get_scooter(&scooter_id).await?;
    let estimate = state.ledger.quote_fare(&scooter_id, minutes).await?;

    Ok(RespJson(FareQuoteResponse {
        scooter_id: scooter.id,
        minutes,
        rate_per_minute: scooter.hourly_rate,
        estimate,
        currency: state.config.currency.clone(),
    }))
}
