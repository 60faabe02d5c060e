//! Reverse-geocoding endpoint.
//!
//! Thin pass-through to the geocoding gateway, used by the checkout UI to
//! show the customer the address under their map pin.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use reign_core::Coordinates;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseResponse {
    pub address: String,
}

/// GET `/geocode/reverse?lat=&lon=`
#[tracing::instrument(skip_all)]
pub async fn reverse(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ReverseResponse>, AppError> {
    let point = Coordinates::new(query.lat, query.lon);
    if !point.is_valid() {
        return Err(AppError::Validation(
            "coordinates are out of range".into(),
        ));
    }

    let address = state.geocoder().reverse(point).await?;
    Ok(Json(ReverseResponse { address }))
}
