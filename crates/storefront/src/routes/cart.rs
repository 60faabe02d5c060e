//! Cart endpoints.
//!
//! Carts are keyed by the customer's email address in the path. Every
//! mutation responds with the full hydrated cart so clients never need a
//! follow-up read.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use reign_core::{Email, ProductId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::models::CartView;
use crate::state::AppState;

/// How many times a failed cart increment is retried before giving up.
const MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

fn parse_identity(raw: &str) -> Result<Email, AppError> {
    Email::parse(raw).map_err(|e| AppError::Validation(format!("invalid cart identity: {e}")))
}

/// GET `/cart/{identity}` - the hydrated cart, empty if none exists.
#[tracing::instrument(skip_all)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<CartView>, AppError> {
    let identity = parse_identity(&identity)?;
    let view = CartRepository::new(state.pool()).view(&identity).await?;
    Ok(Json(view))
}

/// POST `/cart/{identity}/add` - increment a product's quantity.
///
/// The increment itself is a single atomic upsert; retries here cover
/// transient storage failures only, never lost updates.
#[tracing::instrument(skip_all)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>, AppError> {
    let identity = parse_identity(&identity)?;
    let quantity = u32::try_from(request.quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| AppError::Validation("quantity must be at least 1".into()))?;

    let products = ProductRepository::new(state.pool());
    if products.get(request.product_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "no product with id {}",
            request.product_id
        )));
    }

    let carts = CartRepository::new(state.pool());
    let mut attempt = 0;
    loop {
        attempt += 1;
        match carts.add_item(&identity, request.product_id, quantity).await {
            Ok(()) => break,
            Err(RepositoryError::Database(err)) if attempt < MAX_WRITE_ATTEMPTS => {
                tracing::warn!(attempt, error = %err, "cart increment failed, retrying");
            }
            Err(RepositoryError::Database(err)) => {
                tracing::error!(attempt, error = %err, "cart increment exhausted retries");
                return Err(AppError::ExternalService(
                    "cart storage is temporarily unavailable".into(),
                ));
            }
            Err(other) => return Err(other.into()),
        }
    }

    let view = carts.view(&identity).await?;
    Ok(Json(view))
}

/// POST `/cart/{identity}/update` - set a product's quantity absolutely.
///
/// A quantity below one removes the row.
#[tracing::instrument(skip_all)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartView>, AppError> {
    let identity = parse_identity(&identity)?;
    let carts = CartRepository::new(state.pool());

    carts
        .set_quantity(&identity, request.product_id, request.quantity)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => AppError::NotFound(format!(
                "no cart item for product {}",
                request.product_id
            )),
            other => other.into(),
        })?;

    let view = carts.view(&identity).await?;
    Ok(Json(view))
}

/// DELETE `/cart/{identity}/clear` - empty the cart. Idempotent.
#[tracing::instrument(skip_all)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<CartView>, AppError> {
    let identity = parse_identity(&identity)?;
    CartRepository::new(state.pool()).clear(&identity).await?;
    Ok(Json(CartView::empty()))
}
