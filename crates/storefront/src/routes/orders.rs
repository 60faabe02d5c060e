//! Order endpoints.
//!
//! Order creation is where cart-style product references become frozen
//! line items: every requested product is resolved against the catalog at
//! this moment, priced, and the snapshot persisted. Later catalog edits
//! never touch an existing order.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use reign_core::{Coordinates, OrderId, OrderStatus, PaymentMethod, ProductId};

use crate::db::OrderRepository;
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::models::{NewOrder, Order, OrderLineItem};
use crate::pricing;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer: CustomerDetails,
    pub payment_method: PaymentMethod,
    pub delivery_coordinates: Option<Coordinates>,
    pub delivery_address: Option<String>,
    pub meetup_location_id: Option<String>,
    pub items: Vec<RequestedItem>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// POST `/orders` - price and persist a new order.
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    if request.customer.name.trim().is_empty() {
        return Err(AppError::Validation("customer name is required".into()));
    }
    if request.customer.contact.trim().is_empty() {
        return Err(AppError::Validation("customer contact is required".into()));
    }
    if request.delivery_coordinates.is_some_and(|c| !c.is_valid()) {
        return Err(AppError::Validation(
            "delivery coordinates are out of range".into(),
        ));
    }

    let items = resolve_line_items(&state, &request.items).await?;

    let quote = pricing::price_order(
        &items,
        request.payment_method,
        request.delivery_coordinates,
        request.meetup_location_id.as_deref(),
        state.checkout(),
    )?;

    // Client-supplied address wins; otherwise resolve one best-effort. A
    // geocoding outage must never block checkout.
    let delivery_address = match (request.payment_method, request.delivery_address) {
        (PaymentMethod::Meetup, _) => None,
        (PaymentMethod::Cod, Some(address)) if !address.trim().is_empty() => Some(address),
        (PaymentMethod::Cod, _) => match request.delivery_coordinates {
            Some(coords) => match state.geocoder().reverse(coords).await {
                Ok(address) => Some(address),
                Err(err) => {
                    tracing::warn!(error = %err, "reverse geocoding failed, storing order without address");
                    None
                }
            },
            None => None,
        },
    };

    let order = OrderRepository::new(state.pool())
        .insert(NewOrder {
            customer_name: request.customer.name,
            contact: request.customer.contact,
            payment_method: request.payment_method,
            delivery_coordinates: request.delivery_coordinates,
            delivery_address,
            meetup_location_id: request.meetup_location_id,
            items,
            subtotal: quote.subtotal,
            delivery_fee: quote.delivery_fee,
            total: quote.total,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET `/orders` - all orders, newest first.
#[tracing::instrument(skip_all)]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    Ok(Json(orders))
}

/// PATCH `/orders/{id}` - move an order along the status machine.
#[tracing::instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no order with id {id}")))?;

    if !order.status.can_transition_to(request.status) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: request.status,
        });
    }

    repo.set_status(id, order.status, request.status).await?;

    Ok(Json(Order {
        status: request.status,
        ..order
    }))
}

/// Resolve requested product references into frozen line items at current
/// catalog values.
async fn resolve_line_items(
    state: &AppState,
    requested: &[RequestedItem],
) -> Result<Vec<OrderLineItem>, AppError> {
    if requested.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one item".into(),
        ));
    }

    let ids: Vec<ProductId> = requested.iter().map(|item| item.product_id).collect();
    let catalog: HashMap<_, _> = ProductRepository::new(state.pool()).get_many(&ids).await?;

    requested
        .iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q >= 1)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "quantity for product {} must be at least 1",
                        item.product_id
                    ))
                })?;
            let product = catalog.get(&item.product_id).ok_or_else(|| {
                AppError::Validation(format!("unknown product: {}", item.product_id))
            })?;
            Ok(OrderLineItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity,
            })
        })
        .collect()
}
