//! HTTP routing.
//!
//! Route table:
//!
//! | Method | Path                      | Handler                    |
//! |--------|---------------------------|----------------------------|
//! | GET    | `/health`                 | liveness probe             |
//! | GET    | `/health/ready`           | readiness probe (DB ping)  |
//! | GET    | `/cart/{identity}`        | [`cart::get_cart`]         |
//! | POST   | `/cart/{identity}/add`    | [`cart::add_item`]         |
//! | POST   | `/cart/{identity}/update` | [`cart::update_item`]      |
//! | DELETE | `/cart/{identity}/clear`  | [`cart::clear_cart`]       |
//! | POST   | `/orders`                 | [`orders::create_order`]   |
//! | GET    | `/orders`                 | [`orders::list_orders`]    |
//! | PATCH  | `/orders/{id}`            | [`orders::update_status`]  |
//! | GET    | `/geocode/reverse`        | [`geocode::reverse`]       |

pub mod cart;
pub mod geocode;
pub mod orders;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/cart/{identity}", get(cart::get_cart))
        .route("/cart/{identity}/add", post(cart::add_item))
        .route("/cart/{identity}/update", post(cart::update_item))
        .route("/cart/{identity}/clear", axum::routing::delete(cart::clear_cart))
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .route("/orders/{id}", patch(orders::update_status))
        .route("/geocode/reverse", get(geocode::reverse))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
