//! Route table
//!
//! - `POST   /order`            place a limit or market order
//! - `DELETE /order/:id`        cancel a resting order
//! - `GET    /order/:id`        list a user's resting orders
//! - `GET    /book/:market`     full book snapshot
//! - `GET    /book/:market/bid` best bid price
//! - `GET    /book/:market/ask` best ask price

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/order", post(handlers::place_order))
        .route(
            "/order/:id",
            get(handlers::get_orders).delete(handlers::cancel_order),
        )
        .route("/book/:market", get(handlers::get_book))
        .route("/book/:market/bid", get(handlers::get_best_bid))
        .route("/book/:market/ask", get(handlers::get_best_ask))
        .with_state(state)
}
