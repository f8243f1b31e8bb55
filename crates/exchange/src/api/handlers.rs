//! HTTP handlers
//!
//! The wire format keeps the original Go-style field casing
//! (`UserID`, `TotalBidVolume`, ...) so existing clients keep working.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use orderbook::{OrderId, RestingOrder, Side, UserId};

use crate::error::ApiError;
use crate::exchange::{Exchange, OrderType, PlaceOrder};

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub exchange: Arc<Exchange>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(rename = "UserID")]
    pub user_id: UserId,
    #[serde(rename = "Type")]
    pub order_type: OrderType,
    #[serde(rename = "Bid")]
    pub bid: bool,
    #[serde(rename = "Size")]
    pub size: f64,
    /// Ignored for market orders.
    #[serde(rename = "Price", default)]
    pub price: f64,
    #[serde(rename = "Market")]
    pub market: String,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    #[serde(rename = "OrderID")]
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(rename = "UserID")]
    pub user_id: UserId,
    #[serde(rename = "ID")]
    pub id: OrderId,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Size")]
    pub size: f64,
    #[serde(rename = "Bid")]
    pub bid: bool,
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

impl From<RestingOrder> for OrderView {
    fn from(order: RestingOrder) -> Self {
        Self {
            user_id: order.user_id,
            id: order.id,
            price: order.price.as_f64(),
            size: order.remaining_size,
            bid: order.side.is_bid(),
            timestamp: order.timestamp_ns,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetOrdersResponse {
    #[serde(rename = "Bids")]
    pub bids: Vec<OrderView>,
    #[serde(rename = "Asks")]
    pub asks: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct OrderBookData {
    #[serde(rename = "TotalBidVolume")]
    pub total_bid_volume: f64,
    #[serde(rename = "TotalAskVolume")]
    pub total_ask_volume: f64,
    #[serde(rename = "Bids")]
    pub bids: Vec<OrderView>,
    #[serde(rename = "Asks")]
    pub asks: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    #[serde(rename = "Price")]
    pub price: f64,
}

pub async fn place_order(
    State(state): State<ApiState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, ApiError> {
    let side = if request.bid { Side::Bid } else { Side::Ask };
    let price = matches!(request.order_type, OrderType::Limit).then_some(request.price);

    let order_id = state
        .exchange
        .place(PlaceOrder {
            market: request.market,
            user_id: request.user_id,
            side,
            order_type: request.order_type,
            size: request.size,
            price,
        })
        .await?;

    Ok(Json(PlaceOrderResponse { order_id }))
}

pub async fn cancel_order(
    State(state): State<ApiState>,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.exchange.cancel(id).await?;
    Ok(Json(serde_json::json!({ "msg": "order deleted" })))
}

pub async fn get_orders(
    State(state): State<ApiState>,
    Path(user_id): Path<UserId>,
) -> Json<GetOrdersResponse> {
    let orders = state.exchange.get_orders(user_id).await;
    Json(GetOrdersResponse {
        bids: orders.bids.into_iter().map(OrderView::from).collect(),
        asks: orders.asks.into_iter().map(OrderView::from).collect(),
    })
}

pub async fn get_book(
    State(state): State<ApiState>,
    Path(market): Path<String>,
) -> Result<Json<OrderBookData>, ApiError> {
    let snapshot = state.exchange.get_book(&market).await?;
    Ok(Json(OrderBookData {
        total_bid_volume: snapshot.total_bid_volume,
        total_ask_volume: snapshot.total_ask_volume,
        bids: snapshot.bids.into_iter().map(OrderView::from).collect(),
        asks: snapshot.asks.into_iter().map(OrderView::from).collect(),
    }))
}

pub async fn get_best_bid(
    State(state): State<ApiState>,
    Path(market): Path<String>,
) -> Result<Json<PriceResponse>, ApiError> {
    let best = state
        .exchange
        .get_best_bid(&market)
        .await?
        .ok_or_else(|| ApiError::NotFound("the bids are empty".to_string()))?;
    Ok(Json(PriceResponse {
        price: best.as_f64(),
    }))
}

pub async fn get_best_ask(
    State(state): State<ApiState>,
    Path(market): Path<String>,
) -> Result<Json<PriceResponse>, ApiError> {
    let best = state
        .exchange
        .get_best_ask(&market)
        .await?
        .ok_or_else(|| ApiError::NotFound("the asks are empty".to_string()))?;
    Ok(Json(PriceResponse {
        price: best.as_f64(),
    }))
}
