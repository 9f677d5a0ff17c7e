//! Order and checkout endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{Path, ValidatedJson};
use super::AppState;
use crate::domain::{Order, PaymentTerms};
use crate::services::{LineRequest, PlaceOrder, VerifiedCheckout};
use crate::Result;

const DEFAULT_PAYMENT_METHOD: &str = "online";

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    #[validate]
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub delivery_address: String,
    #[validate(length(min = 1, message = "payment_method must not be empty"))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    #[validate(length(min = 1))]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub gateway_signature: String,
    pub user_id: String,
    #[serde(default)]
    #[validate]
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct VerifiedOrderResponse {
    pub success: bool,
    pub order: Order,
    pub message: &'static str,
}

pub async fn place_order(
    State(s): State<AppState>,
    Path(uid): Path<String>,
    ValidatedJson(req): ValidatedJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let method = req.payment_method.unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
    let outcome = s
        .orders
        .place_order(PlaceOrder {
            user_id: uid,
            items: req.items,
            delivery_address: req.delivery_address,
            terms: PaymentTerms::OnDelivery { method },
        })
        .await?;
    s.events.publish(outcome.events).await;
    Ok((StatusCode::CREATED, Json(outcome.value)))
}

pub async fn verify_payment(
    State(s): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyPaymentRequest>,
) -> Result<(StatusCode, Json<VerifiedOrderResponse>)> {
    let outcome = s
        .payments
        .verify_and_place_paid_order(VerifiedCheckout {
            external_order_id: req.gateway_order_id,
            external_payment_id: req.gateway_payment_id,
            signature: req.gateway_signature,
            user_id: req.user_id,
            items: req.items,
            delivery_address: req.delivery_address,
            total_amount: req.total_amount,
        })
        .await?;
    s.events.publish(outcome.events).await;
    Ok((
        StatusCode::CREATED,
        Json(VerifiedOrderResponse {
            success: true,
            order: outcome.value,
            message: "Payment verified and order placed successfully",
        }),
    ))
}

pub async fn list_orders(State(s): State<AppState>, Path(uid): Path<String>) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders.list_orders(&uid).await?))
}

pub async fn get_order(State(s): State<AppState>, Path(oid): Path<String>) -> Result<Json<Order>> {
    Ok(Json(s.orders.get_order(&oid).await?))
}
