//! Cart endpoints

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{Path, Query, ValidatedJson};
use super::AppState;
use crate::domain::Cart;
use crate::Result;

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AddToCartRequest {
    #[validate(length(min = 1, message = "product_id required"))]
    pub product_id: String,
    #[serde(default = "one")]
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub async fn get_cart(State(s): State<AppState>, Path(uid): Path<String>) -> Result<Json<Cart>> {
    Ok(Json(s.carts.get(&uid).await?))
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    Path(uid): Path<String>,
    ValidatedJson(req): ValidatedJson<AddToCartRequest>,
) -> Result<Json<Cart>> {
    Ok(Json(s.carts.add(&uid, &req.product_id, req.quantity).await?))
}

pub async fn update_cart_item(
    State(s): State<AppState>,
    Path((uid, product_id)): Path<(String, String)>,
    Query(q): Query<QuantityQuery>,
) -> Result<Json<Cart>> {
    Ok(Json(s.carts.update_item(&uid, &product_id, q.quantity).await?))
}

pub async fn remove_cart_item(
    State(s): State<AppState>,
    Path((uid, product_id)): Path<(String, String)>,
) -> Result<Json<Cart>> {
    Ok(Json(s.carts.remove_item(&uid, &product_id).await?))
}

pub async fn clear_cart(State(s): State<AppState>, Path(uid): Path<String>) -> Result<Json<Message>> {
    s.carts.clear(&uid).await?;
    Ok(Json(Message { message: "Cart cleared" }))
}
