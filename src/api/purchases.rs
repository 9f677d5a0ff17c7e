//! Wholesale purchase endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::extract::{Path, ValidatedJson};
use super::AppState;
use crate::domain::Purchase;
use crate::services::{TransferRequest, WholesalePurchase};
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct WholesalePurchaseRequest {
    #[validate(length(min = 1, message = "retailer_id is required"))]
    pub retailer_id: String,
    #[validate(length(min = 1, message = "wholesaler_id is required"))]
    pub wholesaler_id: String,
    #[validate]
    pub items: Vec<TransferRequest>,
    pub total_amount: Option<f64>,
}

pub async fn purchase_from_wholesaler(
    State(s): State<AppState>,
    ValidatedJson(req): ValidatedJson<WholesalePurchaseRequest>,
) -> Result<(StatusCode, Json<Purchase>)> {
    let outcome = s
        .wholesale
        .purchase_from_wholesaler(WholesalePurchase {
            retailer_id: req.retailer_id,
            wholesaler_id: req.wholesaler_id,
            items: req.items,
            total_amount: req.total_amount,
        })
        .await?;
    s.events.publish(outcome.events).await;
    Ok((StatusCode::CREATED, Json(outcome.value)))
}

pub async fn list_purchases(State(s): State<AppState>, Path(rid): Path<String>) -> Result<Json<Vec<Purchase>>> {
    Ok(Json(s.wholesale.list_purchases(&rid).await?))
}
