//! Purchase Aggregate
//!
//! A retailer's purchase from a wholesaler. Written before any stock moves,
//! so it stays as evidence of the purchase even if a transfer step fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, MoneyError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub retailer_id: String,
    pub wholesaler_id: String,
    pub items: Vec<PurchaseLine>,
    pub total_amount: f64,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Completed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown purchase status: {other}")),
        }
    }
}

impl PurchaseLine {
    pub fn snapshot(product: &Product, quantity: u32) -> Result<Self, MoneyError> {
        Ok(Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            total: product.price()?.multiply(quantity)?.to_f64(),
        })
    }
}

impl Purchase {
    pub fn completed(retailer_id: impl Into<String>, wholesaler_id: impl Into<String>, items: Vec<PurchaseLine>) -> Result<Self, MoneyError> {
        let total = items
            .iter()
            .try_fold(Money::ZERO, |acc, l| acc.add(Money::from_f64(l.unit_price)?.multiply(l.quantity)?))?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            retailer_id: retailer_id.into(),
            wholesaler_id: wholesaler_id.into(),
            items,
            total_amount: total.to_f64(),
            status: PurchaseStatus::Completed,
            created_at: Utc::now(),
        })
    }

    pub fn total(&self) -> Result<Money, MoneyError> {
        Money::from_f64(self.total_amount)
    }
}
