//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, MoneyError};

/// Immutable once inserted. Lines snapshot product name and price at the
/// moment the order was committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub total_amount: f64,
    pub delivery_address: String,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
    pub total: f64,
    pub seller_id: String,
}

impl OrderLine {
    pub fn snapshot(product: &Product, quantity: u32) -> Result<Self, MoneyError> {
        Ok(Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            price: product.price,
            total: product.price()?.multiply(quantity)?.to_f64(),
            seller_id: product.seller_id.clone(),
        })
    }

    pub fn line_total(&self) -> Result<Money, MoneyError> {
        Money::from_f64(self.price)?.multiply(self.quantity)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Placed }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid }

/// How the order is going to be paid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentTerms {
    /// Settled later (cash on delivery, card on delivery, ...).
    OnDelivery { method: String },
    /// Already captured by the gateway; ids are the gateway's.
    Verified { external_order_id: String, external_payment_id: String },
}

impl PaymentTerms {
    pub const GATEWAY_METHOD: &'static str = "gateway";
}

impl Order {
    pub fn place(user_id: impl Into<String>, items: Vec<OrderLine>, delivery_address: impl Into<String>, terms: PaymentTerms) -> Result<Self, MoneyError> {
        let total = items
            .iter()
            .try_fold(Money::ZERO, |acc, line| acc.add(line.line_total()?))?;
        let (payment_method, payment_status, external_order_id, external_payment_id) = match terms {
            PaymentTerms::OnDelivery { method } => (method, PaymentStatus::Pending, None, None),
            PaymentTerms::Verified { external_order_id, external_payment_id } => (
                PaymentTerms::GATEWAY_METHOD.to_string(),
                PaymentStatus::Paid,
                Some(external_order_id),
                Some(external_payment_id),
            ),
        };
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items,
            total_amount: total.to_f64(),
            delivery_address: delivery_address.into(),
            payment_method,
            payment_status,
            order_status: OrderStatus::Placed,
            external_order_id,
            external_payment_id,
            created_at: Utc::now(),
        })
    }

    pub fn items(&self) -> &[OrderLine] { &self.items }
    pub fn total(&self) -> Result<Money, MoneyError> { Money::from_f64(self.total_amount) }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Placed => "placed" }
    }
}

impl FromStr for OrderStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s { "placed" => Ok(Self::Placed), other => Err(format!("unknown order status: {other}")) }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid" }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}
