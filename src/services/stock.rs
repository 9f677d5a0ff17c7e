//! Stock discipline shared by the order and wholesale engines.
//!
//! Both engines run the same check-then-act sequence: a validation pass over
//! every requested line, then unconditional per-document stock deltas. The
//! deltas are atomic at the store, but nothing holds stock between the check
//! and the write, so two concurrent checkouts can both pass and oversell.
//! A decrement that leaves stock below zero is logged, never rejected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use validator::Validate;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::Product;
use crate::store::Store;
use crate::{CommerceError, Result};

/// A requested product and quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LineRequest {
    #[validate(length(min = 1, message = "product_id is required"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

/// Total quantity per product, in first-seen order. Repeated lines for one
/// product are checked against its stock together.
pub fn demand<'a>(lines: impl IntoIterator<Item = (&'a str, u32)>) -> Vec<(&'a str, i64)> {
    let mut totals: Vec<(&'a str, i64)> = Vec::new();
    for (product_id, quantity) in lines {
        match totals.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, total)) => *total += i64::from(quantity),
            None => totals.push((product_id, i64::from(quantity))),
        }
    }
    totals
}

/// Reads every product in `demand` and checks it covers the requested
/// quantity. Nothing is written; the first failure aborts.
pub async fn check_availability(store: &dyn Store, demand: &[(&str, i64)]) -> Result<HashMap<String, Product>> {
    let mut products = HashMap::with_capacity(demand.len());
    for (product_id, requested) in demand {
        let product = store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("product", *product_id))?;
        product.ensure_available(*requested)?;
        products.insert(product.id.clone(), product);
    }
    Ok(products)
}

/// Looks a product up in the result of [`check_availability`].
pub fn checked<'m>(products: &'m HashMap<String, Product>, product_id: &str) -> Result<&'m Product> {
    products
        .get(product_id)
        .ok_or_else(|| CommerceError::not_found("product", product_id))
}

pub async fn decrement(store: &dyn Store, product_id: &str, quantity: u32) -> Result<DomainEvent> {
    let delta = -i64::from(quantity);
    let stock = store.adjust_stock(product_id, delta).await?;
    if stock < 0 {
        warn!(product_id, stock, "Stock below zero after decrement; oversold by a concurrent request");
    }
    Ok(stock_adjusted(product_id, delta, stock))
}

pub async fn increment(store: &dyn Store, product_id: &str, quantity: u32) -> Result<DomainEvent> {
    let delta = i64::from(quantity);
    let stock = store.adjust_stock(product_id, delta).await?;
    Ok(stock_adjusted(product_id, delta, stock))
}

fn stock_adjusted(product_id: &str, delta: i64, stock: i64) -> DomainEvent {
    DomainEvent::Product(ProductEvent::StockAdjusted { product_id: product_id.to_string(), delta, stock })
}
