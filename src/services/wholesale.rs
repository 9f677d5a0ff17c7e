//! Wholesale transfer engine
//!
//! A retailer buys stock from a wholesaler. After the whole purchase is
//! validated, the purchase record is written first and then each line is
//! transferred independently: wholesaler stock goes down, and the retailer's
//! copy of the product (found by provenance, created on first purchase) goes
//! up, its price replaced by the fresh markup. A failure part-way leaves the
//! earlier lines transferred and the purchase record in place.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use super::stock;
use super::Outcome;
use crate::domain::events::{DomainEvent, ProductEvent, PurchaseEvent};
use crate::domain::value_objects::{MarkupPercent, Money};
use crate::domain::{Product, Purchase, PurchaseLine, Role};
use crate::store::Store;
use crate::{CommerceError, Result};

fn default_markup() -> f64 {
    MarkupPercent::DEFAULT
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TransferRequest {
    #[validate(length(min = 1, message = "product_id is required"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default = "default_markup")]
    pub markup_percent: f64,
    /// Unit price the client saw. Informational only.
    #[serde(default)]
    pub price: Option<f64>,
}

impl TransferRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32, markup_percent: f64) -> Self {
        Self { product_id: product_id.into(), quantity, markup_percent, price: None }
    }
}

#[derive(Clone, Debug)]
pub struct WholesalePurchase {
    pub retailer_id: String,
    pub wholesaler_id: String,
    pub items: Vec<TransferRequest>,
    /// Client-quoted total. Logged when it disagrees, never stored.
    pub total_amount: Option<f64>,
}

#[derive(Clone)]
pub struct WholesaleEngine {
    store: Arc<dyn Store>,
}

impl WholesaleEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(retailer_id = %cmd.retailer_id, wholesaler_id = %cmd.wholesaler_id))]
    pub async fn purchase_from_wholesaler(&self, cmd: WholesalePurchase) -> Result<Outcome<Purchase>> {
        if cmd.items.is_empty() {
            return Err(CommerceError::validation("Items missing"));
        }
        if cmd.items.iter().any(|i| i.quantity == 0) {
            return Err(CommerceError::validation("quantity must be at least 1"));
        }
        let markups = cmd
            .items
            .iter()
            .map(|i| MarkupPercent::new(i.markup_percent).map_err(|e| CommerceError::validation(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        self.party(&cmd.retailer_id, Role::Retailer, "retailer").await?;
        self.party(&cmd.wholesaler_id, Role::Wholesaler, "wholesaler").await?;

        // Validation pass
        let demand = stock::demand(cmd.items.iter().map(|i| (i.product_id.as_str(), i.quantity)));
        let products = stock::check_availability(&*self.store, &demand).await?;
        if let Some(foreign) = products.values().find(|p| p.seller_id != cmd.wholesaler_id) {
            return Err(CommerceError::not_found(
                "wholesaler product",
                format!("{} (seller {})", foreign.id, cmd.wholesaler_id),
            ));
        }

        let mut lines = Vec::with_capacity(cmd.items.len());
        let mut retail_prices = Vec::with_capacity(cmd.items.len());
        for (item, markup) in cmd.items.iter().zip(markups) {
            let source = stock::checked(&products, &item.product_id)?;
            let unit = source.price()?;
            retail_prices.push(unit.marked_up(markup)?);
            if item.price.is_some_and(|quoted| Money::from_f64(quoted).map_or(true, |q| !q.approx_eq(unit))) {
                warn!(product_id = %source.id, quoted = ?item.price, price = source.price, "Quoted unit price is stale");
            }
            lines.push(PurchaseLine::snapshot(source, item.quantity)?);
        }
        let purchase = Purchase::completed(&cmd.retailer_id, &cmd.wholesaler_id, lines)?;
        let total = purchase.total()?;
        if let Some(quoted) = cmd.total_amount {
            if Money::from_f64(quoted).map_or(true, |q| !q.approx_eq(total)) {
                warn!(purchase_id = %purchase.id, quoted, total = purchase.total_amount, "Client total differs from server total");
            }
        }

        self.store.insert_purchase(&purchase).await?;

        let mut events = Vec::new();
        for (done, (item, retail_price)) in cmd.items.iter().zip(retail_prices).enumerate() {
            let source = stock::checked(&products, &item.product_id)?;
            match self.transfer(&cmd.retailer_id, source, item.quantity, retail_price).await {
                Ok(mut transferred) => events.append(&mut transferred),
                Err(err) => {
                    error!(
                        purchase_id = %purchase.id,
                        transferred = done,
                        remaining = cmd.items.len() - done,
                        error = %err,
                        "Wholesale transfer failed part-way; earlier lines stay applied"
                    );
                    return Err(err);
                }
            }
        }

        info!(purchase_id = %purchase.id, total = purchase.total_amount, lines = purchase.items.len(), "Wholesale purchase completed");
        events.push(DomainEvent::Purchase(PurchaseEvent::Completed {
            purchase_id: purchase.id.clone(),
            retailer_id: purchase.retailer_id.clone(),
            wholesaler_id: purchase.wholesaler_id.clone(),
            total: purchase.total_amount,
        }));
        Ok(Outcome::new(purchase, events))
    }

    pub async fn list_purchases(&self, retailer_id: &str) -> Result<Vec<Purchase>> {
        self.store.list_purchases(retailer_id).await
    }

    async fn party(&self, id: &str, role: Role, entity: &'static str) -> Result<()> {
        match self.store.get_user(id).await? {
            Some(user) if user.has_role(role) => Ok(()),
            _ => Err(CommerceError::not_found(entity, id)),
        }
    }

    /// Moves one line from the wholesaler's product into the retailer's copy.
    async fn transfer(&self, retailer_id: &str, source: &Product, quantity: u32, retail_price: Money) -> Result<Vec<DomainEvent>> {
        let store = &*self.store;
        let mut events = vec![stock::decrement(store, &source.id, quantity).await?];

        let product_id = match store.find_transferred(&source.id, retailer_id).await? {
            Some(existing) => {
                events.push(stock::increment(store, &existing.id, quantity).await?);
                store.set_price(&existing.id, retail_price.to_f64()).await?;
                events.push(DomainEvent::Product(ProductEvent::PriceChanged {
                    product_id: existing.id.clone(),
                    price: retail_price.to_f64(),
                }));
                existing.id
            }
            None => {
                let copy = Product::transferred_from(source, retailer_id, quantity, retail_price);
                store.save_product(&copy).await?;
                copy.id
            }
        };

        events.push(DomainEvent::Product(ProductEvent::Transferred {
            product_id,
            wholesaler_product_id: source.id.clone(),
            retailer_id: retailer_id.to_string(),
            quantity,
        }));
        Ok(events)
    }
}
