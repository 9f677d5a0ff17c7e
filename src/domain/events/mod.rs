//! Domain events
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    Purchase(PurchaseEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    StockAdjusted { product_id: String, delta: i64, stock: i64 },
    PriceChanged { product_id: String, price: f64 },
    Transferred { product_id: String, wholesaler_product_id: String, retailer_id: String, quantity: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, user_id: String, total: f64, paid: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseEvent {
    Completed { purchase_id: String, retailer_id: String, wholesaler_id: String, total: f64 },
}

impl DomainEvent {
    /// Bus subject, `commerce.<aggregate>.<event>`.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::StockAdjusted { .. }) => "commerce.product.stock_adjusted",
            Self::Product(ProductEvent::PriceChanged { .. }) => "commerce.product.price_changed",
            Self::Product(ProductEvent::Transferred { .. }) => "commerce.product.transferred",
            Self::Order(OrderEvent::Placed { .. }) => "commerce.order.placed",
            Self::Purchase(PurchaseEvent::Completed { .. }) => "commerce.purchase.completed",
        }
    }
}
