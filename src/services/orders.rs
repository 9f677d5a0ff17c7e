//! Order engine
//!
//! `place_order` runs in two passes. The validation pass reads every product
//! and checks stock for all lines before anything is written. The commit
//! pass reads them again, re-checks stock and snapshots name and price from
//! that second read. Only then are the order, the stock decrements and the
//! cart deletion written, as separate store operations with no rollback.

use std::sync::Arc;
use tracing::{error, info, instrument};

use super::stock::{self, LineRequest};
use super::Outcome;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::{Order, OrderLine, PaymentStatus, PaymentTerms};
use crate::store::Store;
use crate::{CommerceError, Result};

#[derive(Clone, Debug)]
pub struct PlaceOrder {
    pub user_id: String,
    pub items: Vec<LineRequest>,
    pub delivery_address: String,
    pub terms: PaymentTerms,
}

#[derive(Clone)]
pub struct OrderEngine {
    store: Arc<dyn Store>,
}

impl OrderEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(user_id = %cmd.user_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Outcome<Order>> {
        if cmd.items.is_empty() {
            return Err(CommerceError::validation("Items missing"));
        }
        if cmd.delivery_address.trim().is_empty() {
            return Err(CommerceError::validation("Delivery address required"));
        }
        if cmd.items.iter().any(|l| l.quantity == 0) {
            return Err(CommerceError::validation("quantity must be at least 1"));
        }

        self.store
            .get_user(&cmd.user_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("user", &cmd.user_id))?;

        let demand = stock::demand(cmd.items.iter().map(|l| (l.product_id.as_str(), l.quantity)));

        // Validation pass
        stock::check_availability(&*self.store, &demand).await?;

        // Commit pass: re-read, re-check, snapshot
        let fresh = stock::check_availability(&*self.store, &demand).await?;
        let lines = cmd
            .items
            .iter()
            .map(|l| -> Result<OrderLine> {
                Ok(OrderLine::snapshot(stock::checked(&fresh, &l.product_id)?, l.quantity)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let order = Order::place(&cmd.user_id, lines, cmd.delivery_address.trim(), cmd.terms)?;
        self.store.insert_order(&order).await?;

        let mut events = Vec::with_capacity(cmd.items.len() + 1);
        for (done, line) in cmd.items.iter().enumerate() {
            match stock::decrement(&*self.store, &line.product_id, line.quantity).await {
                Ok(event) => events.push(event),
                Err(err) => {
                    error!(order_id = %order.id, decremented = done, error = %err, "Stock decrement failed after order insert");
                    return Err(err);
                }
            }
        }

        self.store.delete_cart(&cmd.user_id).await?;

        info!(order_id = %order.id, total = order.total_amount, lines = order.items.len(), "Order placed");
        events.push(DomainEvent::Order(OrderEvent::Placed {
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            total: order.total_amount,
            paid: order.payment_status == PaymentStatus::Paid,
        }));
        Ok(Outcome::new(order, events))
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| CommerceError::not_found("order", order_id))
    }

    pub async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        self.store.list_orders(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cart, Product, ProductFilter, Purchase, Role, User};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn product(id: &str, price: f64, stock: i64) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            category_id: Some("pantry".into()),
            price,
            stock,
            seller_id: "retailer-1".into(),
            description: String::new(),
            image_url: String::new(),
            rating: 0.0,
            original_wh_product_id: None,
        }
    }

    async fn setup() -> (Arc<MemoryStore>, OrderEngine) {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(&User::new("customer-1", "Asha", "asha@example.com", Role::Customer)).await.unwrap();
        store.save_product(&product("oil", 120.0, 10)).await.unwrap();
        store.save_product(&product("salt", 18.5, 2)).await.unwrap();
        let engine = OrderEngine::new(store.clone());
        (store, engine)
    }

    fn cod(items: Vec<LineRequest>) -> PlaceOrder {
        PlaceOrder {
            user_id: "customer-1".into(),
            items,
            delivery_address: "4 Lake Road".into(),
            terms: PaymentTerms::OnDelivery { method: "cod".into() },
        }
    }

    async fn stock_of(store: &MemoryStore, id: &str) -> i64 {
        store.get_product(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_place_order_totals_decrements_and_clears_cart() {
        let (store, engine) = setup().await;
        store
            .replace_cart(&Cart { user_id: "customer-1".into(), items: vec![] })
            .await
            .unwrap();

        let outcome = engine
            .place_order(cod(vec![LineRequest::new("oil", 2), LineRequest::new("salt", 1)]))
            .await
            .unwrap();
        let order = outcome.value;

        assert_eq!(order.total_amount, 258.5);
        assert_eq!(order.items[0].total, 240.0);
        assert_eq!(order.items[1].seller_id, "retailer-1");
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(stock_of(&store, "oil").await, 8);
        assert_eq!(stock_of(&store, "salt").await, 1);
        assert!(store.get_cart("customer-1").await.unwrap().is_none());
        assert_eq!(store.get_order(&order.id).await.unwrap(), Some(order));
        assert_eq!(outcome.events.len(), 3);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let (store, engine) = setup().await;
        let err = engine
            .place_order(cod(vec![LineRequest::new("oil", 1), LineRequest::new("salt", 3)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::InsufficientStock { requested: 3, available: 2, .. }));
        assert_eq!(stock_of(&store, "oil").await, 10);
        assert_eq!(stock_of(&store, "salt").await, 2);
        assert!(store.list_orders("customer-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_lines_checked_against_combined_quantity() {
        let (store, engine) = setup().await;
        let err = engine
            .place_order(cod(vec![LineRequest::new("salt", 2), LineRequest::new("salt", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        assert_eq!(stock_of(&store, "salt").await, 2);
    }

    #[tokio::test]
    async fn test_rejects_bad_input_before_reads() {
        let (_, engine) = setup().await;
        let err = engine.place_order(cod(vec![])).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));

        let mut cmd = cod(vec![LineRequest::new("oil", 1)]);
        cmd.delivery_address = "   ".into();
        assert!(matches!(engine.place_order(cmd).await, Err(CommerceError::Validation(_))));

        let mut cmd = cod(vec![LineRequest::new("oil", 1)]);
        cmd.user_id = "ghost-user".into();
        assert!(matches!(
            engine.place_order(cmd).await,
            Err(CommerceError::NotFound { entity: "user", .. })
        ));

        let err = engine.place_order(cod(vec![LineRequest::new("caviar", 1)])).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: "product", .. }));
    }

    #[tokio::test]
    async fn test_price_is_server_side_at_commit() {
        let (store, engine) = setup().await;
        store.set_price("oil", 99.99).await.unwrap();
        let order = engine.place_order(cod(vec![LineRequest::new("oil", 3)])).await.unwrap().value;
        assert_eq!(order.items[0].price, 99.99);
        assert_eq!(order.total_amount, 299.97);
    }

    // Resubmission is not deduplicated: callers need their own idempotency key.
    #[tokio::test]
    async fn test_resubmission_creates_duplicate_order() {
        let (store, engine) = setup().await;
        let first = engine.place_order(cod(vec![LineRequest::new("oil", 4)])).await.unwrap().value;
        let second = engine.place_order(cod(vec![LineRequest::new("oil", 4)])).await.unwrap().value;
        assert_ne!(first.id, second.id);
        assert_eq!(stock_of(&store, "oil").await, 2);
        assert_eq!(store.list_orders("customer-1").await.unwrap().len(), 2);
    }

    // Concurrent checkouts can both pass validation; stock may end negative.
    #[tokio::test]
    async fn test_concurrent_oversell_is_tolerated() {
        let (store, engine) = setup().await;
        let a = engine.clone();
        let b = engine.clone();
        let (ra, rb) = tokio::join!(
            a.place_order(cod(vec![LineRequest::new("salt", 2)])),
            b.place_order(cod(vec![LineRequest::new("salt", 2)])),
        );
        let placed = [ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count() as i64;
        assert!(placed >= 1);
        assert_eq!(stock_of(&store, "salt").await, 2 - 2 * placed);
    }

    #[tokio::test]
    async fn test_amount_overflow_is_rejected_before_writes() {
        let (store, engine) = setup().await;
        store.save_product(&product("gold", 1e20, 2_000_000_000)).await.unwrap();
        let err = engine
            .place_order(cod(vec![LineRequest::new("gold", 1_000_000_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
        assert_eq!(stock_of(&store, "gold").await, 2_000_000_000);
        assert!(store.list_orders("customer-1").await.unwrap().is_empty());
    }

    /// Fails every `adjust_stock` after the first `allowed` calls.
    struct FailingStock {
        inner: MemoryStore,
        allowed: usize,
        adjustments: AtomicUsize,
    }

    #[async_trait]
    impl Store for FailingStock {
        async fn get_user(&self, id: &str) -> Result<Option<User>> { self.inner.get_user(id).await }
        async fn insert_user(&self, user: &User) -> Result<()> { self.inner.insert_user(user).await }
        async fn get_product(&self, id: &str) -> Result<Option<Product>> { self.inner.get_product(id).await }
        async fn list_products(&self, f: &ProductFilter) -> Result<Vec<Product>> { self.inner.list_products(f).await }
        async fn save_product(&self, p: &Product) -> Result<()> { self.inner.save_product(p).await }
        async fn set_price(&self, id: &str, price: f64) -> Result<()> { self.inner.set_price(id, price).await }
        async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64> {
            if self.adjustments.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(CommerceError::Storage("connection reset".into()));
            }
            self.inner.adjust_stock(id, delta).await
        }
        async fn find_transferred(&self, s: &str, r: &str) -> Result<Option<Product>> { self.inner.find_transferred(s, r).await }
        async fn get_cart(&self, u: &str) -> Result<Option<Cart>> { self.inner.get_cart(u).await }
        async fn replace_cart(&self, c: &Cart) -> Result<()> { self.inner.replace_cart(c).await }
        async fn delete_cart(&self, u: &str) -> Result<bool> { self.inner.delete_cart(u).await }
        async fn insert_order(&self, o: &Order) -> Result<()> { self.inner.insert_order(o).await }
        async fn get_order(&self, id: &str) -> Result<Option<Order>> { self.inner.get_order(id).await }
        async fn list_orders(&self, u: &str) -> Result<Vec<Order>> { self.inner.list_orders(u).await }
        async fn insert_purchase(&self, p: &Purchase) -> Result<()> { self.inner.insert_purchase(p).await }
        async fn list_purchases(&self, r: &str) -> Result<Vec<Purchase>> { self.inner.list_purchases(r).await }
    }

    #[tokio::test]
    async fn test_failed_decrement_leaves_order_and_cart_in_place() {
        let inner = MemoryStore::new();
        inner.insert_user(&User::new("customer-1", "Asha", "asha@example.com", Role::Customer)).await.unwrap();
        inner.save_product(&product("oil", 120.0, 10)).await.unwrap();
        inner.save_product(&product("salt", 18.5, 2)).await.unwrap();
        inner
            .replace_cart(&Cart { user_id: "customer-1".into(), items: vec![] })
            .await
            .unwrap();
        let store = Arc::new(FailingStock { inner, allowed: 1, adjustments: AtomicUsize::new(0) });
        let engine = OrderEngine::new(store.clone());

        let err = engine
            .place_order(cod(vec![LineRequest::new("oil", 2), LineRequest::new("salt", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Storage(_)));

        let orders = store.list_orders("customer-1").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total_amount, 258.5);
        assert_eq!(store.get_product("oil").await.unwrap().unwrap().stock, 8);
        assert_eq!(store.get_product("salt").await.unwrap().unwrap().stock, 2);
        assert!(store.get_cart("customer-1").await.unwrap().is_some());
    }
}
