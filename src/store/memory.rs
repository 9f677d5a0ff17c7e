//! In-process store with the same per-document semantics as [`PgStore`].
//!
//! Each collection sits behind its own lock and every method takes it once,
//! so a single call is atomic and nothing spans calls.
//!
//! [`PgStore`]: super::PgStore

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::Store;
use crate::domain::{Cart, Order, Product, ProductFilter, Purchase, User};
use crate::{CommerceError, Result};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    products: RwLock<HashMap<String, Product>>,
    carts: RwLock<HashMap<String, Cart>>,
    orders: RwLock<Vec<Order>>,
    purchases: RwLock<Vec<Purchase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(CommerceError::Storage(format!("duplicate user id: {}", user.id)));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products.values().filter(|p| filter.matches(p)).cloned().collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        found.truncate(filter.limit() as usize);
        Ok(found)
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        self.products.write().await.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn set_price(&self, id: &str, price: f64) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products.get_mut(id).ok_or_else(|| CommerceError::not_found("product", id))?;
        product.price = price;
        Ok(())
    }

    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64> {
        let mut products = self.products.write().await;
        let product = products.get_mut(id).ok_or_else(|| CommerceError::not_found("product", id))?;
        product.stock += delta;
        Ok(product.stock)
    }

    async fn find_transferred(&self, source_id: &str, seller_id: &str) -> Result<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .find(|p| p.seller_id == seller_id && p.original_wh_product_id.as_deref() == Some(source_id))
            .cloned())
    }

    async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(user_id).cloned())
    }

    async fn replace_cart(&self, cart: &Cart) -> Result<()> {
        self.carts.write().await.insert(cart.user_id.clone(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, user_id: &str) -> Result<bool> {
        Ok(self.carts.write().await.remove(user_id).is_some())
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_purchase(&self, purchase: &Purchase) -> Result<()> {
        self.purchases.write().await.push(purchase.clone());
        Ok(())
    }

    async fn list_purchases(&self, retailer_id: &str) -> Result<Vec<Purchase>> {
        Ok(self
            .purchases
            .read()
            .await
            .iter()
            .rev()
            .filter(|p| p.retailer_id == retailer_id)
            .cloned()
            .collect())
    }
}
