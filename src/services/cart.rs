//! Cart service
//!
//! Every write reads the whole cart, edits it and replaces it. Two
//! concurrent writers for one user are last-writer-wins.

use std::sync::Arc;
use tracing::debug;

use crate::domain::value_objects::UserId;
use crate::domain::Cart;
use crate::store::Store;
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
}

fn parse_user(user_id: &str) -> Result<UserId> {
    UserId::parse(user_id).map_err(|e| CommerceError::validation(e.to_string()))
}

impl CartService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The stored cart, or an empty one.
    pub async fn get(&self, user_id: &str) -> Result<Cart> {
        let uid = parse_user(user_id)?;
        Ok(self
            .store
            .get_cart(uid.as_str())
            .await?
            .unwrap_or_else(|| Cart::empty(uid.as_str())))
    }

    pub async fn add(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<Cart> {
        let uid = parse_user(user_id)?;
        if quantity == 0 {
            return Err(CommerceError::validation("quantity must be at least 1"));
        }
        if self.store.get_product(product_id).await?.is_none() {
            return Err(CommerceError::not_found("product", product_id));
        }
        let mut cart = self
            .store
            .get_cart(uid.as_str())
            .await?
            .unwrap_or_else(|| Cart::empty(uid.as_str()));
        cart.add_item(product_id, quantity);
        self.store.replace_cart(&cart).await?;
        debug!(user_id = %uid, product_id, quantity, "Cart item added");
        Ok(cart)
    }

    /// Sets a line's quantity; zero drops the line.
    pub async fn update_item(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<Cart> {
        let uid = parse_user(user_id)?;
        let mut cart = self.existing(&uid).await?;
        cart.update_quantity(product_id, quantity)
            .map_err(|_| CommerceError::not_found("cart item", product_id))?;
        self.store.replace_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> Result<Cart> {
        let uid = parse_user(user_id)?;
        let mut cart = self.existing(&uid).await?;
        if cart.remove_item(product_id) {
            self.store.replace_cart(&cart).await?;
        }
        Ok(cart)
    }

    pub async fn clear(&self, user_id: &str) -> Result<()> {
        let uid = parse_user(user_id)?;
        self.store.delete_cart(uid.as_str()).await?;
        Ok(())
    }

    async fn existing(&self, uid: &UserId) -> Result<Cart> {
        self.store
            .get_cart(uid.as_str())
            .await?
            .ok_or_else(|| CommerceError::not_found("cart", uid.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;
    use crate::store::MemoryStore;

    async fn service() -> CartService {
        let store = Arc::new(MemoryStore::new());
        store
            .save_product(&Product {
                id: "tea-01".into(),
                name: "Assam Tea".into(),
                category_id: None,
                price: 4.5,
                stock: 10,
                seller_id: "retailer-1".into(),
                description: String::new(),
                image_url: String::new(),
                rating: 0.0,
                original_wh_product_id: None,
            })
            .await
            .unwrap();
        CartService::new(store)
    }

    #[tokio::test]
    async fn test_missing_cart_reads_as_empty() {
        let carts = service().await;
        let cart = carts.get("customer-1").await.unwrap();
        assert_eq!(cart.user_id, "customer-1");
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_add_merges_and_validates_product() {
        let carts = service().await;
        carts.add("customer-1", "tea-01", 2).await.unwrap();
        let cart = carts.add("customer-1", "tea-01", 3).await.unwrap();
        assert_eq!(cart.quantity_of("tea-01"), Some(5));

        let err = carts.add("customer-1", "coffee", 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: "product", .. }));
        let err = carts.add("customer-1", "tea-01", 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_requires_cart_and_line() {
        let carts = service().await;
        let err = carts.update_item("customer-1", "tea-01", 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: "cart", .. }));

        carts.add("customer-1", "tea-01", 1).await.unwrap();
        let err = carts.update_item("customer-1", "other", 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: "cart item", .. }));

        let cart = carts.update_item("customer-1", "tea-01", 7).await.unwrap();
        assert_eq!(cart.quantity_of("tea-01"), Some(7));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let carts = service().await;
        carts.add("customer-1", "tea-01", 1).await.unwrap();
        let cart = carts.remove_item("customer-1", "tea-01").await.unwrap();
        assert!(cart.is_empty());

        carts.add("customer-1", "tea-01", 1).await.unwrap();
        carts.clear("customer-1").await.unwrap();
        assert!(carts.get("customer-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_user_id_rejected() {
        let carts = service().await;
        assert!(matches!(carts.get("ab").await, Err(CommerceError::Validation(_))));
    }
}
