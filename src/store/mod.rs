//! Document store seam
//!
//! Engines talk to storage only through [`Store`]. Every method is one
//! independent store operation; nothing here spans documents, so callers
//! must not assume atomicity across calls.

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::{seed_demo_data, SeedSummary};

use async_trait::async_trait;

use crate::domain::{Cart, Order, Product, ProductFilter, Purchase, User};
use crate::Result;

#[async_trait]
pub trait Store: Send + Sync {
    // Identity
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    async fn insert_user(&self, user: &User) -> Result<()>;

    // Catalog
    async fn get_product(&self, id: &str) -> Result<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
    /// Upsert by id.
    async fn save_product(&self, product: &Product) -> Result<()>;
    /// Overwrites the price. Fails with `NotFound` for an unknown id.
    async fn set_price(&self, id: &str, price: f64) -> Result<()>;
    /// Atomic `stock += delta`; returns the stock after the update. The
    /// result may be negative.
    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64>;
    /// Retailer product previously created from `source_id` for `seller_id`.
    async fn find_transferred(&self, source_id: &str, seller_id: &str) -> Result<Option<Product>>;

    // Carts
    async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>>;
    async fn replace_cart(&self, cart: &Cart) -> Result<()>;
    /// Returns whether a cart existed.
    async fn delete_cart(&self, user_id: &str) -> Result<bool>;

    // Orders
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn get_order(&self, id: &str) -> Result<Option<Order>>;
    /// Newest first.
    async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>>;

    // Purchases
    async fn insert_purchase(&self, purchase: &Purchase) -> Result<()>;
    /// Newest first.
    async fn list_purchases(&self, retailer_id: &str) -> Result<Vec<Purchase>>;
}
