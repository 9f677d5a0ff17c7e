//! Demo data for local development.
//!
//! Seeding is repeatable: users that already exist are left alone, demo
//! products are written back to their initial listing.

use serde::Serialize;
use tracing::info;

use super::Store;
use crate::domain::{Product, Role, User};
use crate::Result;

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub users_created: usize,
    pub products: usize,
}

fn demo_users() -> Vec<User> {
    vec![
        User::new("wholesaler-1", "Sharma Wholesale", "wholesale@tiermart.dev", Role::Wholesaler),
        User::new("retailer-1", "Corner Shop", "shop@tiermart.dev", Role::Retailer),
        User::new("customer-1", "Demo Customer", "customer@tiermart.dev", Role::Customer),
    ]
}

fn listing(id: &str, name: &str, category: &str, price: f64, stock: i64, seller: &str, description: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category_id: Some(category.to_string()),
        price,
        stock,
        seller_id: seller.to_string(),
        description: description.to_string(),
        image_url: String::new(),
        rating: 0.0,
        original_wh_product_id: None,
    }
}

fn demo_products() -> Vec<Product> {
    vec![
        listing("wh-apple", "Apples (crate)", "fruits", 70.0, 500, "wholesaler-1", "Red apples by the crate"),
        listing("wh-milk", "Milk (case)", "dairy", 40.0, 300, "wholesaler-1", "Toned milk, 12 x 1L"),
        listing("wh-bread", "Bread (tray)", "bakery", 35.0, 200, "wholesaler-1", "Sandwich loaves"),
        listing("rt-bread", "Premium Bread", "bakery", 50.0, 20, "retailer-1", "Baked this morning"),
    ]
}

pub async fn seed_demo_data(store: &dyn Store) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();
    for user in demo_users() {
        if store.get_user(&user.id).await?.is_none() {
            store.insert_user(&user).await?;
            summary.users_created += 1;
        }
    }
    for product in demo_products() {
        store.save_product(&product).await?;
        summary.products += 1;
    }
    info!(users_created = summary.users_created, products = summary.products, "Demo data seeded");
    Ok(summary)
}
