//! Postgres-backed document store.
//!
//! Line items of carts, orders and purchases are kept as JSONB so each
//! record round-trips as one document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use super::Store;
use crate::domain::{Cart, CartItem, Order, OrderLine, Product, ProductFilter, Purchase, PurchaseLine, User};
use crate::{CommerceError, Result};

const PRODUCT_COLUMNS: &str = "id, name, category_id, price, stock, seller_id, description, image_url, rating, original_wh_product_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and applies pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct UserRow { id: String, name: String, email: String, role: String }

impl TryFrom<UserRow> for User {
    type Error = CommerceError;
    fn try_from(r: UserRow) -> Result<Self> {
        let role = r.role.parse().map_err(CommerceError::Storage)?;
        Ok(User { id: r.id, name: r.name, email: r.email, role })
    }
}

#[derive(sqlx::FromRow)]
struct CartRow { user_id: String, items: Json<Vec<CartItem>> }

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String, user_id: String, items: Json<Vec<OrderLine>>, total_amount: f64,
    delivery_address: String, payment_method: String, payment_status: String, order_status: String,
    external_order_id: Option<String>, external_payment_id: Option<String>, created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = CommerceError;
    fn try_from(r: OrderRow) -> Result<Self> {
        Ok(Order {
            id: r.id, user_id: r.user_id, items: r.items.0, total_amount: r.total_amount,
            delivery_address: r.delivery_address, payment_method: r.payment_method,
            payment_status: r.payment_status.parse().map_err(CommerceError::Storage)?,
            order_status: r.order_status.parse().map_err(CommerceError::Storage)?,
            external_order_id: r.external_order_id, external_payment_id: r.external_payment_id,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: String, retailer_id: String, wholesaler_id: String, items: Json<Vec<PurchaseLine>>,
    total_amount: f64, status: String, created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = CommerceError;
    fn try_from(r: PurchaseRow) -> Result<Self> {
        Ok(Purchase {
            id: r.id, retailer_id: r.retailer_id, wholesaler_id: r.wholesaler_id, items: r.items.0,
            total_amount: r.total_amount, status: r.status.parse().map_err(CommerceError::Storage)?,
            created_at: r.created_at,
        })
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl Store for PgStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
            .bind(&user.id).bind(&user.name).bind(&user.email).bind(user.role.as_str())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        if let Some(seller) = &filter.seller_id {
            qb.push(" AND seller_id = ").push_bind(seller.clone());
        }
        if let Some(category) = filter.category() {
            qb.push(" AND category_id = ").push_bind(category.to_string());
        }
        if let Some(term) = filter.search_term() {
            let pattern = like_pattern(term);
            qb.push(" AND (name ILIKE ").push_bind(pattern.clone())
                .push(" OR description ILIKE ").push_bind(pattern).push(")");
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }
        if filter.only_available() {
            qb.push(" AND stock > 0");
        }
        qb.push(" ORDER BY name, id LIMIT ").push_bind(filter.limit());
        Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
    }

    async fn save_product(&self, p: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, category_id, price, stock, seller_id, description, image_url, rating, original_wh_product_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, category_id = EXCLUDED.category_id, price = EXCLUDED.price, \
             stock = EXCLUDED.stock, seller_id = EXCLUDED.seller_id, description = EXCLUDED.description, \
             image_url = EXCLUDED.image_url, rating = EXCLUDED.rating, original_wh_product_id = EXCLUDED.original_wh_product_id",
        )
        .bind(&p.id).bind(&p.name).bind(&p.category_id).bind(p.price).bind(p.stock).bind(&p.seller_id)
        .bind(&p.description).bind(&p.image_url).bind(p.rating).bind(&p.original_wh_product_id)
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn set_price(&self, id: &str, price: f64) -> Result<()> {
        let res = sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
            .bind(id).bind(price).execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Err(CommerceError::not_found("product", id));
        }
        Ok(())
    }

    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64> {
        let stock: Option<(i64,)> = sqlx::query_as("UPDATE products SET stock = stock + $2 WHERE id = $1 RETURNING stock")
            .bind(id).bind(delta).fetch_optional(&self.pool).await?;
        stock.map(|(s,)| s).ok_or_else(|| CommerceError::not_found("product", id))
    }

    async fn find_transferred(&self, source_id: &str, seller_id: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE original_wh_product_id = $1 AND seller_id = $2 LIMIT 1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(source_id).bind(seller_id).fetch_optional(&self.pool).await?)
    }

    async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>("SELECT user_id, items FROM carts WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| Cart { user_id: r.user_id, items: r.items.0 }))
    }

    async fn replace_cart(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            "INSERT INTO carts (user_id, items, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()",
        )
        .bind(&cart.user_id).bind(Json(&cart.items)).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_cart(&self, user_id: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_order(&self, o: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, items, total_amount, delivery_address, payment_method, payment_status, \
             order_status, external_order_id, external_payment_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&o.id).bind(&o.user_id).bind(Json(&o.items)).bind(o.total_amount).bind(&o.delivery_address)
        .bind(&o.payment_method).bind(o.payment_status.as_str()).bind(o.order_status.as_str())
        .bind(&o.external_order_id).bind(&o.external_payment_id).bind(o.created_at)
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Order::try_from).transpose()
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id).fetch_all(&self.pool).await?.into_iter().map(Order::try_from).collect()
    }

    async fn insert_purchase(&self, p: &Purchase) -> Result<()> {
        sqlx::query(
            "INSERT INTO purchases (id, retailer_id, wholesaler_id, items, total_amount, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&p.id).bind(&p.retailer_id).bind(&p.wholesaler_id).bind(Json(&p.items))
        .bind(p.total_amount).bind(p.status.as_str()).bind(p.created_at)
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn list_purchases(&self, retailer_id: &str) -> Result<Vec<Purchase>> {
        sqlx::query_as::<_, PurchaseRow>("SELECT * FROM purchases WHERE retailer_id = $1 ORDER BY created_at DESC")
            .bind(retailer_id).fetch_all(&self.pool).await?.into_iter().map(Purchase::try_from).collect()
    }
}
