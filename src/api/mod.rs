//! HTTP surface.

mod cart;
mod catalog;
mod error;
mod extract;
mod orders;
mod purchases;
mod seed;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ErrorBody;

use crate::events::EventPublisher;
use crate::services::{CartService, OrderEngine, PaymentService, SignatureVerifier, WholesaleEngine};
use crate::store::Store;

pub const SERVICE_NAME: &str = "tiermart-commerce";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub carts: CartService,
    pub orders: OrderEngine,
    pub payments: PaymentService,
    pub wholesale: WholesaleEngine,
    pub events: EventPublisher,
    /// Whether `POST /api/seed-data` is served.
    pub demo_seeding: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, payment_secret: Option<String>, events: EventPublisher) -> Self {
        let orders = OrderEngine::new(store.clone());
        Self {
            carts: CartService::new(store.clone()),
            payments: PaymentService::new(SignatureVerifier::new(payment_secret), orders.clone()),
            wholesale: WholesaleEngine::new(store.clone()),
            orders,
            store,
            events,
            demo_seeding: false,
        }
    }

    pub fn with_demo_seeding(mut self, enabled: bool) -> Self {
        self.demo_seeding = enabled;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route("/products/retailer/:rid", get(catalog::products_by_retailer))
        .route("/products/:id", get(catalog::get_product).put(catalog::update_product))
        .route("/cart/:uid", get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart))
        .route("/cart/:uid/:product_id", put(cart::update_cart_item).delete(cart::remove_cart_item))
        .route("/orders/detail/:oid", get(orders::get_order))
        .route("/orders/:uid", get(orders::list_orders).post(orders::place_order))
        .route("/payment/verify", post(orders::verify_payment))
        .route("/purchase/from-wholesaler", post(purchases::purchase_from_wholesaler))
        .route("/purchases/retailer/:rid", get(purchases::list_purchases))
        .route("/seed-data", post(seed::seed_data));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": SERVICE_NAME})) }))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
