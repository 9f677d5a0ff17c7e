//! Tiermart Commerce
//!
//! Order, cart and wholesale-transfer core for a marketplace where customers
//! buy from retailers and retailers restock from wholesalers.
//!
//! ## Features
//! - Per-user carts
//! - Order placement with two-pass stock validation
//! - Payment-signature verified checkout
//! - Wholesale stock transfer with markup pricing
//! - Postgres and in-memory document stores

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod services;
pub mod store;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    #[error("Invalid payment signature")]
    PaymentVerification,

    #[error("Payment gateway not configured")]
    PaymentNotConfigured,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CommerceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Stable snake_case name of the error kind, carried in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::PaymentVerification => "payment_verification",
            Self::PaymentNotConfigured | Self::Storage(_) => "unexpected",
        }
    }
}

impl From<domain::value_objects::MoneyError> for CommerceError {
    fn from(err: domain::value_objects::MoneyError) -> Self {
        CommerceError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for CommerceError {
    fn from(err: sqlx::Error) -> Self {
        CommerceError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CommerceError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CommerceError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;
