//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;
pub mod purchase;
pub mod user;

pub use cart::{Cart, CartError, CartItem};
pub use order::{Order, OrderLine, OrderStatus, PaymentStatus, PaymentTerms};
pub use product::{NewProduct, Product, ProductFilter, ProductPatch, Provenance};
pub use purchase::{Purchase, PurchaseLine, PurchaseStatus};
pub use user::{Role, User};
