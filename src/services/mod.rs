//! Application services over a [`Store`](crate::store::Store).
pub mod cart;
pub mod orders;
pub mod payment;
pub mod stock;
pub mod wholesale;

pub use cart::CartService;
pub use orders::{OrderEngine, PlaceOrder};
pub use payment::{PaymentService, SignatureVerifier, VerifiedCheckout};
pub use stock::LineRequest;
pub use wholesale::{TransferRequest, WholesaleEngine, WholesalePurchase};

use crate::domain::DomainEvent;

/// A service result plus the events it raised.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<DomainEvent>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, events: Vec<DomainEvent>) -> Self {
        Self { value, events }
    }
}
