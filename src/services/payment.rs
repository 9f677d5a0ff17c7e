//! Payment verification adapter
//!
//! The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under the
//! shared key secret and hands the hex digest back to the client. A checkout
//! is only turned into an order once that signature checks out.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

use super::orders::{OrderEngine, PlaceOrder};
use super::stock::LineRequest;
use super::Outcome;
use crate::domain::value_objects::Money;
use crate::domain::{Order, PaymentTerms};
use crate::{CommerceError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Hex length of an HMAC-SHA256 digest.
const SIGNATURE_HEX_LEN: usize = 64;

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<String>,
}

impl SignatureVerifier {
    /// An empty secret leaves the verifier unconfigured.
    pub fn new(secret: Option<String>) -> Self {
        Self { secret: secret.filter(|s| !s.is_empty()) }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> Result<HmacSha256> {
        let secret = self.secret.as_deref().ok_or(CommerceError::PaymentNotConfigured)?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| CommerceError::PaymentNotConfigured)?;
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        Ok(mac)
    }

    /// Hex digest the gateway would produce.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> Result<String> {
        Ok(hex::encode(self.mac(order_id, payment_id)?.finalize().into_bytes()))
    }

    /// The signature must be exactly the lowercase hex digest [`sign`](Self::sign)
    /// produces; the digest bytes are then compared in constant time.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        let mac = self.mac(order_id, payment_id)?;
        if signature.len() != SIGNATURE_HEX_LEN || !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(CommerceError::PaymentVerification);
        }
        let expected = hex::decode(signature).map_err(|_| CommerceError::PaymentVerification)?;
        mac.verify_slice(&expected).map_err(|_| CommerceError::PaymentVerification)
    }
}

#[derive(Clone, Debug)]
pub struct VerifiedCheckout {
    pub external_order_id: String,
    pub external_payment_id: String,
    pub signature: String,
    pub user_id: String,
    pub items: Vec<LineRequest>,
    pub delivery_address: String,
    /// What the client displayed. Logged, never charged.
    pub total_amount: f64,
}

#[derive(Clone)]
pub struct PaymentService {
    verifier: SignatureVerifier,
    orders: OrderEngine,
}

impl PaymentService {
    pub fn new(verifier: SignatureVerifier, orders: OrderEngine) -> Self {
        Self { verifier, orders }
    }

    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub async fn verify_and_place_paid_order(&self, cmd: VerifiedCheckout) -> Result<Outcome<Order>> {
        if let Err(err) = self.verifier.verify(&cmd.external_order_id, &cmd.external_payment_id, &cmd.signature) {
            warn!(external_order_id = %cmd.external_order_id, error = %err, "Payment signature rejected");
            return Err(err);
        }
        info!(external_payment_id = %cmd.external_payment_id, "Payment verified");

        let outcome = self
            .orders
            .place_order(PlaceOrder {
                user_id: cmd.user_id,
                items: cmd.items,
                delivery_address: cmd.delivery_address,
                terms: PaymentTerms::Verified {
                    external_order_id: cmd.external_order_id,
                    external_payment_id: cmd.external_payment_id,
                },
            })
            .await?;

        if let Ok(charged) = outcome.value.total() {
            if Money::from_f64(cmd.total_amount).map_or(true, |quoted| !quoted.approx_eq(charged)) {
                warn!(
                    order_id = %outcome.value.id,
                    quoted = cmd.total_amount,
                    charged = %charged,
                    "Client total differs from server total"
                );
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentStatus, Product, Role, User};
    use crate::store::{MemoryStore, Store};
    use std::sync::Arc;

    const SECRET: &str = "test_key_secret";

    #[test]
    fn test_sign_and_verify() {
        let v = SignatureVerifier::new(Some(SECRET.into()));
        let sig = v.sign("order_abc", "pay_123").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(v.verify("order_abc", "pay_123", &sig).is_ok());
        assert!(matches!(
            v.verify("order_abc", "pay_124", &sig),
            Err(CommerceError::PaymentVerification)
        ));
        assert!(matches!(
            v.verify("order_abc", "pay_123", &format!("{sig}x")),
            Err(CommerceError::PaymentVerification)
        ));
    }

    #[test]
    fn test_signature_must_match_exact_hex() {
        let v = SignatureVerifier::new(Some(SECRET.into()));
        let sig = v.sign("order_abc", "pay_123").unwrap();
        for variant in [sig.to_uppercase(), format!(" {sig}"), format!("{sig}\n")] {
            assert!(matches!(
                v.verify("order_abc", "pay_123", &variant),
                Err(CommerceError::PaymentVerification)
            ));
        }
    }

    #[test]
    fn test_unconfigured_verifier() {
        let v = SignatureVerifier::new(Some(String::new()));
        assert!(!v.is_configured());
        assert!(matches!(v.verify("a", "b", "00"), Err(CommerceError::PaymentNotConfigured)));
    }

    async fn setup() -> (Arc<MemoryStore>, PaymentService) {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(&User::new("customer-1", "Ravi", "ravi@example.com", Role::Customer)).await.unwrap();
        store
            .save_product(&Product {
                id: "ghee".into(),
                name: "Ghee 1L".into(),
                category_id: None,
                price: 550.0,
                stock: 5,
                seller_id: "retailer-1".into(),
                description: String::new(),
                image_url: String::new(),
                rating: 0.0,
                original_wh_product_id: None,
            })
            .await
            .unwrap();
        let service = PaymentService::new(
            SignatureVerifier::new(Some(SECRET.into())),
            OrderEngine::new(store.clone()),
        );
        (store, service)
    }

    fn checkout(signature: String) -> VerifiedCheckout {
        VerifiedCheckout {
            external_order_id: "order_abc".into(),
            external_payment_id: "pay_123".into(),
            signature,
            user_id: "customer-1".into(),
            items: vec![LineRequest::new("ghee", 2)],
            delivery_address: "9 Temple Street".into(),
            total_amount: 1.0,
        }
    }

    #[tokio::test]
    async fn test_tampered_signature_has_no_side_effects() {
        let (store, service) = setup().await;
        let good = service.verifier().sign("order_abc", "pay_123").unwrap();

        let err = service.verify_and_place_paid_order(checkout(format!("{good}x"))).await.unwrap_err();
        assert!(matches!(err, CommerceError::PaymentVerification));
        assert_eq!(store.get_product("ghee").await.unwrap().unwrap().stock, 5);
        assert!(store.list_orders("customer-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_valid_signature_places_paid_order_at_server_price() {
        let (store, service) = setup().await;
        let good = service.verifier().sign("order_abc", "pay_123").unwrap();

        let order = service.verify_and_place_paid_order(checkout(good)).await.unwrap().value;
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total_amount, 1100.0);
        assert_eq!(order.external_order_id.as_deref(), Some("order_abc"));
        assert_eq!(order.external_payment_id.as_deref(), Some("pay_123"));
        assert_eq!(store.get_product("ghee").await.unwrap().unwrap().stock, 3);
    }
}
