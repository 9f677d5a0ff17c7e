//! Product Aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{Money, MoneyError, Numeric};
use crate::CommerceError;

/// Catalog document. `stock` is signed: concurrent decrements may push it
/// below zero and reads report it as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub seller_id: String,
    pub description: String,
    pub image_url: String,
    pub rating: f64,
    pub original_wh_product_id: Option<String>,
}

/// Where a catalog entry came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance<'a> {
    /// Listed directly by its seller.
    Listed,
    /// Stocked through a wholesale transfer.
    Transferred { wholesaler_product_id: &'a str },
}

impl Product {
    /// Retailer-owned copy of a wholesaler product, created on first transfer.
    pub fn transferred_from(source: &Product, retailer_id: &str, quantity: u32, price: Money) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: source.name.clone(),
            category_id: source.category_id.clone(),
            price: price.to_f64(),
            stock: i64::from(quantity),
            seller_id: retailer_id.to_string(),
            description: source.description.clone(),
            image_url: source.image_url.clone(),
            rating: 0.0,
            original_wh_product_id: Some(source.id.clone()),
        }
    }

    pub fn provenance(&self) -> Provenance<'_> {
        match self.original_wh_product_id.as_deref() {
            Some(source) => Provenance::Transferred { wholesaler_product_id: source },
            None => Provenance::Listed,
        }
    }

    pub fn price(&self) -> Result<Money, MoneyError> {
        Money::from_f64(self.price)
    }

    /// Sellable units; a negative stored stock counts as none.
    pub fn available(&self) -> i64 {
        self.stock.max(0)
    }

    pub fn ensure_available(&self, requested: i64) -> Result<(), CommerceError> {
        if self.available() < requested {
            return Err(CommerceError::InsufficientStock {
                product: self.name.clone(),
                requested,
                available: self.available(),
            });
        }
        Ok(())
    }
}

/// Catalog write request. Price and stock may arrive as numbers or numeric
/// strings.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub id: Option<String>,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub category_id: Option<String>,
    pub price: Numeric,
    #[serde(default)]
    pub stock: Numeric,
    #[validate(length(min = 1, message = "seller_id is required"))]
    pub seller_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub rating: Option<f64>,
}

fn price_of(value: &Numeric) -> Result<f64, CommerceError> {
    let price = value.to_f64("price").map_err(|e| CommerceError::validation(e.to_string()))?;
    if price < 0.0 {
        return Err(CommerceError::validation("price must be non-negative"));
    }
    Ok(Money::from_f64(price)?.to_f64())
}

fn stock_of(value: &Numeric) -> Result<i64, CommerceError> {
    let stock = value.to_i64("stock").map_err(|e| CommerceError::validation(e.to_string()))?;
    if stock < 0 {
        return Err(CommerceError::validation("stock must be non-negative"));
    }
    Ok(stock)
}

impl NewProduct {
    /// Builds the document to store. When a product with the same id already
    /// exists its transfer provenance is carried over, and so is its rating
    /// unless the request sets one.
    pub fn into_product(self, existing: Option<&Product>) -> Result<Product, CommerceError> {
        let price = price_of(&self.price)?;
        let stock = stock_of(&self.stock)?;
        Ok(Product {
            id: self
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name.trim().to_string(),
            category_id: self.category_id,
            price,
            stock,
            seller_id: self.seller_id,
            description: self.description,
            image_url: self.image_url,
            rating: self.rating.or(existing.map(|p| p.rating)).unwrap_or(0.0),
            original_wh_product_id: existing.and_then(|p| p.original_wh_product_id.clone()),
        })
    }
}

/// Partial catalog update. Seller and provenance are not editable.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<Numeric>,
    pub stock: Option<Numeric>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
}

impl ProductPatch {
    /// Checks every field before touching `product`.
    pub fn apply(self, product: &mut Product) -> Result<(), CommerceError> {
        let price = self.price.as_ref().map(price_of).transpose()?;
        let stock = self.stock.as_ref().map(stock_of).transpose()?;
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(category_id) = self.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(price) = price {
            product.price = price;
        }
        if let Some(stock) = stock {
            product.stock = stock;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
        Ok(())
    }
}

/// Catalog listing filter
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub seller_id: Option<String>,
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub available_only: Option<bool>,
    pub limit: Option<i64>,
}

impl ProductFilter {
    pub const DEFAULT_LIMIT: i64 = 1000;

    pub fn for_seller(seller_id: impl Into<String>) -> Self {
        Self {
            seller_id: Some(seller_id.into()),
            available_only: Some(false),
            ..Self::default()
        }
    }

    /// `"all"` and empty strings mean no category filter.
    pub fn category(&self) -> Option<&str> {
        self.category_id
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn only_available(&self) -> bool {
        self.available_only.unwrap_or(true)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::DEFAULT_LIMIT)
    }

    pub fn matches(&self, p: &Product) -> bool {
        if let Some(seller) = &self.seller_id {
            if &p.seller_id != seller {
                return false;
            }
        }
        if let Some(category) = self.category() {
            if p.category_id.as_deref() != Some(category) {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            if !p.name.to_lowercase().contains(&term) && !p.description.to_lowercase().contains(&term) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| p.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| p.price > max) {
            return false;
        }
        !(self.only_available() && p.stock <= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::MarkupPercent;

    fn wholesale_rice() -> Product {
        Product {
            id: "wh-rice".into(),
            name: "Basmati Rice 25kg".into(),
            category_id: Some("grains".into()),
            price: 70.0,
            stock: 500,
            seller_id: "wholesaler-1".into(),
            description: "Aged basmati".into(),
            image_url: "https://img/rice.png".into(),
            rating: 4.5,
            original_wh_product_id: None,
        }
    }

    #[test]
    fn test_transferred_copy_keeps_listing_and_links_source() {
        let source = wholesale_rice();
        let price = source.price().unwrap().marked_up(MarkupPercent::default()).unwrap();
        let copy = Product::transferred_from(&source, "retailer-1", 40, price);
        assert_eq!(copy.seller_id, "retailer-1");
        assert_eq!(copy.stock, 40);
        assert_eq!(copy.price, 84.0);
        assert_eq!(copy.rating, 0.0);
        assert_eq!(copy.name, source.name);
        assert_eq!(copy.category_id, source.category_id);
        assert_eq!(
            copy.provenance(),
            Provenance::Transferred { wholesaler_product_id: "wh-rice" }
        );
        assert_eq!(source.provenance(), Provenance::Listed);
    }

    #[test]
    fn test_negative_stock_counts_as_zero() {
        let mut p = wholesale_rice();
        p.stock = -3;
        assert_eq!(p.available(), 0);
        assert!(matches!(
            p.ensure_available(1),
            Err(CommerceError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn test_new_product_coerces_numeric_strings() {
        let body = r#"{"name":"Rice","price":"70.0","stock":"500","seller_id":"wholesaler-1"}"#;
        let req: NewProduct = serde_json::from_str(body).unwrap();
        let p = req.into_product(None).unwrap();
        assert_eq!(p.price, 70.0);
        assert_eq!(p.stock, 500);
        assert_eq!(p.rating, 0.0);
        assert!(!p.id.is_empty());
    }

    #[test]
    fn test_new_product_rejects_unknown_fields_and_negatives() {
        let body = r#"{"name":"Rice","price":1,"seller_id":"s","colour":"red"}"#;
        assert!(serde_json::from_str::<NewProduct>(body).is_err());

        let body = r#"{"name":"Rice","price":-1,"seller_id":"s"}"#;
        let req: NewProduct = serde_json::from_str(body).unwrap();
        assert!(matches!(req.into_product(None), Err(CommerceError::Validation(_))));

        let body = r#"{"name":"Rice","price":1e30,"seller_id":"s"}"#;
        let req: NewProduct = serde_json::from_str(body).unwrap();
        assert!(matches!(req.into_product(None), Err(CommerceError::Validation(_))));
    }

    #[test]
    fn test_relisting_keeps_provenance_and_rating() {
        let source = wholesale_rice();
        let mut copy = Product::transferred_from(&source, "retailer-1", 10, Money::from_f64(84.0).unwrap());
        copy.rating = 4.0;
        let body = format!(
            r#"{{"id":"{}","name":"House Basmati","price":"99.5","stock":10,"seller_id":"retailer-1"}}"#,
            copy.id
        );
        let req: NewProduct = serde_json::from_str(&body).unwrap();
        let relisted = req.into_product(Some(&copy)).unwrap();
        assert_eq!(relisted.id, copy.id);
        assert_eq!(relisted.name, "House Basmati");
        assert_eq!(relisted.price, 99.5);
        assert_eq!(relisted.rating, 4.0);
        assert_eq!(relisted.provenance(), Provenance::Transferred { wholesaler_product_id: "wh-rice" });
    }

    #[test]
    fn test_patch_updates_only_given_fields() {
        let source = wholesale_rice();
        let mut copy = Product::transferred_from(&source, "retailer-1", 10, Money::from_f64(84.0).unwrap());
        let patch: ProductPatch = serde_json::from_str(r#"{"price":"90","description":"Repacked"}"#).unwrap();
        patch.apply(&mut copy).unwrap();
        assert_eq!(copy.price, 90.0);
        assert_eq!(copy.description, "Repacked");
        assert_eq!(copy.stock, 10);
        assert_eq!(copy.original_wh_product_id.as_deref(), Some("wh-rice"));

        assert!(serde_json::from_str::<ProductPatch>(r#"{"original_wh_product_id":null}"#).is_err());
        let bad: ProductPatch = serde_json::from_str(r#"{"name":"Renamed","stock":-1}"#).unwrap();
        assert!(bad.apply(&mut copy).is_err());
        assert_eq!(copy.name, source.name);
    }

    #[test]
    fn test_filter() {
        let p = wholesale_rice();
        assert!(ProductFilter::default().matches(&p));
        let f = ProductFilter { search: Some("BASMATI".into()), ..Default::default() };
        assert!(f.matches(&p));
        let f = ProductFilter { category_id: Some("all".into()), max_price: Some(50.0), ..Default::default() };
        assert!(!f.matches(&p));
        let mut empty = p.clone();
        empty.stock = 0;
        assert!(!ProductFilter::default().matches(&empty));
        assert!(ProductFilter::for_seller("wholesaler-1").matches(&empty));
    }
}
