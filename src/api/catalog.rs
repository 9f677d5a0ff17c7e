//! Catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::extract::{Path, Query, ValidatedJson};
use super::AppState;
use crate::domain::{NewProduct, Product, ProductFilter, ProductPatch, Provenance};
use crate::{CommerceError, Result};

/// Product as returned to callers, with its provenance spelled out.
#[derive(Serialize)]
pub struct ProductView<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub provenance: Provenance<'a>,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self {
        Self { product, provenance: product.provenance() }
    }
}

fn views(products: &[Product]) -> Response {
    Json(products.iter().map(ProductView::from).collect::<Vec<_>>()).into_response()
}

pub async fn list_products(State(s): State<AppState>, Query(filter): Query<ProductFilter>) -> Result<Response> {
    let products = s.store.list_products(&filter).await?;
    Ok(views(&products))
}

pub async fn products_by_retailer(State(s): State<AppState>, Path(rid): Path<String>) -> Result<Response> {
    let products = s.store.list_products(&ProductFilter::for_seller(rid)).await?;
    Ok(views(&products))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let product = s
        .store
        .get_product(&id)
        .await?
        .ok_or_else(|| CommerceError::not_found("product", &id))?;
    Ok(Json(ProductView::from(&product)).into_response())
}

/// Inserts, or replaces the listing with the same id. Replacing keeps the
/// listing's transfer provenance.
pub async fn create_product(State(s): State<AppState>, ValidatedJson(req): ValidatedJson<NewProduct>) -> Result<Response> {
    let existing = match req.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => s.store.get_product(id).await?,
        None => None,
    };
    let product = req.into_product(existing.as_ref())?;
    s.store.save_product(&product).await?;
    let stored = s
        .store
        .get_product(&product.id)
        .await?
        .ok_or_else(|| CommerceError::not_found("product", &product.id))?;
    Ok((StatusCode::CREATED, Json(ProductView::from(&stored))).into_response())
}

pub async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<ProductPatch>,
) -> Result<Response> {
    let mut product = s
        .store
        .get_product(&id)
        .await?
        .ok_or_else(|| CommerceError::not_found("product", &id))?;
    patch.apply(&mut product)?;
    s.store.save_product(&product).await?;
    Ok(Json(ProductView::from(&product)).into_response())
}
