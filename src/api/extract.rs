//! Request extraction with schema validation.

use axum::{
    async_trait,
    extract::{
        rejection::{PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::CommerceError;

/// JSON body that must deserialize into `T` and pass `T`'s validation rules.
/// Malformed JSON, unknown fields and rule violations all reject with a
/// validation error.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = CommerceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| CommerceError::validation(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| CommerceError::validation(e.to_string()))?;
        Ok(Self(value))
    }
}

/// Query string extractor whose rejections use the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(CommerceError))]
pub struct Query<T>(pub T);

/// Path extractor whose rejections use the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(CommerceError))]
pub struct Path<T>(pub T);

impl From<QueryRejection> for CommerceError {
    fn from(rejection: QueryRejection) -> Self {
        CommerceError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for CommerceError {
    fn from(rejection: PathRejection) -> Self {
        CommerceError::validation(rejection.body_text())
    }
}
