//! Development seeding endpoint

use axum::{extract::State, Json};

use super::AppState;
use crate::store::{seed_demo_data, SeedSummary};
use crate::{CommerceError, Result};

pub async fn seed_data(State(s): State<AppState>) -> Result<Json<SeedSummary>> {
    if !s.demo_seeding {
        return Err(CommerceError::not_found("route", "/api/seed-data"));
    }
    Ok(Json(seed_demo_data(&*s.store).await?))
}
