//! HTTP request handlers for the dashboard API.

use std::sync::Arc;

use axum::{Extension, http::StatusCode, response::Json};
use seeder::{data::SeedData, db::Seeder};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const SEED_SUCCESS_MESSAGE: &str = "Database seeded successfully";

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub message: String,
}

/// Health check endpoint.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Creates the dashboard tables if needed and inserts the seed data.
///
/// Safe to call repeatedly: rows that already exist are left untouched.
pub async fn seed_database(
    Extension(seeder): Extension<Seeder>,
    Extension(data): Extension<Arc<SeedData>>,
) -> Result<Json<SeedResponse>, AppError> {
    let report = seeder.seed_all(&data).await?;

    tracing::info!(
        inserted = report.inserted(),
        skipped = report.skipped(),
        failed_tables = report.failures.len(),
        "Database seeded"
    );

    Ok(Json(SeedResponse {
        message: SEED_SUCCESS_MESSAGE.to_string(),
    }))
}
