use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use seeder::db::SeedError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned with every failed seed request.
pub const SEED_FAILURE_MESSAGE: &str = "Error seeding database";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Seeding error: {0}")]
    Seed(#[from] SeedError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Seed(e) => {
                error!("Seeding error: {e}");
                let body = Json(json!({
                    "error": e.to_string(),
                    "message": SEED_FAILURE_MESSAGE,
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
