// src/handlers/mod.rs
use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::models::page::PageRequest;

pub mod booking_handler;
pub mod customer_handler;
pub mod dashboard_handler;
pub mod driver_handler;
pub mod fare_handler;
pub mod location_handler;
pub mod trip_handler;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "taxi-dispatch",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Page parameters from a query string, defaults for whatever is absent.
pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        limit: limit.unwrap_or(defaults.limit),
    }
}
