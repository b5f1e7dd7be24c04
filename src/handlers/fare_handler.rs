// src/handlers/fare_handler.rs
use axum::{Json, extract::State};
use std::sync::Arc;

use crate::{
    errors::DispatchResult,
    models::fare::{FareBreakdown, FareRequest, Tariff},
    state::AppState,
};

pub async fn estimate_fare(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FareRequest>,
) -> DispatchResult<Json<FareBreakdown>> {
    Ok(Json(state.fare_calculator.calculate(&request)?))
}

pub async fn get_tariff(State(state): State<Arc<AppState>>) -> Json<Tariff> {
    Json(state.fare_calculator.tariff().clone())
}
