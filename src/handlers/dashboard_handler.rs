// src/handlers/dashboard_handler.rs
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::DispatchResult,
    handlers::trip_handler::TripListQuery,
    models::{
        dashboard::{DashboardStats, DriverAvailability, TopDriver},
        trip::TripSummary,
    },
    state::AppState,
};

const DEFAULT_TOP_DRIVERS: usize = 5;

#[derive(Debug, Deserialize, Default)]
pub struct TopDriversQuery {
    pub limit: Option<usize>,
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> DispatchResult<Json<DashboardStats>> {
    Ok(Json(state.dashboard_service.stats().await?))
}

pub async fn get_top_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopDriversQuery>,
) -> DispatchResult<Json<Vec<TopDriver>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_DRIVERS);
    Ok(Json(state.dashboard_service.top_drivers(limit).await?))
}

pub async fn get_driver_availability(
    State(state): State<Arc<AppState>>,
) -> DispatchResult<Json<Vec<DriverAvailability>>> {
    Ok(Json(state.dashboard_service.driver_availability().await?))
}

pub async fn get_trip_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TripListQuery>,
) -> DispatchResult<Json<TripSummary>> {
    Ok(Json(state.dashboard_service.trip_stats(query.filter()).await?))
}
