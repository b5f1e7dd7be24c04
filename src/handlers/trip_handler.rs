// src/handlers/trip_handler.rs
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::DispatchResult,
    handlers::page_request,
    models::{
        page::Paginated,
        trip::{RoutePointRequest, Trip, TripFilter, TripStatus},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct TripListQuery {
    pub status: Option<TripStatus>,
    pub driver_id: Option<String>,
    pub customer_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TripListQuery {
    pub fn filter(&self) -> TripFilter {
        TripFilter {
            status: self.status,
            driver_id: self.driver_id.clone(),
            customer_id: self.customer_id.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

pub async fn list_trips(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TripListQuery>,
) -> DispatchResult<Json<Paginated<Trip>>> {
    let page = page_request(query.page, query.limit);
    Ok(Json(state.trip_service.list_trips(query.filter(), page).await?))
}

pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> DispatchResult<Json<Trip>> {
    Ok(Json(state.trip_service.get_trip(&trip_id).await?))
}

pub async fn record_route_point(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(point): Json<RoutePointRequest>,
) -> DispatchResult<Json<Trip>> {
    Ok(Json(state.trip_service.record_route_point(&trip_id, point).await?))
}
