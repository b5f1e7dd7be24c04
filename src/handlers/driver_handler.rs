// src/handlers/driver_handler.rs
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::DispatchResult,
    handlers::page_request,
    models::{
        driver::{
            Driver, DriverFilter, DriverRegistration, DriverStats, DriverStatus, DriverStatusUpdate,
            DriverUpdate,
        },
        fare::VehicleClass,
        page::Paginated,
        trip::Trip,
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct DriverListQuery {
    pub status: Option<DriverStatus>,
    pub vehicle_class: Option<VehicleClass>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<DriverRegistration>,
) -> DispatchResult<(StatusCode, Json<Driver>)> {
    let driver = state.driver_service.register_driver(registration).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

pub async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DriverListQuery>,
) -> DispatchResult<Json<Paginated<Driver>>> {
    let filter = DriverFilter {
        status: query.status,
        vehicle_class: query.vehicle_class,
    };
    let page = page_request(query.page, query.limit);

    Ok(Json(state.driver_service.list_drivers(filter, page).await?))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> DispatchResult<Json<Driver>> {
    Ok(Json(state.driver_service.get_driver(&driver_id).await?))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(update): Json<DriverUpdate>,
) -> DispatchResult<Json<Driver>> {
    Ok(Json(state.driver_service.update_driver(&driver_id, update).await?))
}

pub async fn update_driver_status(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Json(update): Json<DriverStatusUpdate>,
) -> DispatchResult<Json<Driver>> {
    Ok(Json(state.driver_service.update_driver_status(&driver_id, update).await?))
}

pub async fn get_driver_trips(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> DispatchResult<Json<Paginated<Trip>>> {
    let page = page_request(query.page, query.limit);
    Ok(Json(state.driver_service.get_driver_trips(&driver_id, page).await?))
}

pub async fn get_driver_stats(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> DispatchResult<Json<DriverStats>> {
    Ok(Json(state.driver_service.driver_stats(&driver_id).await?))
}
