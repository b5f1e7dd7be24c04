// src/handlers/booking_handler.rs
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
        booking::{
            AssignDriverRequest, AssignmentResponse, Booking, BookingFilter, BookingRequest,
            BookingResponse, BookingStatus, CancelBookingRequest, CompleteBookingRequest,
            CompletionResponse, StartTripResponse,
        },
        fare::BookingType,
        page::Paginated,
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub booking_type: Option<BookingType>,
    pub driver_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> DispatchResult<(StatusCode, Json<BookingResponse>)> {
    let response = state.booking_service.create_booking(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingListQuery>,
) -> DispatchResult<Json<Paginated<Booking>>> {
    let filter = BookingFilter {
        status: query.status,
        booking_type: query.booking_type,
        driver_id: query.driver_id,
    };
    let page = page_request(query.page, query.limit);

    Ok(Json(state.booking_service.list_bookings(filter, page).await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> DispatchResult<Json<Booking>> {
    Ok(Json(state.booking_service.get_booking(&booking_id).await?))
}

pub async fn assign_driver(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(request): Json<AssignDriverRequest>,
) -> DispatchResult<Json<AssignmentResponse>> {
    Ok(Json(state.booking_service.assign_driver(&booking_id, request).await?))
}

pub async fn start_trip(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> DispatchResult<Json<StartTripResponse>> {
    Ok(Json(state.booking_service.start_trip(&booking_id).await?))
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(request): Json<CompleteBookingRequest>,
) -> DispatchResult<Json<CompletionResponse>> {
    Ok(Json(state.booking_service.complete_booking(&booking_id, request).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    request: Option<Json<CancelBookingRequest>>,
) -> DispatchResult<Json<BookingResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(state.booking_service.cancel_booking(&booking_id, request).await?))
}
