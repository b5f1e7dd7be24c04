// src/handlers/customer_handler.rs
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
        customer::{Customer, CustomerRegistration, CustomerStats, CustomerStatusUpdate, CustomerUpdate},
        page::Paginated,
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct CustomerListQuery {
    pub phone: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(registration): Json<CustomerRegistration>,
) -> DispatchResult<(StatusCode, Json<Customer>)> {
    let customer = state.customer_service.create_customer(registration).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// `?phone=` narrows the listing to the single customer with that number.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CustomerListQuery>,
) -> DispatchResult<Json<Paginated<Customer>>> {
    let page = page_request(query.page, query.limit);

    let listing = match query.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(phone) => {
            let customer = state.customer_service.get_customer_by_phone(phone).await?;
            Paginated::from_sorted(vec![customer], page)
        }
        None => state.customer_service.list_customers(page).await?,
    };

    Ok(Json(listing))
}

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> DispatchResult<Json<Customer>> {
    Ok(Json(state.customer_service.get_customer(&customer_id).await?))
}

pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    Json(update): Json<CustomerUpdate>,
) -> DispatchResult<Json<Customer>> {
    Ok(Json(state.customer_service.update_customer(&customer_id, update).await?))
}

pub async fn update_customer_status(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    Json(update): Json<CustomerStatusUpdate>,
) -> DispatchResult<Json<Customer>> {
    let customer = state
        .customer_service
        .update_customer_status(&customer_id, update)
        .await?;
    Ok(Json(customer))
}

pub async fn get_customer_stats(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> DispatchResult<Json<CustomerStats>> {
    Ok(Json(state.customer_service.customer_stats(&customer_id).await?))
}
