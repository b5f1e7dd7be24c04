// src/handlers/location_handler.rs
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{errors::DispatchResult, models::driver::DriverLocationUpdate, state::AppState};

pub async fn publish_location(
    State(state): State<Arc<AppState>>,
    Json(update): Json<DriverLocationUpdate>,
) -> DispatchResult<(StatusCode, Json<Value>)> {
    let delivered = state.location_relay.publish(update)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "delivered_to": delivered }))))
}

pub async fn stream_locations(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::info!(
        "Location stream opened ({} subscribers)",
        state.location_relay.subscriber_count() + 1
    );

    let events = state
        .location_relay
        .stream()
        .map(|update| Event::default().event("location").json_data(update));

    Sse::new(events).keep_alive(KeepAlive::default())
}
