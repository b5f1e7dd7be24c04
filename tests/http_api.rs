use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

use taxi_dispatch::{
    AppConfig, AppState,
    startup::build_router,
    state::Backends,
};

fn app() -> Router {
    let state = AppState::with_backends(AppConfig::default(), Backends::in_memory());
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // Extractor rejections answer in plain text
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}

fn driver_body() -> Value {
    json!({
        "name": "Ravi Kumar",
        "phone": "9800000001",
        "license_number": "TN01-2020-1",
        "vehicle_class": "SEDAN",
        "registration_number": "TN 01 AB 1234"
    })
}

fn booking_body() -> Value {
    json!({
        "customer_phone": "9876543210",
        "vehicle_class": "SEDAN",
        "booking_type": "LOCAL",
        "pickup_location": { "address": "Central Station" },
        "dropoff_location": { "address": "T Nagar" },
        "pickup_time": "2026-10-16T09:00:00Z"
    })
}

#[tokio::test]
async fn health_check_works() {
    let (status, body) = send(&app(), Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn fare_estimate_matches_tariff() {
    let request = json!({
        "booking_type": "DAY_RENT",
        "vehicle_class": "SEDAN",
        "distance_km": 250.0
    });
    let (status, body) = send(&app(), Method::POST, "/api/fares/estimate", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4100.0);
    assert_eq!(body["base_fare"], 3400.0);
    assert!(body.get("waiting_charge").is_none());
}

#[tokio::test]
async fn package_estimate_is_a_bad_request() {
    let request = json!({
        "booking_type": "PACKAGE",
        "vehicle_class": "SUV",
        "distance_km": 10.0
    });
    let (status, body) = send(&app(), Method::POST, "/api/fares/estimate", Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_booking_type");
}

#[tokio::test]
async fn missing_booking_fields_are_listed() {
    let (status, body) = send(&app(), Method::POST, "/api/bookings", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["details"].as_array().map(|d| d.len()), Some(6));
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let (status, body) = send(&app(), Method::GET, "/api/bookings/bkg-261016-nope1", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "booking_not_found");
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let app = app();

    let (status, driver) = send(&app, Method::POST, "/api/drivers", Some(driver_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    let driver_id = driver["id"].as_str().unwrap().to_string();

    let (status, created) = send(&app, Method::POST, "/api/bookings", Some(booking_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["booking"]["status"], "PENDING");
    let booking_id = created["booking"]["id"].as_str().unwrap().to_string();

    let (status, assigned) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/assign", booking_id),
        Some(json!({ "driver_id": driver_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["driver"]["status"], "ON_TRIP");
    assert!(assigned["notifications"]["driver"]["link"]
        .as_str()
        .unwrap()
        .starts_with("https://wa.me/919800000001?text="));

    let (status, _) = send(&app, Method::POST, &format!("/api/bookings/{}/start", booking_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, completed) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/complete", booking_id),
        Some(json!({ "actual_distance_km": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["invoice"]["fare"]["total"], 200.0);
    assert_eq!(completed["booking"]["payment_status"], "COLLECTED");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/cancel", booking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");

    let (_, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(stats["completed_bookings"], 1);
    assert_eq!(stats["active_drivers"], 1);

    let (_, trips) = send(&app, Method::GET, "/api/trips?status=COMPLETED", None).await;
    assert_eq!(trips["total"], 1);
}

#[tokio::test]
async fn manual_on_trip_status_is_a_conflict() {
    let app = app();
    let (_, driver) = send(&app, Method::POST, "/api/drivers", Some(driver_body())).await;
    let driver_id = driver["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/drivers/{}/status", driver_id),
        Some(json!({ "status": "ON_TRIP" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn bookings_list_filters_by_status() {
    let app = app();
    send(&app, Method::POST, "/api/bookings", Some(booking_body())).await;
    send(&app, Method::POST, "/api/bookings", Some(booking_body())).await;

    let (status, page) = send(&app, Method::GET, "/api/bookings?status=PENDING&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["pages"], 2);
    assert_eq!(page["items"].as_array().map(|i| i.len()), Some(1));

    let (_, page) = send(&app, Method::GET, "/api/bookings?status=COMPLETED", None).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn location_publish_without_subscribers() {
    let update = json!({ "driver_id": "drv-1", "latitude": 13.08, "longitude": 80.27 });
    let (status, body) = send(&app(), Method::POST, "/api/locations", Some(update)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["delivered_to"], 0);
}

#[tokio::test]
async fn customer_profile_status_and_stats() {
    let app = app();
    let (status, customer) = send(
        &app,
        Method::POST,
        "/api/customers",
        Some(json!({ "name": "Priya", "phone": "9876543210" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = customer["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/customers/{}", id),
        Some(json!({ "city": "Chennai" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["city"], "Chennai");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/customers/{}/status", id),
        Some(json!({ "status": "INACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "INACTIVE");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/customers/{}/status", id),
        Some(json!({ "status": "BANNED" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, stats) = send(&app, Method::GET, &format!("/api/customers/{}/stats", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_bookings"], 0);
}

#[tokio::test]
async fn driver_stats_report_rating() {
    let app = app();
    let (_, driver) = send(&app, Method::POST, "/api/drivers", Some(driver_body())).await;
    let driver_id = driver["id"].as_str().unwrap();

    let (status, stats) = send(&app, Method::GET, &format!("/api/drivers/{}/stats", driver_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["rating"], 5.0);
    assert_eq!(stats["completed_trips"], 0);
}
