// src/startup.rs
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        booking_handler, customer_handler, dashboard_handler, driver_handler, fare_handler,
        health_check, location_handler, trip_handler,
    },
    state::AppState,
};

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("Invalid frontend URL {:?}, allowing any origin", frontend_url);
            cors.allow_origin(Any)
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    let bookings = Router::new()
        .route(
            "/",
            get(booking_handler::list_bookings).post(booking_handler::create_booking),
        )
        .route("/:id", get(booking_handler::get_booking))
        .route("/:id/assign", post(booking_handler::assign_driver))
        .route("/:id/start", post(booking_handler::start_trip))
        .route("/:id/complete", post(booking_handler::complete_booking))
        .route("/:id/cancel", post(booking_handler::cancel_booking));

    let drivers = Router::new()
        .route(
            "/",
            get(driver_handler::list_drivers).post(driver_handler::register_driver),
        )
        .route(
            "/:id",
            get(driver_handler::get_driver).put(driver_handler::update_driver),
        )
        .route("/:id/status", patch(driver_handler::update_driver_status))
        .route("/:id/trips", get(driver_handler::get_driver_trips))
        .route("/:id/stats", get(driver_handler::get_driver_stats));

    let customers = Router::new()
        .route(
            "/",
            get(customer_handler::list_customers).post(customer_handler::create_customer),
        )
        .route(
            "/:id",
            get(customer_handler::get_customer).put(customer_handler::update_customer),
        )
        .route("/:id/status", patch(customer_handler::update_customer_status))
        .route("/:id/stats", get(customer_handler::get_customer_stats));

    let trips = Router::new()
        .route("/", get(trip_handler::list_trips))
        .route("/:id", get(trip_handler::get_trip))
        .route("/:id/route", put(trip_handler::record_route_point));

    let dashboard = Router::new()
        .route("/stats", get(dashboard_handler::get_stats))
        .route("/top-drivers", get(dashboard_handler::get_top_drivers))
        .route("/availability", get(dashboard_handler::get_driver_availability))
        .route("/trips", get(dashboard_handler::get_trip_stats));

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/fares/estimate", post(fare_handler::estimate_fare))
        .route("/tariffs", get(fare_handler::get_tariff))
        .route("/locations", post(location_handler::publish_location))
        .route("/locations/stream", get(location_handler::stream_locations))
        .nest("/bookings", bookings)
        .nest("/drivers", drivers)
        .nest("/customers", customers)
        .nest("/trips", trips)
        .nest("/dashboard", dashboard);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
