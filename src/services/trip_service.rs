// src/services/trip_service.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::{DispatchError, DispatchResult, Validator},
    models::{
        page::{PageRequest, Paginated},
        trip::{RoutePoint, RoutePointRequest, Trip, TripFilter, TripStatus, TripSummary},
    },
    store::{Document, Store, WriteBatch},
    utils::clock::Clock,
};

#[async_trait]
pub trait TripOperations: Send + Sync {
    async fn get_trip(&self, trip_id: &str) -> DispatchResult<Trip>;
    async fn list_trips(&self, filter: TripFilter, page: PageRequest) -> DispatchResult<Paginated<Trip>>;
    async fn record_route_point(&self, trip_id: &str, point: RoutePointRequest) -> DispatchResult<Trip>;
    async fn trip_summary(&self, filter: TripFilter) -> DispatchResult<TripSummary>;
}

pub struct TripService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl TripService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn matching_trips(&self, filter: &TripFilter) -> DispatchResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .store
            .list_trips()
            .await?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        trips.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(trips)
    }
}

fn summarize(trips: &[Trip]) -> TripSummary {
    let completed: Vec<&Trip> = trips
        .iter()
        .filter(|t| t.status == TripStatus::Completed)
        .collect();

    let total_trips = completed.len() as u32;
    let total_distance_km: f64 = completed.iter().filter_map(|t| t.actual_distance_km).sum();
    let total_revenue: f64 = completed
        .iter()
        .filter_map(|t| t.fare.as_ref())
        .map(|f| f.total)
        .sum();

    let (avg_distance_km, avg_fare) = if total_trips == 0 {
        (0.0, 0.0)
    } else {
        let n = f64::from(total_trips);
        (total_distance_km / n, total_revenue / n)
    };

    TripSummary {
        total_trips,
        total_distance_km,
        total_revenue,
        avg_distance_km,
        avg_fare,
    }
}

#[async_trait]
impl TripOperations for TripService {
    async fn get_trip(&self, trip_id: &str) -> DispatchResult<Trip> {
        tracing::debug!("Getting trip: {}", trip_id);

        self.store
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| DispatchError::TripNotFound(trip_id.to_string()))
    }

    async fn list_trips(&self, filter: TripFilter, page: PageRequest) -> DispatchResult<Paginated<Trip>> {
        let trips = self.matching_trips(&filter).await?;
        Ok(Paginated::from_sorted(trips, page))
    }

    async fn record_route_point(&self, trip_id: &str, point: RoutePointRequest) -> DispatchResult<Trip> {
        let mut v = Validator::new();
        let latitude = v.require("latitude", point.latitude);
        let longitude = v.require("longitude", point.longitude);
        if latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            v.add("latitude", "must be between -90 and 90");
        }
        if longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
            v.add("longitude", "must be between -180 and 180");
        }
        v.finish()?;

        let mut trip = self.get_trip(trip_id).await?;
        if trip.status != TripStatus::Active {
            return Err(DispatchError::invalid_transition(trip.status, "record a route point"));
        }

        let now = self.clock.now();
        trip.route.push(RoutePoint {
            latitude: latitude.unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
            timestamp: now,
        });
        trip.touch(now);

        self.store.commit(WriteBatch::new().put(trip.clone())).await?;

        tracing::debug!("Route point {} recorded for trip {}", trip.route.len(), trip.id);
        Ok(trip)
    }

    async fn trip_summary(&self, filter: TripFilter) -> DispatchResult<TripSummary> {
        let trips = self.matching_trips(&filter).await?;
        Ok(summarize(&trips))
    }
}
