// src/services/dashboard_service.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::DispatchResult,
    models::{
        booking::BookingStatus,
        dashboard::{DashboardStats, DriverAvailability, TopDriver},
        driver::DriverStatus,
        trip::{TripFilter, TripSummary},
    },
    services::trip_service::TripOperations,
    store::Store,
    utils::clock::Clock,
};

const ALL_DRIVER_STATUSES: [DriverStatus; 4] = [
    DriverStatus::Active,
    DriverStatus::OnTrip,
    DriverStatus::OnBreak,
    DriverStatus::Inactive,
];

#[async_trait]
pub trait DashboardOperations: Send + Sync {
    async fn stats(&self) -> DispatchResult<DashboardStats>;
    async fn top_drivers(&self, limit: usize) -> DispatchResult<Vec<TopDriver>>;
    async fn driver_availability(&self) -> DispatchResult<Vec<DriverAvailability>>;
    async fn trip_stats(&self, filter: TripFilter) -> DispatchResult<TripSummary>;
}

/// Read-only aggregates over the store. Trip figures come from the trip log.
pub struct DashboardService {
    store: Arc<dyn Store>,
    trips: Arc<dyn TripOperations>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>, trips: Arc<dyn TripOperations>, clock: Arc<dyn Clock>) -> Self {
        Self { store, trips, clock }
    }
}

#[async_trait]
impl DashboardOperations for DashboardService {
    async fn stats(&self) -> DispatchResult<DashboardStats> {
        let drivers = self.store.list_drivers().await?;
        let bookings = self.store.list_bookings().await?;
        let customers = self.store.list_customers().await?;
        let today = self.clock.now().date_naive();

        let count_drivers = |status: DriverStatus| drivers.iter().filter(|d| d.status == status).count() as u64;
        let count_bookings = |status: BookingStatus| bookings.iter().filter(|b| b.status == status).count() as u64;

        let today_revenue = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .filter(|b| b.completed_at.is_some_and(|at| at.date_naive() == today))
            .filter_map(|b| b.fare.as_ref())
            .map(|f| f.total)
            .sum();

        let stats = DashboardStats {
            total_drivers: drivers.len() as u64,
            active_drivers: count_drivers(DriverStatus::Active),
            on_trip_drivers: count_drivers(DriverStatus::OnTrip),
            total_customers: customers.len() as u64,
            total_bookings: bookings.len() as u64,
            pending_bookings: count_bookings(BookingStatus::Pending),
            completed_bookings: count_bookings(BookingStatus::Completed),
            today_revenue,
        };

        tracing::debug!("Dashboard stats: {:?}", stats);
        Ok(stats)
    }

    async fn top_drivers(&self, limit: usize) -> DispatchResult<Vec<TopDriver>> {
        let mut drivers = self.store.list_drivers().await?;
        drivers.sort_by(|a, b| {
            b.total_earnings
                .total_cmp(&a.total_earnings)
                .then_with(|| b.total_trips.cmp(&a.total_trips))
        });

        Ok(drivers
            .into_iter()
            .take(limit)
            .map(|d| TopDriver {
                id: d.id,
                name: d.name,
                phone: d.phone,
                total_trips: d.total_trips,
                total_earnings: d.total_earnings,
                rating: d.rating,
            })
            .collect())
    }

    async fn driver_availability(&self) -> DispatchResult<Vec<DriverAvailability>> {
        let drivers = self.store.list_drivers().await?;

        Ok(ALL_DRIVER_STATUSES
            .iter()
            .map(|status| DriverAvailability {
                status: *status,
                count: drivers.iter().filter(|d| d.status == *status).count() as u64,
            })
            .collect())
    }

    async fn trip_stats(&self, filter: TripFilter) -> DispatchResult<TripSummary> {
        self.trips.trip_summary(filter).await
    }
}
