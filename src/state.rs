// src/state.rs
use std::sync::Arc;

use crate::{
    config::AppConfig,
    errors::DispatchResult,
    services::{
        BookingOperations, BookingService, CustomerOperations, CustomerService, DashboardOperations,
        DashboardService, DriverOperations, DriverService, FareCalculator, LocationRelay, LogDispatcher,
        NotificationComposer, NotificationDispatcher, TripOperations, TripService,
    },
    store::{MemoryStore, RedisStore, Store},
    utils::{
        clock::{Clock, SystemClock},
        codes::{CodeGenerator, MemoryCodeGenerator},
    },
};

pub struct AppState {
    pub booking_service: Arc<dyn BookingOperations>,
    pub driver_service: Arc<dyn DriverOperations>,
    pub customer_service: Arc<dyn CustomerOperations>,
    pub trip_service: Arc<dyn TripOperations>,
    pub dashboard_service: Arc<dyn DashboardOperations>,
    pub fare_calculator: FareCalculator,
    pub location_relay: LocationRelay,
    pub config: AppConfig,
}

/// Infrastructure the services are wired over.
pub struct Backends {
    pub store: Arc<dyn Store>,
    pub codes: Arc<dyn CodeGenerator>,
    pub clock: Arc<dyn Clock>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
}

impl Backends {
    /// Process-local backends with the system clock.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            codes: Arc::new(MemoryCodeGenerator::new()),
            clock: Arc::new(SystemClock),
            dispatcher: Arc::new(LogDispatcher),
        }
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> DispatchResult<Self> {
        let redis_url = config.redis_url.clone().filter(|url| !url.trim().is_empty());

        let backends = match redis_url {
            Some(url) => {
                let redis = Arc::new(RedisStore::connect(&url).await?);
                Backends {
                    store: redis.clone(),
                    codes: redis,
                    clock: Arc::new(SystemClock),
                    dispatcher: Arc::new(LogDispatcher),
                }
            }
            None => {
                tracing::warn!("DISPATCH_REDIS_URL not set, using in-memory store");
                Backends::in_memory()
            }
        };

        Ok(Self::with_backends(config, backends))
    }

    pub fn with_backends(config: AppConfig, backends: Backends) -> Self {
        let Backends {
            store,
            codes,
            clock,
            dispatcher,
        } = backends;

        let composer = NotificationComposer::new(config.notifications.clone());
        let fare_calculator = FareCalculator::new(config.tariff.clone());

        let booking_service = Arc::new(BookingService::new(
            store.clone(),
            codes,
            clock.clone(),
            fare_calculator.clone(),
            composer.clone(),
            dispatcher,
        ));
        let driver_service = Arc::new(DriverService::new(store.clone(), clock.clone(), composer.clone()));
        let customer_service = Arc::new(CustomerService::new(store.clone(), clock.clone(), composer));
        let trip_service: Arc<dyn TripOperations> = Arc::new(TripService::new(store.clone(), clock.clone()));
        let dashboard_service = Arc::new(DashboardService::new(store, trip_service.clone(), clock));

        Self {
            booking_service,
            driver_service,
            customer_service,
            trip_service,
            dashboard_service,
            fare_calculator,
            location_relay: LocationRelay::default(),
            config,
        }
    }
}
