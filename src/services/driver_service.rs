// src/services/driver_service.rs
use async_trait::async_trait;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{DispatchError, DispatchResult, Validator},
    models::{
        driver::{
            Driver, DriverFilter, DriverRegistration, DriverStats, DriverStatus, DriverStatusUpdate,
            DriverUpdate,
        },
        page::{PageRequest, Paginated},
        trip::{Trip, TripStatus},
    },
    services::notification_service::NotificationComposer,
    store::{Document, Store, WriteBatch},
    utils::{
        clock::Clock,
        id_generator::{IdGenerator, IdType},
    },
};

const DEFAULT_RATING: f32 = 5.0;

#[async_trait]
pub trait DriverOperations: Send + Sync {
    async fn register_driver(&self, registration: DriverRegistration) -> DispatchResult<Driver>;
    async fn get_driver(&self, driver_id: &str) -> DispatchResult<Driver>;
    async fn list_drivers(&self, filter: DriverFilter, page: PageRequest) -> DispatchResult<Paginated<Driver>>;
    async fn update_driver(&self, driver_id: &str, update: DriverUpdate) -> DispatchResult<Driver>;
    async fn update_driver_status(&self, driver_id: &str, update: DriverStatusUpdate) -> DispatchResult<Driver>;
    async fn get_driver_trips(&self, driver_id: &str, page: PageRequest) -> DispatchResult<Paginated<Trip>>;
    async fn driver_stats(&self, driver_id: &str) -> DispatchResult<DriverStats>;
}

pub struct DriverService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    composer: NotificationComposer,
}

impl DriverService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, composer: NotificationComposer) -> Self {
        Self {
            store,
            clock,
            composer,
        }
    }

    /// Phone, license and registration number must not belong to another driver.
    async fn ensure_unique(&self, candidate: &Driver) -> DispatchResult<()> {
        let drivers = self.store.list_drivers().await?;

        for other in drivers.iter().filter(|d| d.id != candidate.id) {
            let clash = if other.phone == candidate.phone {
                Some("phone")
            } else if same_identifier(&other.license_number, &candidate.license_number) {
                Some("license number")
            } else if same_identifier(&other.registration_number, &candidate.registration_number) {
                Some("registration number")
            } else {
                None
            };

            if let Some(field) = clash {
                return Err(DispatchError::Conflict(format!(
                    "Driver {} already uses this {}",
                    other.id, field
                )));
            }
        }

        Ok(())
    }
}

/// "TN 01 ab-1234" and "TN01AB-1234" are the same plate.
fn same_identifier(a: &str, b: &str) -> bool {
    let canonical = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    };
    canonical(a) == canonical(b)
}

#[async_trait]
impl DriverOperations for DriverService {
    async fn register_driver(&self, registration: DriverRegistration) -> DispatchResult<Driver> {
        let mut v = Validator::new();
        let name = v.require_text("name", registration.name);
        let phone = v.require_text("phone", registration.phone);
        let license_number = v.require_text("license_number", registration.license_number);
        let vehicle_class = v.require("vehicle_class", registration.vehicle_class);
        let registration_number = v.require_text("registration_number", registration.registration_number);
        v.finish()?;

        let phone = self.composer.normalize_phone(&phone.unwrap_or_default())?;
        let now = self.clock.now();

        let mut driver = Driver {
            id: IdGenerator::generate_with_timestamp(IdType::Driver, now),
            name: name.unwrap_or_default(),
            phone,
            license_number: license_number.unwrap_or_default(),
            license_expiry: registration.license_expiry,
            vehicle_class: vehicle_class
                .ok_or_else(|| DispatchError::validation_error("vehicle_class", "is required"))?,
            registration_number: registration_number.unwrap_or_default(),
            status: DriverStatus::Active,
            rating: DEFAULT_RATING,
            total_trips: 0,
            total_earnings: 0.0,
            address: registration.address,
            city: registration.city,
            notes: registration.notes,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        tracing::info!("Registering driver {} ({})", driver.name, driver.phone);

        self.ensure_unique(&driver).await?;
        driver.touch(now);
        self.store.commit(WriteBatch::new().put(driver.clone())).await?;

        tracing::info!("Driver registered successfully: {}", driver.id);
        Ok(driver)
    }

    async fn get_driver(&self, driver_id: &str) -> DispatchResult<Driver> {
        tracing::debug!("Getting driver: {}", driver_id);

        if !IdGenerator::validate_id(driver_id, IdType::Driver) {
            return Err(DispatchError::DriverNotFound(driver_id.to_string()));
        }

        self.store
            .get_driver(driver_id)
            .await?
            .ok_or_else(|| DispatchError::DriverNotFound(driver_id.to_string()))
    }

    async fn list_drivers(&self, filter: DriverFilter, page: PageRequest) -> DispatchResult<Paginated<Driver>> {
        let mut drivers: Vec<Driver> = self
            .store
            .list_drivers()
            .await?
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();
        drivers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Paginated::from_sorted(drivers, page))
    }

    async fn update_driver(&self, driver_id: &str, update: DriverUpdate) -> DispatchResult<Driver> {
        let mut driver = self.get_driver(driver_id).await?;

        let mut v = Validator::new();
        if let Some(rating) = update.rating {
            if !(0.0..=5.0).contains(&rating) {
                v.add("rating", "must be between 0 and 5");
            }
        }
        for (field, value) in [
            ("name", &update.name),
            ("license_number", &update.license_number),
            ("registration_number", &update.registration_number),
        ] {
            if value.as_deref().is_some_and(|s| s.trim().is_empty()) {
                v.add(field, "must not be empty");
            }
        }
        v.finish()?;

        if let Some(phone) = update.phone {
            driver.phone = self.composer.normalize_phone(&phone)?;
        }
        if let Some(name) = update.name {
            driver.name = name.trim().to_string();
        }
        if let Some(license_number) = update.license_number {
            driver.license_number = license_number.trim().to_string();
        }
        if let Some(registration_number) = update.registration_number {
            driver.registration_number = registration_number.trim().to_string();
        }
        if let Some(vehicle_class) = update.vehicle_class {
            driver.vehicle_class = vehicle_class;
        }
        if let Some(rating) = update.rating {
            driver.rating = rating;
        }
        driver.license_expiry = update.license_expiry.or(driver.license_expiry);
        driver.address = update.address.or(driver.address);
        driver.city = update.city.or(driver.city);
        driver.notes = update.notes.or(driver.notes);

        self.ensure_unique(&driver).await?;
        driver.touch(self.clock.now());
        self.store.commit(WriteBatch::new().put(driver.clone())).await?;

        tracing::info!("Driver profile updated: {}", driver.id);
        Ok(driver)
    }

    async fn update_driver_status(&self, driver_id: &str, update: DriverStatusUpdate) -> DispatchResult<Driver> {
        let mut driver = self.get_driver(driver_id).await?;

        if driver.status == update.status {
            return Ok(driver);
        }

        // ON_TRIP is owned by the booking lifecycle
        if update.status == DriverStatus::OnTrip || driver.status == DriverStatus::OnTrip {
            return Err(DispatchError::invalid_transition(
                driver.status,
                format!("set driver status to {}", update.status),
            ));
        }

        tracing::info!(
            "Updating driver status: {} from {} to {}",
            driver.id,
            driver.status,
            update.status
        );

        driver.status = update.status;
        driver.touch(self.clock.now());
        self.store.commit(WriteBatch::new().put(driver.clone())).await?;

        Ok(driver)
    }

    async fn get_driver_trips(&self, driver_id: &str, page: PageRequest) -> DispatchResult<Paginated<Trip>> {
        let driver = self.get_driver(driver_id).await?;

        let mut trips: Vec<Trip> = self
            .store
            .list_trips()
            .await?
            .into_iter()
            .filter(|t| t.driver_id == driver.id)
            .collect();
        trips.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        Ok(Paginated::from_sorted(trips, page))
    }

    async fn driver_stats(&self, driver_id: &str) -> DispatchResult<DriverStats> {
        let driver = self.get_driver(driver_id).await?;
        let trips = self.store.list_trips().await?;

        let mut stats = DriverStats {
            rating: driver.rating,
            ..Default::default()
        };
        for trip in trips.iter().filter(|t| t.driver_id == driver.id) {
            stats.total_trips += 1;
            if trip.status == TripStatus::Completed {
                stats.completed_trips += 1;
            }
            stats.total_distance_km += trip.actual_distance_km.unwrap_or(0.0);
            stats.total_earnings += trip.fare.as_ref().map_or(0.0, |f| f.total);
        }

        Ok(stats)
    }
}
