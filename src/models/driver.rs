// src/models/driver.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::fare::VehicleClass;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Active,   // Available for assignment
    Inactive, // Not working
    OnTrip,   // Reserved by an assigned or started booking
    OnBreak,  // Temporarily unavailable
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    pub vehicle_class: VehicleClass,
    pub registration_number: String,
    pub status: DriverStatus,
    pub rating: f32,          // Average rating (0-5)
    pub total_trips: u32,     // Completed bookings only
    pub total_earnings: f64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DriverRegistration {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
    pub vehicle_class: Option<VehicleClass>,
    pub registration_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

/// Profile edits. Status and counters are not editable here.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DriverUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
    pub vehicle_class: Option<VehicleClass>,
    pub registration_number: Option<String>,
    pub rating: Option<f32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverStatusUpdate {
    pub status: DriverStatus,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DriverFilter {
    pub status: Option<DriverStatus>,
    pub vehicle_class: Option<VehicleClass>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DriverStats {
    pub total_trips: u64,
    pub completed_trips: u64,
    pub total_distance_km: f64,
    pub total_earnings: f64,
    pub rating: f32,
}

impl DriverStatus {
    pub fn is_assignable(&self) -> bool {
        matches!(self, DriverStatus::Active)
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverStatus::Active => "ACTIVE",
            DriverStatus::Inactive => "INACTIVE",
            DriverStatus::OnTrip => "ON_TRIP",
            DriverStatus::OnBreak => "ON_BREAK",
        };
        f.write_str(s)
    }
}

impl DriverFilter {
    pub fn matches(&self, driver: &Driver) -> bool {
        self.status.is_none_or(|s| driver.status == s)
            && self.vehicle_class.is_none_or(|c| driver.vehicle_class == c)
    }
}

/// Live position pushed by a driver app and relayed to dashboards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriverLocationUpdate {
    pub driver_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<f64>, // Direction in degrees (0-360)
    pub speed: Option<f64>,   // Speed in km/h
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}
