// src/models/trip.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::booking::Location;
use crate::models::fare::FareBreakdown;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Active,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Trip {
    pub id: String,
    pub booking_id: String,
    pub driver_id: String,
    pub customer_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_location: Location,
    pub end_location: Option<Location>,
    pub actual_distance_km: Option<f64>,
    pub actual_duration_minutes: Option<f64>,
    pub status: TripStatus,
    pub fare: Option<FareBreakdown>,
    pub route: Vec<RoutePoint>, // Oldest first
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoutePointRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TripFilter {
    pub status: Option<TripStatus>,
    pub driver_id: Option<String>,
    pub customer_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Aggregates over completed trips.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TripSummary {
    pub total_trips: u32,
    pub total_distance_km: f64,
    pub total_revenue: f64,
    pub avg_distance_km: f64,
    pub avg_fare: f64,
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripStatus::Active => f.write_str("ACTIVE"),
            TripStatus::Completed => f.write_str("COMPLETED"),
        }
    }
}

impl TripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.status.is_none_or(|s| trip.status == s)
            && self.driver_id.as_deref().is_none_or(|d| trip.driver_id == d)
            && self.customer_id.as_deref().is_none_or(|c| trip.customer_id == c)
            && self.date_from.is_none_or(|from| trip.start_time >= from)
            && self.date_to.is_none_or(|to| trip.start_time <= to)
    }
}
