// src/models/booking.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{DispatchError, DispatchResult};
use crate::models::fare::{BookingType, FareBreakdown, VehicleClass};
use crate::models::messages::OutboundMessage;
use crate::models::trip::Trip;
use crate::models::driver::Driver;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,   // Waiting for a driver
    Assigned,  // Driver reserved, ride not started
    Started,   // Trip record open
    Completed, // Fare settled
    Cancelled, // Withdrawn before the ride started
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Assign,
    Start,
    Complete,
    Cancel,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Collected,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Online,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    pub id: String,
    pub booking_code: String, // BK-YYYYMMDD-####
    pub customer_id: String,
    pub customer_phone: String,
    pub driver_id: Option<String>,
    pub vehicle_class: VehicleClass,
    pub booking_type: BookingType,

    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub pickup_time: DateTime<Utc>,
    pub ac_required: bool,
    pub distance_km: f64, // Estimate until completion, actual afterwards
    pub duration_minutes: Option<f64>,
    pub special_requests: Option<String>,

    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub fare: Option<FareBreakdown>,
    pub invoice_code: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>, // Actual drop-off time
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct BookingRequest {
    pub customer_phone: Option<String>,
    pub vehicle_class: Option<VehicleClass>,
    pub booking_type: Option<BookingType>,
    pub pickup_location: Option<Location>,
    pub dropoff_location: Option<Location>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub ac_required: Option<bool>,
    pub distance_km: Option<f64>,
    pub special_requests: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub driver_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CompleteBookingRequest {
    pub actual_distance_km: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub day_halt_count: u32,
    #[serde(default)]
    pub night_halt_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub booking_type: Option<BookingType>,
    pub driver_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Invoice {
    pub invoice_code: String, // INV-YYYYMMDD-####
    pub booking_code: String,
    pub distance_km: f64,
    pub fare: FareBreakdown,
    pub issued_at: DateTime<Utc>,
}

/// Messages prepared for the assigned driver and the customer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssignmentNotifications {
    pub driver: OutboundMessage,
    pub customer: OutboundMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<AssignmentNotifications>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub booking: Booking,
    pub driver: Driver,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<AssignmentNotifications>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartTripResponse {
    pub booking: Booking,
    pub trip: Trip,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<Trip>,
    pub invoice: Invoice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<OutboundMessage>,
}

impl BookingAction {
    pub fn verb(&self) -> &'static str {
        match self {
            BookingAction::Assign => "assign a driver",
            BookingAction::Start => "start the trip",
            BookingAction::Complete => "complete the booking",
            BookingAction::Cancel => "cancel the booking",
        }
    }
}

impl BookingStatus {
    /// Transition function of the booking lifecycle.
    pub fn apply(self, action: BookingAction) -> DispatchResult<BookingStatus> {
        use BookingAction::*;
        use BookingStatus::*;

        match (self, action) {
            (Pending, Assign) => Ok(Assigned),
            (Assigned, Start) => Ok(Started),
            (Assigned | Started, Complete) => Ok(Completed),
            (Pending | Assigned, Cancel) => Ok(Cancelled),
            (Pending, Start | Complete)
            | (Assigned, Assign)
            | (Started, Assign | Start | Cancel)
            | (Completed, Assign | Start | Complete | Cancel)
            | (Cancelled, Assign | Start | Complete | Cancel) => {
                Err(DispatchError::invalid_transition(self, action.verb()))
            }
        }
    }

    /// Statuses in which the booking references a driver.
    pub fn holds_driver(&self) -> bool {
        matches!(
            self,
            BookingStatus::Assigned | BookingStatus::Started | BookingStatus::Completed
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Assigned => "ASSIGNED",
            BookingStatus::Started => "STARTED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl Booking {
    /// Driver reference and fare presence agree with the status.
    pub fn is_consistent(&self) -> bool {
        self.driver_id.is_some() == self.status.holds_driver()
            && self.fare.is_some() == (self.status == BookingStatus::Completed)
    }
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|s| booking.status == s)
            && self.booking_type.is_none_or(|t| booking.booking_type == t)
            && self
                .driver_id
                .as_deref()
                .is_none_or(|d| booking.driver_id.as_deref() == Some(d))
    }
}
