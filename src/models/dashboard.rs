use serde::{Deserialize, Serialize};

use crate::models::driver::DriverStatus;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DashboardStats {
    pub total_drivers: u64,
    pub active_drivers: u64,
    pub on_trip_drivers: u64,
    pub total_customers: u64,
    pub total_bookings: u64,
    pub pending_bookings: u64,
    pub completed_bookings: u64,
    pub today_revenue: f64, // Completed today, UTC
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopDriver {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub total_trips: u32,
    pub total_earnings: f64,
    pub rating: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriverAvailability {
    pub status: DriverStatus,
    pub count: u64,
}
