pub mod booking_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod driver_service;
pub mod fare_service;
pub mod location_relay;
pub mod notification_service;
pub mod trip_service;

pub use booking_service::{BookingOperations, BookingService};
pub use customer_service::{CustomerOperations, CustomerService};
pub use dashboard_service::{DashboardOperations, DashboardService};
pub use driver_service::{DriverOperations, DriverService};
pub use fare_service::FareCalculator;
pub use location_relay::LocationRelay;
pub use notification_service::{LogDispatcher, NotificationComposer, NotificationDispatcher};
pub use trip_service::{TripOperations, TripService};
