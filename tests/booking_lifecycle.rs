use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use taxi_dispatch::{
    DispatchError,
    models::{
        AssignDriverRequest, BookingRequest, BookingStatus, BookingType, CancelBookingRequest,
        Booking, CompleteBookingRequest, Customer, CustomerStatus, CustomerStatusUpdate, Driver,
        DriverRegistration, DriverStatus, DriverStatusUpdate, Location, PageRequest, Trip,
        TripStatus, VehicleClass, WALK_IN_CUSTOMER_NAME,
    },
    errors::DispatchResult,
    services::{
        BookingOperations, BookingService, CustomerOperations, CustomerService, DriverOperations,
        DriverService, FareCalculator, LogDispatcher, NotificationComposer, TripOperations, TripService,
    },
    store::{Document, MemoryStore, Store, WriteBatch},
    utils::{clock::FixedClock, codes::MemoryCodeGenerator},
};

struct Fixture {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    bookings: BookingService,
    drivers: DriverService,
    customers: CustomerService,
    trips: TripService,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap()));
    let composer = NotificationComposer::default();

    Fixture {
        bookings: BookingService::new(
            store.clone(),
            Arc::new(MemoryCodeGenerator::new()),
            clock.clone(),
            FareCalculator::default(),
            composer.clone(),
            Arc::new(LogDispatcher),
        ),
        drivers: DriverService::new(store.clone(), clock.clone(), composer.clone()),
        customers: CustomerService::new(store.clone(), clock.clone(), composer),
        trips: TripService::new(store.clone(), clock.clone()),
        store,
        clock,
    }
}

async fn register_driver(f: &Fixture, n: u32) -> String {
    f.drivers
        .register_driver(DriverRegistration {
            name: Some(format!("Driver {}", n)),
            phone: Some(format!("98000000{:02}", n)),
            license_number: Some(format!("TN01-2020-{}", n)),
            vehicle_class: Some(VehicleClass::Sedan),
            registration_number: Some(format!("TN 01 AB {:04}", n)),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

fn booking_request(booking_type: BookingType, phone: &str) -> BookingRequest {
    BookingRequest {
        customer_phone: Some(phone.to_string()),
        vehicle_class: Some(VehicleClass::Sedan),
        booking_type: Some(booking_type),
        pickup_location: Some(Location::new("Central Station")),
        dropoff_location: Some(Location::new("T Nagar")),
        pickup_time: Some(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()),
        distance_km: Some(8.0),
        ..Default::default()
    }
}

async fn create_pending(f: &Fixture) -> String {
    f.bookings
        .create_booking(booking_request(BookingType::Local, "9876543210"))
        .await
        .unwrap()
        .booking
        .id
}

#[tokio::test]
async fn full_round_trip_settles_fare_and_frees_driver() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let booking_id = create_pending(&f).await;

    let assigned = f
        .bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id: driver_id.clone() })
        .await
        .unwrap();
    assert_eq!(assigned.booking.status, BookingStatus::Assigned);
    assert_eq!(assigned.driver.status, DriverStatus::OnTrip);
    let notifications = assigned.notifications.expect("assignment messages");
    assert!(notifications.driver.link.starts_with("https://wa.me/919800000001?text="));
    assert!(notifications.customer.link.starts_with("https://wa.me/919876543210?text="));

    let started = f.bookings.start_trip(&booking_id).await.unwrap();
    assert_eq!(started.booking.status, BookingStatus::Started);
    assert_eq!(started.trip.status, TripStatus::Active);
    assert_eq!(started.trip.start_location.address, "Central Station");

    f.clock.advance(Duration::minutes(40));
    let completed = f
        .bookings
        .complete_booking(
            &booking_id,
            CompleteBookingRequest {
                actual_distance_km: Some(10.0),
                duration_minutes: Some(2.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // 200 minimum + 7 km x 25 + 2 min x 4
    assert_eq!(completed.invoice.fare.total, 383.0);
    assert_eq!(completed.booking.status, BookingStatus::Completed);
    assert_eq!(completed.booking.distance_km, 10.0);
    assert!(completed.booking.is_consistent());
    assert_eq!(completed.invoice.invoice_code, "INV-20261016-0001");
    assert!(completed.notification.is_some());

    let trip = completed.trip.expect("closed trip");
    assert_eq!(trip.status, TripStatus::Completed);
    assert_eq!(trip.end_location.map(|l| l.address), Some("T Nagar".to_string()));
    assert_eq!(f.trips.get_trip(&trip.id).await.unwrap().fare.map(|x| x.total), Some(383.0));

    let driver = f.drivers.get_driver(&driver_id).await.unwrap();
    assert_eq!(driver.status, DriverStatus::Active);
    assert_eq!(driver.total_trips, 1);
    assert_eq!(driver.total_earnings, 383.0);

    let customer = f.customers.get_customer_by_phone("9876543210").await.unwrap();
    assert_eq!(customer.total_trips, 1);
    assert_eq!(customer.total_spent, 383.0);
}

#[tokio::test]
async fn assignment_rejects_driver_on_break() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    f.drivers
        .update_driver_status(&driver_id, DriverStatusUpdate { status: DriverStatus::OnBreak })
        .await
        .unwrap();
    let booking_id = create_pending(&f).await;

    let result = f
        .bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id: driver_id.clone() })
        .await;
    assert!(matches!(result, Err(DispatchError::DriverUnavailable { status, .. }) if status == "ON_BREAK"));

    let booking = f.bookings.get_booking(&booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.driver_id, None);
    assert_eq!(booking.version, 1);
}

#[tokio::test]
async fn assignment_of_unknown_driver() {
    let f = fixture();
    let booking_id = create_pending(&f).await;

    let result = f
        .bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id: "drv-261016-nope1".to_string() })
        .await;
    assert!(matches!(result, Err(DispatchError::DriverNotFound(_))));
}

#[tokio::test]
async fn cancel_of_completed_booking_is_rejected() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let booking_id = create_pending(&f).await;
    f.bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id })
        .await
        .unwrap();
    f.bookings
        .complete_booking(
            &booking_id,
            CompleteBookingRequest {
                actual_distance_km: Some(3.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = f
        .bookings
        .cancel_booking(&booking_id, CancelBookingRequest::default())
        .await;
    assert!(matches!(result, Err(DispatchError::InvalidTransition { .. })));
    assert_eq!(
        f.bookings.get_booking(&booking_id).await.unwrap().status,
        BookingStatus::Completed
    );
}

#[tokio::test]
async fn cancel_clears_driver_and_frees_them() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let booking_id = create_pending(&f).await;
    f.bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id: driver_id.clone() })
        .await
        .unwrap();

    let cancelled = f
        .bookings
        .cancel_booking(
            &booking_id,
            CancelBookingRequest {
                reason: Some("Customer no-show".to_string()),
            },
        )
        .await
        .unwrap()
        .booking;

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.driver_id, None);
    assert_eq!(cancelled.notes.as_deref(), Some("Customer no-show"));
    assert!(cancelled.cancelled_at.is_some());
    assert!(cancelled.is_consistent());

    let driver = f.drivers.get_driver(&driver_id).await.unwrap();
    assert_eq!(driver.status, DriverStatus::Active);
    assert_eq!(driver.total_trips, 0);
}

#[tokio::test]
async fn started_booking_cannot_be_cancelled() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let booking_id = create_pending(&f).await;
    f.bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id })
        .await
        .unwrap();
    f.bookings.start_trip(&booking_id).await.unwrap();

    let result = f
        .bookings
        .cancel_booking(&booking_id, CancelBookingRequest::default())
        .await;
    assert!(matches!(result, Err(DispatchError::InvalidTransition { .. })));
}

#[tokio::test]
async fn repeat_completion_counts_the_trip_once() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let booking_id = create_pending(&f).await;
    f.bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id: driver_id.clone() })
        .await
        .unwrap();

    let request = || CompleteBookingRequest {
        actual_distance_km: Some(5.0),
        ..Default::default()
    };
    f.bookings.complete_booking(&booking_id, request()).await.unwrap();
    let again = f.bookings.complete_booking(&booking_id, request()).await;

    assert!(matches!(again, Err(DispatchError::InvalidTransition { .. })));
    assert_eq!(f.drivers.get_driver(&driver_id).await.unwrap().total_trips, 1);
}

#[tokio::test]
async fn concurrent_assignment_of_one_driver_lets_one_win() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let first = create_pending(&f).await;
    let second = create_pending(&f).await;

    let (a, b) = tokio::join!(
        f.bookings
            .assign_driver(&first, AssignDriverRequest { driver_id: driver_id.clone() }),
        f.bookings
            .assign_driver(&second, AssignDriverRequest { driver_id: driver_id.clone() }),
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser,
        Err(DispatchError::Conflict(_)) | Err(DispatchError::DriverUnavailable { .. })
    ));

    let holding = f
        .store
        .list_bookings()
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.driver_id.as_deref() == Some(driver_id.as_str()))
        .count();
    assert_eq!(holding, 1);
}

#[tokio::test]
async fn walk_in_customer_is_provisioned_once() {
    let f = fixture();
    f.bookings
        .create_booking(booking_request(BookingType::Local, "+91 98765 43210"))
        .await
        .unwrap();
    f.bookings
        .create_booking(booking_request(BookingType::Outstation, "9876543210"))
        .await
        .unwrap();

    let customers = f.customers.list_customers(PageRequest::default()).await.unwrap();
    assert_eq!(customers.total, 1);
    let customer = &customers.items[0];
    assert_eq!(customer.name, WALK_IN_CUSTOMER_NAME);
    assert_eq!(customer.address, "Central Station");
    assert_eq!(customer.phone, "919876543210");
}

#[tokio::test]
async fn booking_codes_are_sequential_per_day() {
    let f = fixture();
    let first = f
        .bookings
        .create_booking(booking_request(BookingType::Local, "9876543210"))
        .await
        .unwrap()
        .booking;
    let second = f
        .bookings
        .create_booking(booking_request(BookingType::Local, "9876543210"))
        .await
        .unwrap()
        .booking;
    f.clock.advance(Duration::days(1));
    let next_day = f
        .bookings
        .create_booking(booking_request(BookingType::Local, "9876543210"))
        .await
        .unwrap()
        .booking;

    assert_eq!(first.booking_code, "BK-20261016-0001");
    assert_eq!(second.booking_code, "BK-20261016-0002");
    assert_eq!(next_day.booking_code, "BK-20261017-0001");
}

#[tokio::test]
async fn outstation_completion_charges_halts() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let mut request = booking_request(BookingType::Outstation, "9876543210");
    request.vehicle_class = Some(VehicleClass::SuvMuv);
    request.driver_id = Some(driver_id);
    let booking_id = f.bookings.create_booking(request).await.unwrap().booking.id;

    let completed = f
        .bookings
        .complete_booking(
            &booking_id,
            CompleteBookingRequest {
                actual_distance_km: Some(100.0),
                day_halt_count: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(completed.invoice.fare.total, 3400.0);
    assert!(completed.trip.is_none());
    let text = completed.notification.expect("invoice message").text;
    assert!(text.contains("Day Halt: ₹1200"));
}

/// Lands a rival batch just before the next commit goes through.
struct RivalStore {
    inner: Arc<MemoryStore>,
    rival: Mutex<Option<WriteBatch>>,
}

#[async_trait]
impl Store for RivalStore {
    async fn get_booking(&self, id: &str) -> DispatchResult<Option<Booking>> {
        self.inner.get_booking(id).await
    }

    async fn get_driver(&self, id: &str) -> DispatchResult<Option<Driver>> {
        self.inner.get_driver(id).await
    }

    async fn get_customer(&self, id: &str) -> DispatchResult<Option<Customer>> {
        self.inner.get_customer(id).await
    }

    async fn get_trip(&self, id: &str) -> DispatchResult<Option<Trip>> {
        self.inner.get_trip(id).await
    }

    async fn get_customer_by_phone(&self, phone: &str) -> DispatchResult<Option<Customer>> {
        self.inner.get_customer_by_phone(phone).await
    }

    async fn find_active_trip(&self, booking_id: &str) -> DispatchResult<Option<Trip>> {
        self.inner.find_active_trip(booking_id).await
    }

    async fn list_bookings(&self) -> DispatchResult<Vec<Booking>> {
        self.inner.list_bookings().await
    }

    async fn list_drivers(&self) -> DispatchResult<Vec<Driver>> {
        self.inner.list_drivers().await
    }

    async fn list_customers(&self) -> DispatchResult<Vec<Customer>> {
        self.inner.list_customers().await
    }

    async fn list_trips(&self) -> DispatchResult<Vec<Trip>> {
        self.inner.list_trips().await
    }

    async fn commit(&self, batch: WriteBatch) -> DispatchResult<()> {
        if let Some(rival) = self.rival.lock().await.take() {
            self.inner.commit(rival).await?;
        }
        self.inner.commit(batch).await
    }
}

#[tokio::test]
async fn assignment_loses_to_a_driver_update_landing_first() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let booking_id = create_pending(&f).await;

    let mut rival = f.store.get_driver(&driver_id).await.unwrap().unwrap();
    rival.status = DriverStatus::OnBreak;
    rival.touch(Utc::now());

    let store = Arc::new(RivalStore {
        inner: f.store.clone(),
        rival: Mutex::new(Some(WriteBatch::new().put(rival))),
    });
    let bookings = BookingService::new(
        store,
        Arc::new(MemoryCodeGenerator::new()),
        f.clock.clone(),
        FareCalculator::default(),
        NotificationComposer::default(),
        Arc::new(LogDispatcher),
    );

    let result = bookings
        .assign_driver(&booking_id, AssignDriverRequest { driver_id: driver_id.clone() })
        .await;
    assert!(matches!(result, Err(DispatchError::Conflict(_))), "{:?}", result.err());

    let booking = f.bookings.get_booking(&booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(booking.driver_id.is_none());
    let driver = f.drivers.get_driver(&driver_id).await.unwrap();
    assert_eq!(driver.status, DriverStatus::OnBreak);
    assert_eq!(driver.version, 2);
}

#[tokio::test]
async fn directory_stats_follow_completed_bookings() {
    let f = fixture();
    let driver_id = register_driver(&f, 1).await;
    let mut request = booking_request(BookingType::Local, "9876543210");
    request.driver_id = Some(driver_id.clone());
    let created = f.bookings.create_booking(request).await.unwrap().booking;
    create_pending(&f).await;

    f.bookings.start_trip(&created.id).await.unwrap();
    f.bookings
        .complete_booking(
            &created.id,
            CompleteBookingRequest {
                actual_distance_km: Some(3.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let driver = f.drivers.driver_stats(&driver_id).await.unwrap();
    assert_eq!(driver.total_trips, 1);
    assert_eq!(driver.completed_trips, 1);
    assert_eq!(driver.total_distance_km, 3.0);
    assert_eq!(driver.total_earnings, 200.0);

    let customer = f.customers.customer_stats(&created.customer_id).await.unwrap();
    assert_eq!(customer.total_bookings, 2);
    assert_eq!(customer.completed_bookings, 1);
    assert_eq!(customer.total_spent, 200.0);
    assert_eq!(customer.avg_fare, 200.0);

    let inactive = f
        .customers
        .update_customer_status(
            &created.customer_id,
            CustomerStatusUpdate { status: CustomerStatus::Inactive },
        )
        .await
        .unwrap();
    assert_eq!(inactive.total_trips, 1);
    assert_eq!(inactive.status, CustomerStatus::Inactive);
}
