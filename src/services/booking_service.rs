// src/services/booking_service.rs
use async_trait::async_trait;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{DispatchError, DispatchResult, Validator},
    models::{
        booking::{
            AssignDriverRequest, AssignmentNotifications, AssignmentResponse, Booking, BookingAction,
            BookingFilter, BookingRequest, BookingResponse, BookingStatus, CancelBookingRequest,
            CompleteBookingRequest, CompletionResponse, Invoice, Location, PaymentStatus,
            StartTripResponse,
        },
        driver::{Driver, DriverStatus},
        fare::{FareRequest, default_ac_required},
        messages::OutboundMessage,
        page::{PageRequest, Paginated},
        trip::{Trip, TripStatus},
    },
    services::{
        customer_service::walk_in_customer,
        fare_service::FareCalculator,
        notification_service::{NotificationComposer, NotificationDispatcher},
    },
    store::{Document, Store, WriteBatch},
    utils::{
        clock::Clock,
        codes::{CodeGenerator, CodeKind},
        id_generator::{IdGenerator, IdType},
    },
};

#[async_trait]
pub trait BookingOperations: Send + Sync {
    async fn create_booking(&self, request: BookingRequest) -> DispatchResult<BookingResponse>;
    async fn get_booking(&self, booking_id: &str) -> DispatchResult<Booking>;
    async fn list_bookings(&self, filter: BookingFilter, page: PageRequest) -> DispatchResult<Paginated<Booking>>;
    async fn assign_driver(&self, booking_id: &str, request: AssignDriverRequest) -> DispatchResult<AssignmentResponse>;
    async fn start_trip(&self, booking_id: &str) -> DispatchResult<StartTripResponse>;
    async fn complete_booking(&self, booking_id: &str, request: CompleteBookingRequest) -> DispatchResult<CompletionResponse>;
    async fn cancel_booking(&self, booking_id: &str, request: CancelBookingRequest) -> DispatchResult<BookingResponse>;
}

/// Booking state machine. Every transition commits the booking together with
/// the driver, trip and customer documents it touches.
pub struct BookingService {
    store: Arc<dyn Store>,
    codes: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    fares: FareCalculator,
    composer: NotificationComposer,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn Store>,
        codes: Arc<dyn CodeGenerator>,
        clock: Arc<dyn Clock>,
        fares: FareCalculator,
        composer: NotificationComposer,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            codes,
            clock,
            fares,
            composer,
            dispatcher,
        }
    }

    async fn load_booking(&self, booking_id: &str) -> DispatchResult<Booking> {
        if !IdGenerator::validate_id(booking_id, IdType::Booking) {
            return Err(DispatchError::BookingNotFound(booking_id.to_string()));
        }

        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| DispatchError::BookingNotFound(booking_id.to_string()))
    }

    async fn load_driver(&self, driver_id: &str) -> DispatchResult<Driver> {
        if !IdGenerator::validate_id(driver_id, IdType::Driver) {
            return Err(DispatchError::DriverNotFound(driver_id.to_string()));
        }

        self.store
            .get_driver(driver_id)
            .await?
            .ok_or_else(|| DispatchError::DriverNotFound(driver_id.to_string()))
    }

    /// Driver fetched for assignment, rejected unless ACTIVE.
    async fn load_assignable_driver(&self, driver_id: &str) -> DispatchResult<Driver> {
        let driver = self.load_driver(driver_id).await?;

        if !driver.status.is_assignable() {
            return Err(DispatchError::DriverUnavailable {
                driver_id: driver.id,
                status: driver.status.to_string(),
            });
        }

        Ok(driver)
    }

    fn assigned_driver_id(booking: &Booking) -> DispatchResult<&str> {
        booking.driver_id.as_deref().ok_or_else(|| {
            DispatchError::internal_error(format!(
                "Booking {} is {} without a driver",
                booking.id, booking.status
            ))
        })
    }

    async fn notify_assignment(&self, booking: &Booking, driver: &Driver) -> Option<AssignmentNotifications> {
        match self.composer.compose_assignment(booking, driver) {
            Ok(notifications) => {
                self.dispatch(&notifications.driver).await;
                self.dispatch(&notifications.customer).await;
                Some(notifications)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not compose assignment messages for {}: {}",
                    booking.booking_code,
                    e
                );
                None
            }
        }
    }

    async fn notify_invoice(&self, booking: &Booking, invoice: &Invoice) -> Option<OutboundMessage> {
        match self.composer.compose_invoice(booking, invoice) {
            Ok(message) => {
                self.dispatch(&message).await;
                Some(message)
            }
            Err(e) => {
                tracing::warn!("Could not compose invoice message for {}: {}", booking.booking_code, e);
                None
            }
        }
    }

    async fn dispatch(&self, message: &OutboundMessage) {
        if let Err(e) = self.dispatcher.dispatch(message).await {
            tracing::warn!("Failed to dispatch {:?} to {}: {}", message.kind, message.phone, e);
        }
    }
}

fn required_location(v: &mut Validator, field: &str, location: Option<Location>) -> Option<Location> {
    match location {
        Some(mut location) if !location.address.trim().is_empty() => {
            location.address = location.address.trim().to_string();
            Some(location)
        }
        _ => {
            v.add(field, "address is required");
            None
        }
    }
}

#[async_trait]
impl BookingOperations for BookingService {
    async fn create_booking(&self, request: BookingRequest) -> DispatchResult<BookingResponse> {
        let mut v = Validator::new();
        let customer_phone = v.require_text("customer_phone", request.customer_phone);
        let vehicle_class = v.require("vehicle_class", request.vehicle_class);
        let booking_type = v.require("booking_type", request.booking_type);
        let pickup_location = required_location(&mut v, "pickup_location", request.pickup_location);
        let dropoff_location = required_location(&mut v, "dropoff_location", request.dropoff_location);
        let pickup_time = v.require("pickup_time", request.pickup_time);
        let distance_km = request.distance_km.unwrap_or(0.0);
        v.non_negative("distance_km", distance_km);
        v.finish()?;

        let (
            Some(customer_phone),
            Some(vehicle_class),
            Some(booking_type),
            Some(pickup_location),
            Some(dropoff_location),
            Some(pickup_time),
        ) = (
            customer_phone,
            vehicle_class,
            booking_type,
            pickup_location,
            dropoff_location,
            pickup_time,
        )
        else {
            return Err(DispatchError::internal_error("validated booking fields missing"));
        };

        let customer_phone = self.composer.normalize_phone(&customer_phone)?;
        let mut driver = match request.driver_id.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(driver_id) => Some(self.load_assignable_driver(driver_id).await?),
            None => None,
        };

        let now = self.clock.now();
        let mut batch = WriteBatch::new();

        let customer_id = match self.store.get_customer_by_phone(&customer_phone).await? {
            Some(customer) => customer.id,
            None => {
                let customer =
                    walk_in_customer(customer_phone.clone(), pickup_location.address.clone(), now);
                tracing::info!("Provisioning walk-in customer {} for {}", customer.id, customer_phone);
                let id = customer.id.clone();
                batch.push(customer);
                id
            }
        };

        let booking_code = self.codes.next_code(CodeKind::Booking, now).await?;

        let mut booking = Booking {
            id: IdGenerator::generate_with_timestamp(IdType::Booking, now),
            booking_code,
            customer_id,
            customer_phone,
            driver_id: None,
            vehicle_class,
            booking_type,
            pickup_location,
            dropoff_location,
            pickup_time,
            ac_required: request.ac_required.unwrap_or_else(default_ac_required),
            distance_km,
            duration_minutes: None,
            special_requests: request.special_requests.filter(|s| !s.trim().is_empty()),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: request.payment_method.unwrap_or_default(),
            fare: None,
            invoice_code: None,
            notes: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            updated_at: now,
            version: 0,
        };

        if let Some(driver) = driver.as_mut() {
            booking.status = booking.status.apply(BookingAction::Assign)?;
            booking.driver_id = Some(driver.id.clone());
            driver.status = DriverStatus::OnTrip;
            driver.touch(now);
            batch.push(driver.clone());
        }

        booking.touch(now);
        batch.push(booking.clone());
        self.store.commit(batch).await?;

        tracing::info!(
            "Booking created: {} ({}) status {}",
            booking.booking_code,
            booking.id,
            booking.status
        );

        let notifications = match driver.as_ref() {
            Some(driver) => self.notify_assignment(&booking, driver).await,
            None => None,
        };

        Ok(BookingResponse {
            booking,
            notifications,
        })
    }

    async fn get_booking(&self, booking_id: &str) -> DispatchResult<Booking> {
        tracing::debug!("Getting booking: {}", booking_id);
        self.load_booking(booking_id).await
    }

    async fn list_bookings(&self, filter: BookingFilter, page: PageRequest) -> DispatchResult<Paginated<Booking>> {
        let mut bookings: Vec<Booking> = self
            .store
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Paginated::from_sorted(bookings, page))
    }

    async fn assign_driver(&self, booking_id: &str, request: AssignDriverRequest) -> DispatchResult<AssignmentResponse> {
        let mut booking = self.load_booking(booking_id).await?;
        let mut driver = self.load_driver(request.driver_id.trim()).await?;

        let next = booking.status.apply(BookingAction::Assign)?;
        if !driver.status.is_assignable() {
            return Err(DispatchError::DriverUnavailable {
                driver_id: driver.id,
                status: driver.status.to_string(),
            });
        }

        let now = self.clock.now();
        booking.status = next;
        booking.driver_id = Some(driver.id.clone());
        booking.touch(now);
        driver.status = DriverStatus::OnTrip;
        driver.touch(now);

        self.store
            .commit(WriteBatch::new().put(booking.clone()).put(driver.clone()))
            .await?;

        tracing::info!("Driver {} assigned to booking {}", driver.id, booking.booking_code);

        let notifications = self.notify_assignment(&booking, &driver).await;
        Ok(AssignmentResponse {
            booking,
            driver,
            notifications,
        })
    }

    async fn start_trip(&self, booking_id: &str) -> DispatchResult<StartTripResponse> {
        let mut booking = self.load_booking(booking_id).await?;
        let next = booking.status.apply(BookingAction::Start)?;
        let driver_id = Self::assigned_driver_id(&booking)?.to_string();

        if let Some(open) = self.store.find_active_trip(&booking.id).await? {
            return Err(DispatchError::Conflict(format!(
                "Booking {} already has an active trip {}",
                booking.booking_code, open.id
            )));
        }

        let now = self.clock.now();
        let mut trip = Trip {
            id: IdGenerator::generate_with_timestamp(IdType::Trip, now),
            booking_id: booking.id.clone(),
            driver_id,
            customer_id: booking.customer_id.clone(),
            start_time: now,
            end_time: None,
            start_location: booking.pickup_location.clone(),
            end_location: None,
            actual_distance_km: None,
            actual_duration_minutes: None,
            status: TripStatus::Active,
            fare: None,
            route: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        trip.touch(now);

        booking.status = next;
        booking.started_at = Some(now);
        booking.touch(now);

        self.store
            .commit(WriteBatch::new().put(booking.clone()).put(trip.clone()))
            .await?;

        tracing::info!("Trip {} started for booking {}", trip.id, booking.booking_code);
        Ok(StartTripResponse { booking, trip })
    }

    async fn complete_booking(&self, booking_id: &str, request: CompleteBookingRequest) -> DispatchResult<CompletionResponse> {
        let mut v = Validator::new();
        let actual_distance = v.require("actual_distance_km", request.actual_distance_km);
        if let Some(distance) = actual_distance {
            v.non_negative("actual_distance_km", distance);
        }
        if let Some(duration) = request.duration_minutes {
            v.non_negative("duration_minutes", duration);
        }
        v.finish()?;
        let actual_distance = actual_distance.unwrap_or_default();

        let mut booking = self.load_booking(booking_id).await?;
        let next = booking.status.apply(BookingAction::Complete)?;
        let mut driver = self.load_driver(Self::assigned_driver_id(&booking)?).await?;

        let fare = self.fares.calculate(&FareRequest {
            booking_type: booking.booking_type,
            vehicle_class: booking.vehicle_class,
            distance_km: actual_distance,
            duration_minutes: request.duration_minutes.unwrap_or(0.0),
            ac_required: booking.ac_required,
            day_halt_count: request.day_halt_count,
            night_halt_count: request.night_halt_count,
        })?;

        let now = self.clock.now();
        let invoice_code = self.codes.next_code(CodeKind::Invoice, now).await?;
        let mut batch = WriteBatch::new();

        booking.status = next;
        booking.fare = Some(fare.clone());
        booking.payment_status = PaymentStatus::Collected;
        booking.distance_km = actual_distance;
        booking.duration_minutes = request.duration_minutes;
        booking.completed_at = Some(now);
        booking.invoice_code = Some(invoice_code.clone());
        booking.touch(now);
        batch.push(booking.clone());

        let trip = match self.store.find_active_trip(&booking.id).await? {
            Some(mut trip) => {
                trip.end_time = Some(now);
                trip.end_location = Some(booking.dropoff_location.clone());
                trip.actual_distance_km = Some(actual_distance);
                trip.actual_duration_minutes = request.duration_minutes;
                trip.fare = Some(fare.clone());
                trip.status = TripStatus::Completed;
                trip.touch(now);
                batch.push(trip.clone());
                Some(trip)
            }
            None => None,
        };

        driver.status = DriverStatus::Active;
        driver.total_trips += 1;
        driver.total_earnings += fare.total;
        driver.touch(now);
        batch.push(driver.clone());

        match self.store.get_customer(&booking.customer_id).await? {
            Some(mut customer) => {
                customer.total_trips += 1;
                customer.total_spent += fare.total;
                customer.touch(now);
                batch.push(customer);
            }
            None => tracing::warn!(
                "Customer {} of booking {} not found, skipping totals",
                booking.customer_id,
                booking.booking_code
            ),
        }

        self.store.commit(batch).await?;

        tracing::info!(
            "Booking {} completed by driver {}: {} km, total {}",
            booking.booking_code,
            driver.id,
            actual_distance,
            fare.total
        );

        let invoice = Invoice {
            invoice_code,
            booking_code: booking.booking_code.clone(),
            distance_km: actual_distance,
            fare,
            issued_at: now,
        };
        let notification = self.notify_invoice(&booking, &invoice).await;

        Ok(CompletionResponse {
            booking,
            trip,
            invoice,
            notification,
        })
    }

    async fn cancel_booking(&self, booking_id: &str, request: CancelBookingRequest) -> DispatchResult<BookingResponse> {
        let mut booking = self.load_booking(booking_id).await?;
        let next = booking.status.apply(BookingAction::Cancel)?;

        let now = self.clock.now();
        let mut batch = WriteBatch::new();

        if let Some(driver_id) = booking.driver_id.take() {
            match self.store.get_driver(&driver_id).await? {
                Some(mut driver) if driver.status == DriverStatus::OnTrip => {
                    driver.status = DriverStatus::Active;
                    driver.touch(now);
                    batch.push(driver);
                }
                Some(_) => {}
                None => tracing::warn!(
                    "Driver {} of booking {} not found while cancelling",
                    driver_id,
                    booking.booking_code
                ),
            }
        }

        booking.status = next;
        booking.notes = request.reason.filter(|r| !r.trim().is_empty());
        booking.cancelled_at = Some(now);
        booking.touch(now);
        batch.push(booking.clone());

        self.store.commit(batch).await?;

        tracing::info!("Booking {} cancelled", booking.booking_code);
        Ok(BookingResponse {
            booking,
            notifications: None,
        })
    }
}
