// src/store/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DispatchResult;
use crate::models::{Booking, Customer, Driver, Trip};

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// A stored entity with an optimistic-concurrency version.
pub trait Document {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn version(&self) -> u64;

    /// Bumps the version and stamps `updated_at`. Call once per write.
    fn touch(&mut self, now: DateTime<Utc>);
}

macro_rules! impl_document {
    ($($ty:ty => $collection:literal),* $(,)?) => {
        $(
            impl Document for $ty {
                const COLLECTION: &'static str = $collection;

                fn id(&self) -> &str {
                    &self.id
                }

                fn version(&self) -> u64 {
                    self.version
                }

                fn touch(&mut self, now: DateTime<Utc>) {
                    self.version += 1;
                    self.updated_at = now;
                }
            }
        )*
    };
}

impl_document!(
    Booking => "booking",
    Driver => "driver",
    Customer => "customer",
    Trip => "trip",
);

/// One document in a batch, already touched by the caller.
#[derive(Debug, Clone)]
pub enum Write {
    Booking(Booking),
    Driver(Driver),
    Customer(Customer),
    Trip(Trip),
}

impl Write {
    pub fn collection(&self) -> &'static str {
        match self {
            Write::Booking(_) => Booking::COLLECTION,
            Write::Driver(_) => Driver::COLLECTION,
            Write::Customer(_) => Customer::COLLECTION,
            Write::Trip(_) => Trip::COLLECTION,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Write::Booking(b) => b.id(),
            Write::Driver(d) => d.id(),
            Write::Customer(c) => c.id(),
            Write::Trip(t) => t.id(),
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Write::Booking(b) => b.version(),
            Write::Driver(d) => d.version(),
            Write::Customer(c) => c.version(),
            Write::Trip(t) => t.version(),
        }
    }

    pub fn to_json(&self) -> DispatchResult<String> {
        let json = match self {
            Write::Booking(b) => serde_json::to_string(b)?,
            Write::Driver(d) => serde_json::to_string(d)?,
            Write::Customer(c) => serde_json::to_string(c)?,
            Write::Trip(t) => serde_json::to_string(t)?,
        };
        Ok(json)
    }

    /// Writes with version 1 create the document.
    pub fn is_insert(&self) -> bool {
        self.version() == 1
    }
}

impl From<Booking> for Write {
    fn from(booking: Booking) -> Self {
        Write::Booking(booking)
    }
}

impl From<Driver> for Write {
    fn from(driver: Driver) -> Self {
        Write::Driver(driver)
    }
}

impl From<Customer> for Write {
    fn from(customer: Customer) -> Self {
        Write::Customer(customer)
    }
}

impl From<Trip> for Write {
    fn from(trip: Trip) -> Self {
        Write::Trip(trip)
    }
}

/// Documents committed together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, doc: impl Into<Write>) -> Self {
        self.writes.push(doc.into());
        self
    }

    pub fn push(&mut self, doc: impl Into<Write>) {
        self.writes.push(doc.into());
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Digits-only key under which a customer phone is indexed.
pub fn phone_index_key(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Persistence seam. Reads return `None` for unknown ids; `commit` applies a
/// batch only if every document's version is exactly one past the stored one
/// (absent documents count as version 0), otherwise `Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_booking(&self, id: &str) -> DispatchResult<Option<Booking>>;
    async fn get_driver(&self, id: &str) -> DispatchResult<Option<Driver>>;
    async fn get_customer(&self, id: &str) -> DispatchResult<Option<Customer>>;
    async fn get_trip(&self, id: &str) -> DispatchResult<Option<Trip>>;

    async fn get_customer_by_phone(&self, phone: &str) -> DispatchResult<Option<Customer>>;
    async fn find_active_trip(&self, booking_id: &str) -> DispatchResult<Option<Trip>>;

    async fn list_bookings(&self) -> DispatchResult<Vec<Booking>>;
    async fn list_drivers(&self) -> DispatchResult<Vec<Driver>>;
    async fn list_customers(&self) -> DispatchResult<Vec<Customer>>;
    async fn list_trips(&self) -> DispatchResult<Vec<Trip>>;

    async fn commit(&self, batch: WriteBatch) -> DispatchResult<()>;
}
