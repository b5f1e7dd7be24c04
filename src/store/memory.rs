// src/store/memory.rs
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::{DispatchError, DispatchResult};
use crate::models::{Booking, Customer, Driver, Trip, TripStatus};
use crate::store::{Document, Store, Write, WriteBatch, phone_index_key};

#[derive(Debug, Default)]
struct Tables {
    bookings: HashMap<String, Booking>,
    drivers: HashMap<String, Driver>,
    customers: HashMap<String, Customer>,
    trips: HashMap<String, Trip>,
    customer_phones: HashMap<String, String>, // phone key -> customer id
}

impl Tables {
    fn stored_version(&self, write: &Write) -> Option<u64> {
        let id = write.id();
        match write {
            Write::Booking(_) => self.bookings.get(id).map(Document::version),
            Write::Driver(_) => self.drivers.get(id).map(Document::version),
            Write::Customer(_) => self.customers.get(id).map(Document::version),
            Write::Trip(_) => self.trips.get(id).map(Document::version),
        }
    }

    fn check(&self, write: &Write) -> DispatchResult<()> {
        let expected = self.stored_version(write).unwrap_or(0) + 1;
        if write.version() != expected {
            return Err(DispatchError::Conflict(format!(
                "{} {} was modified concurrently",
                write.collection(),
                write.id()
            )));
        }

        if let Write::Customer(customer) = write {
            let key = phone_index_key(&customer.phone);
            if let Some(owner) = self.customer_phones.get(&key) {
                if owner != &customer.id {
                    return Err(DispatchError::Conflict(format!(
                        "phone {} already belongs to customer {}",
                        customer.phone, owner
                    )));
                }
            }
        }

        Ok(())
    }

    fn apply(&mut self, write: Write) {
        match write {
            Write::Booking(booking) => {
                self.bookings.insert(booking.id.clone(), booking);
            }
            Write::Driver(driver) => {
                self.drivers.insert(driver.id.clone(), driver);
            }
            Write::Customer(customer) => {
                if let Some(previous) = self.customers.get(&customer.id) {
                    let old_key = phone_index_key(&previous.phone);
                    self.customer_phones.remove(&old_key);
                }
                self.customer_phones
                    .insert(phone_index_key(&customer.phone), customer.id.clone());
                self.customers.insert(customer.id.clone(), customer);
            }
            Write::Trip(trip) => {
                self.trips.insert(trip.id.clone(), trip);
            }
        }
    }
}

/// In-process store. Every commit validates and applies under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_booking(&self, id: &str) -> DispatchResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(id).cloned())
    }

    async fn get_driver(&self, id: &str) -> DispatchResult<Option<Driver>> {
        Ok(self.tables.read().await.drivers.get(id).cloned())
    }

    async fn get_customer(&self, id: &str) -> DispatchResult<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(id).cloned())
    }

    async fn get_trip(&self, id: &str) -> DispatchResult<Option<Trip>> {
        Ok(self.tables.read().await.trips.get(id).cloned())
    }

    async fn get_customer_by_phone(&self, phone: &str) -> DispatchResult<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customer_phones
            .get(&phone_index_key(phone))
            .and_then(|id| tables.customers.get(id))
            .cloned())
    }

    async fn find_active_trip(&self, booking_id: &str) -> DispatchResult<Option<Trip>> {
        let tables = self.tables.read().await;
        Ok(tables
            .trips
            .values()
            .find(|t| t.booking_id == booking_id && t.status == TripStatus::Active)
            .cloned())
    }

    async fn list_bookings(&self) -> DispatchResult<Vec<Booking>> {
        Ok(self.tables.read().await.bookings.values().cloned().collect())
    }

    async fn list_drivers(&self) -> DispatchResult<Vec<Driver>> {
        Ok(self.tables.read().await.drivers.values().cloned().collect())
    }

    async fn list_customers(&self) -> DispatchResult<Vec<Customer>> {
        Ok(self.tables.read().await.customers.values().cloned().collect())
    }

    async fn list_trips(&self) -> DispatchResult<Vec<Trip>> {
        Ok(self.tables.read().await.trips.values().cloned().collect())
    }

    async fn commit(&self, batch: WriteBatch) -> DispatchResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tables = self.tables.write().await;
        for write in batch.writes() {
            tables.check(write)?;
        }
        for write in batch.into_writes() {
            tables.apply(write);
        }

        Ok(())
    }
}
