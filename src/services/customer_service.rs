// src/services/customer_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    errors::{DispatchError, DispatchResult, Validator},
    models::{
        booking::BookingStatus,
        customer::{
            Customer, CustomerRegistration, CustomerStats, CustomerStatus, CustomerStatusUpdate,
            CustomerUpdate, WALK_IN_CUSTOMER_NAME,
        },
        page::{PageRequest, Paginated},
    },
    services::notification_service::NotificationComposer,
    store::{Document, Store, WriteBatch},
    utils::{
        clock::Clock,
        id_generator::{IdGenerator, IdType},
    },
};

#[async_trait]
pub trait CustomerOperations: Send + Sync {
    async fn create_customer(&self, registration: CustomerRegistration) -> DispatchResult<Customer>;
    async fn get_customer(&self, customer_id: &str) -> DispatchResult<Customer>;
    async fn get_customer_by_phone(&self, phone: &str) -> DispatchResult<Customer>;
    async fn list_customers(&self, page: PageRequest) -> DispatchResult<Paginated<Customer>>;
    async fn update_customer(&self, customer_id: &str, update: CustomerUpdate) -> DispatchResult<Customer>;
    async fn update_customer_status(&self, customer_id: &str, update: CustomerStatusUpdate) -> DispatchResult<Customer>;
    async fn customer_stats(&self, customer_id: &str) -> DispatchResult<CustomerStats>;
}

pub struct CustomerService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    composer: NotificationComposer,
}

impl CustomerService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, composer: NotificationComposer) -> Self {
        Self {
            store,
            clock,
            composer,
        }
    }
}

/// Unsaved customer record at version 1. `phone` must already be normalized.
pub(crate) fn new_customer(
    name: String,
    phone: String,
    address: String,
    now: DateTime<Utc>,
) -> Customer {
    let mut customer = Customer {
        id: IdGenerator::generate_with_timestamp(IdType::Customer, now),
        name,
        phone,
        email: None,
        address,
        city: None,
        status: CustomerStatus::Active,
        total_trips: 0,
        total_spent: 0.0,
        notes: None,
        created_at: now,
        updated_at: now,
        version: 0,
    };
    customer.touch(now);
    customer
}

/// Customer auto-provisioned from a booking's phone number.
pub(crate) fn walk_in_customer(phone: String, pickup_address: String, now: DateTime<Utc>) -> Customer {
    new_customer(WALK_IN_CUSTOMER_NAME.to_string(), phone, pickup_address, now)
}

#[async_trait]
impl CustomerOperations for CustomerService {
    async fn create_customer(&self, registration: CustomerRegistration) -> DispatchResult<Customer> {
        let mut v = Validator::new();
        let name = v.require_text("name", registration.name);
        let phone = v.require_text("phone", registration.phone);
        v.finish()?;

        let name = name.unwrap_or_default();
        let phone = self.composer.normalize_phone(&phone.unwrap_or_default())?;
        if let Some(existing) = self.store.get_customer_by_phone(&phone).await? {
            return Err(DispatchError::Conflict(format!(
                "Customer with phone {} already exists: {}",
                phone, existing.id
            )));
        }

        let now = self.clock.now();
        let mut customer = new_customer(
            name,
            phone,
            registration.address.unwrap_or_default().trim().to_string(),
            now,
        );
        customer.email = registration.email.filter(|e| !e.trim().is_empty());
        customer.city = registration.city;
        customer.notes = registration.notes;

        self.store.commit(WriteBatch::new().put(customer.clone())).await?;

        tracing::info!("Customer created: {} ({})", customer.id, customer.phone);
        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> DispatchResult<Customer> {
        tracing::debug!("Getting customer: {}", customer_id);

        self.store
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| DispatchError::CustomerNotFound(customer_id.to_string()))
    }

    async fn get_customer_by_phone(&self, phone: &str) -> DispatchResult<Customer> {
        let normalized = self.composer.normalize_phone(phone)?;

        self.store
            .get_customer_by_phone(&normalized)
            .await?
            .ok_or_else(|| DispatchError::CustomerNotFound(phone.to_string()))
    }

    async fn list_customers(&self, page: PageRequest) -> DispatchResult<Paginated<Customer>> {
        let mut customers = self.store.list_customers().await?;
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Paginated::from_sorted(customers, page))
    }

    async fn update_customer(&self, customer_id: &str, update: CustomerUpdate) -> DispatchResult<Customer> {
        let mut customer = self.get_customer(customer_id).await?;

        let mut v = Validator::new();
        for (field, value) in [("name", &update.name), ("phone", &update.phone)] {
            if value.as_deref().is_some_and(|s| s.trim().is_empty()) {
                v.add(field, "must not be empty");
            }
        }
        v.finish()?;

        if let Some(phone) = update.phone {
            let phone = self.composer.normalize_phone(&phone)?;
            if let Some(owner) = self.store.get_customer_by_phone(&phone).await? {
                if owner.id != customer.id {
                    return Err(DispatchError::Conflict(format!(
                        "Customer with phone {} already exists: {}",
                        phone, owner.id
                    )));
                }
            }
            customer.phone = phone;
        }
        if let Some(name) = update.name {
            customer.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            customer.email = Some(email.trim().to_string()).filter(|e| !e.is_empty());
        }
        if let Some(address) = update.address {
            customer.address = address.trim().to_string();
        }
        customer.city = update.city.or(customer.city);
        customer.notes = update.notes.or(customer.notes);

        customer.touch(self.clock.now());
        self.store.commit(WriteBatch::new().put(customer.clone())).await?;

        tracing::info!("Customer profile updated: {}", customer.id);
        Ok(customer)
    }

    async fn update_customer_status(&self, customer_id: &str, update: CustomerStatusUpdate) -> DispatchResult<Customer> {
        let mut customer = self.get_customer(customer_id).await?;

        if customer.status == update.status {
            return Ok(customer);
        }

        tracing::info!(
            "Updating customer status: {} from {} to {}",
            customer.id,
            customer.status,
            update.status
        );

        customer.status = update.status;
        customer.touch(self.clock.now());
        self.store.commit(WriteBatch::new().put(customer.clone())).await?;

        Ok(customer)
    }

    async fn customer_stats(&self, customer_id: &str) -> DispatchResult<CustomerStats> {
        let customer = self.get_customer(customer_id).await?;
        let bookings: Vec<_> = self
            .store
            .list_bookings()
            .await?
            .into_iter()
            .filter(|b| b.customer_id == customer.id)
            .collect();

        let fares: Vec<f64> = bookings.iter().filter_map(|b| b.fare.as_ref()).map(|f| f.total).collect();
        let total_spent: f64 = fares.iter().sum();

        Ok(CustomerStats {
            total_bookings: bookings.len() as u64,
            completed_bookings: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Completed)
                .count() as u64,
            total_spent,
            avg_fare: if fares.is_empty() {
                0.0
            } else {
                total_spent / fares.len() as f64
            },
        })
    }
}
