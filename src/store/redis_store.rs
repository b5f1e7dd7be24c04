// src/store/redis_store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::{DispatchError, DispatchResult};
use crate::models::{Booking, Customer, Driver, Trip, TripStatus};
use crate::store::{Document, Store, Write, WriteBatch, phone_index_key};
use crate::utils::codes::{CodeGenerator, CodeKind, format_code};

pub struct RedisKeys;

impl RedisKeys {
    pub fn document(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    pub fn ids(collection: &str) -> String {
        format!("{}:ids", collection)
    }

    pub fn customer_phone(phone: &str) -> String {
        format!("customer:phone:{}", phone_index_key(phone))
    }

    pub fn active_trip(booking_id: &str) -> String {
        format!("trip:active:{}", booking_id)
    }

    pub fn sequence(kind: CodeKind, at: DateTime<Utc>) -> String {
        format!("seq:{}:{}", kind.key_segment(), at.format("%Y%m%d"))
    }
}

#[derive(Deserialize)]
struct Versioned {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    phone: Option<String>,
}

impl Versioned {
    /// Index key left behind when a stored customer moves to a new phone.
    fn stale_phone_key(&self, customer: &Customer) -> Option<String> {
        let current = RedisKeys::customer_phone(&customer.phone);
        self.phone
            .as_deref()
            .map(RedisKeys::customer_phone)
            .filter(|previous| *previous != current)
    }
}

/// Redis-backed store. Documents are JSON strings; commits use WATCH plus a
/// MULTI/EXEC pipeline so a concurrent writer aborts the transaction.
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> DispatchResult<Self> {
        let client = Client::open(redis_url)?;
        let store = Self { client };

        let mut conn = store.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Connected to Redis at {}", redis_url);

        Ok(store)
    }

    async fn connection(&self) -> DispatchResult<redis::aio::Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    async fn get_document<T: DeserializeOwned>(&self, key: &str) -> DispatchResult<Option<T>> {
        let mut conn = self.connection().await?;
        let data: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_by_id<T: Document + DeserializeOwned>(&self, id: &str) -> DispatchResult<Option<T>> {
        self.get_document(&RedisKeys::document(T::COLLECTION, id)).await
    }

    async fn list_collection<T: Document + DeserializeOwned>(&self) -> DispatchResult<Vec<T>> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = redis::cmd("SMEMBERS")
            .arg(RedisKeys::ids(T::COLLECTION))
            .query_async(&mut conn)
            .await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| RedisKeys::document(T::COLLECTION, id))
            .collect();
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        values
            .into_iter()
            .flatten()
            .map(|json| serde_json::from_str(&json).map_err(DispatchError::from))
            .collect()
    }

    async fn unwatch(conn: &mut redis::aio::Connection) -> DispatchResult<()> {
        let _: () = redis::cmd("UNWATCH").query_async(conn).await?;
        Ok(())
    }

    fn conflict(write: &Write) -> DispatchError {
        DispatchError::Conflict(format!(
            "{} {} was modified concurrently",
            write.collection(),
            write.id()
        ))
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get_booking(&self, id: &str) -> DispatchResult<Option<Booking>> {
        self.get_by_id(id).await
    }

    async fn get_driver(&self, id: &str) -> DispatchResult<Option<Driver>> {
        self.get_by_id(id).await
    }

    async fn get_customer(&self, id: &str) -> DispatchResult<Option<Customer>> {
        self.get_by_id(id).await
    }

    async fn get_trip(&self, id: &str) -> DispatchResult<Option<Trip>> {
        self.get_by_id(id).await
    }

    async fn get_customer_by_phone(&self, phone: &str) -> DispatchResult<Option<Customer>> {
        let mut conn = self.connection().await?;
        let id: Option<String> = redis::cmd("GET")
            .arg(RedisKeys::customer_phone(phone))
            .query_async(&mut conn)
            .await?;

        match id {
            Some(id) => self.get_customer(&id).await,
            None => Ok(None),
        }
    }

    async fn find_active_trip(&self, booking_id: &str) -> DispatchResult<Option<Trip>> {
        let mut conn = self.connection().await?;
        let id: Option<String> = redis::cmd("GET")
            .arg(RedisKeys::active_trip(booking_id))
            .query_async(&mut conn)
            .await?;

        match id {
            Some(id) => Ok(self
                .get_trip(&id)
                .await?
                .filter(|trip| trip.status == TripStatus::Active)),
            None => Ok(None),
        }
    }

    async fn list_bookings(&self) -> DispatchResult<Vec<Booking>> {
        self.list_collection().await
    }

    async fn list_drivers(&self) -> DispatchResult<Vec<Driver>> {
        self.list_collection().await
    }

    async fn list_customers(&self) -> DispatchResult<Vec<Customer>> {
        self.list_collection().await
    }

    async fn list_trips(&self) -> DispatchResult<Vec<Trip>> {
        self.list_collection().await
    }

    async fn commit(&self, batch: WriteBatch) -> DispatchResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let writes = batch.writes();
        let keys: Vec<String> = writes
            .iter()
            .map(|w| RedisKeys::document(w.collection(), w.id()))
            .collect();
        let phone_keys: Vec<(String, &Customer)> = writes
            .iter()
            .filter_map(|w| match w {
                Write::Customer(c) => Some((RedisKeys::customer_phone(&c.phone), c)),
                _ => None,
            })
            .collect();

        let mut conn = self.connection().await?;

        let mut watch = redis::cmd("WATCH");
        watch.arg(&keys);
        for (key, _) in &phone_keys {
            watch.arg(key);
        }
        let _: () = watch.query_async(&mut conn).await?;

        let stored: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;
        let mut stale_phone_keys = Vec::new();
        for (write, current) in writes.iter().zip(stored) {
            let stored = match current {
                Some(json) => Some(serde_json::from_str::<Versioned>(&json)?),
                None => None,
            };
            let stored_version = stored.as_ref().map_or(0, |s| s.version);
            if write.version() != stored_version + 1 {
                Self::unwatch(&mut conn).await?;
                return Err(Self::conflict(write));
            }

            if let (Write::Customer(customer), Some(stored)) = (write, &stored) {
                if let Some(key) = stored.stale_phone_key(customer) {
                    stale_phone_keys.push((key, customer.id.as_str()));
                }
            }
        }

        if !stale_phone_keys.is_empty() {
            let mut watch = redis::cmd("WATCH");
            for (key, _) in &stale_phone_keys {
                watch.arg(key);
            }
            let _: () = watch.query_async(&mut conn).await?;
        }

        for (key, customer) in &phone_keys {
            let owner: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            if let Some(owner) = owner.filter(|owner| owner != &customer.id) {
                Self::unwatch(&mut conn).await?;
                return Err(DispatchError::Conflict(format!(
                    "phone {} already belongs to customer {}",
                    customer.phone, owner
                )));
            }
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, customer_id) in &stale_phone_keys {
            let owner: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            if owner.as_deref() == Some(*customer_id) {
                pipe.cmd("DEL").arg(key).ignore();
            }
        }
        for (write, key) in writes.iter().zip(&keys) {
            pipe.cmd("SET").arg(key).arg(write.to_json()?).ignore();
            pipe.cmd("SADD")
                .arg(RedisKeys::ids(write.collection()))
                .arg(write.id())
                .ignore();

            match write {
                Write::Customer(customer) => {
                    pipe.cmd("SET")
                        .arg(RedisKeys::customer_phone(&customer.phone))
                        .arg(&customer.id)
                        .ignore();
                }
                Write::Trip(trip) if trip.status == TripStatus::Active => {
                    pipe.cmd("SET")
                        .arg(RedisKeys::active_trip(&trip.booking_id))
                        .arg(&trip.id)
                        .ignore();
                }
                Write::Trip(trip) => {
                    pipe.cmd("DEL")
                        .arg(RedisKeys::active_trip(&trip.booking_id))
                        .ignore();
                }
                Write::Booking(_) | Write::Driver(_) => {}
            }
        }

        // EXEC replies nil when a watched key changed
        let result: Option<()> = pipe.query_async(&mut conn).await?;
        match result {
            Some(()) => Ok(()),
            None => {
                tracing::warn!("Redis transaction aborted for {} documents", writes.len());
                Err(DispatchError::Conflict(
                    "documents were modified concurrently".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl CodeGenerator for RedisStore {
    async fn next_code(&self, kind: CodeKind, at: DateTime<Utc>) -> DispatchResult<String> {
        let mut conn = self.connection().await?;
        let sequence: u64 = redis::cmd("INCR")
            .arg(RedisKeys::sequence(kind, at))
            .query_async(&mut conn)
            .await?;

        Ok(format_code(kind, at.date_naive(), sequence))
    }
}
