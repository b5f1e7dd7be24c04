// src/services/location_relay.rs
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    errors::{DispatchResult, Validator},
    models::driver::DriverLocationUpdate,
};

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of live driver positions. Nothing is stored; subscribers that fall
/// behind skip the updates they missed.
#[derive(Debug, Clone)]
pub struct LocationRelay {
    sender: broadcast::Sender<DriverLocationUpdate>,
}

impl Default for LocationRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LocationRelay {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers received the update.
    pub fn publish(&self, update: DriverLocationUpdate) -> DispatchResult<usize> {
        let mut v = Validator::new();
        if update.driver_id.trim().is_empty() {
            v.add("driver_id", "is required");
        }
        if !(-90.0..=90.0).contains(&update.latitude) {
            v.add("latitude", "must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&update.longitude) {
            v.add("longitude", "must be between -180 and 180");
        }
        v.finish()?;

        tracing::debug!(
            "Relaying location of {}: {}, {}",
            update.driver_id,
            update.latitude,
            update.longitude
        );

        // No receivers is not an error
        Ok(self.sender.send(update).unwrap_or(0))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DriverLocationUpdate> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn stream(&self) -> impl Stream<Item = DriverLocationUpdate> + Send + use<> {
        stream::unfold(self.subscribe(), |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(update) => return Some((update, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Location subscriber lagged, skipped {} updates", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    fn update(driver_id: &str, latitude: f64) -> DriverLocationUpdate {
        DriverLocationUpdate {
            driver_id: driver_id.to_string(),
            latitude,
            longitude: 80.27,
            heading: None,
            speed: Some(32.0),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let relay = LocationRelay::default();
        let mut stream = Box::pin(relay.stream());

        assert_eq!(relay.publish(update("drv-1", 13.08)).unwrap(), 1);
        let received = stream.next().await.unwrap();
        assert_eq!(received.driver_id, "drv-1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let relay = LocationRelay::default();
        assert_eq!(relay.publish(update("drv-1", 13.08)).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_ahead() {
        let relay = LocationRelay::new(2);
        let mut stream = Box::pin(relay.stream());

        for i in 0..5 {
            relay.publish(update("drv-1", f64::from(i))).unwrap();
        }

        let first = stream.next().await.unwrap();
        assert_eq!(first.latitude, 3.0);
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let relay = LocationRelay::default();
        assert!(relay.publish(update("drv-1", 120.0)).is_err());
        assert!(relay.publish(update(" ", 10.0)).is_err());
    }
}
