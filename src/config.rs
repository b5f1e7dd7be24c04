// src/config.rs
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::DispatchResult;
use crate::models::fare::Tariff;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub redis_url: Option<String>, // In-memory store when unset
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub tariff: Tariff,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub whatsapp_base_url: String,
    pub country_code: String,
    pub brand_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            whatsapp_base_url: "https://wa.me".to_string(),
            country_code: "91".to_string(),
            brand_name: "Mobile Track Taxi".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            redis_url: None,
            frontend_url: default_frontend_url(),
            log_level: default_log_level(),
            log_json: false,
            notifications: NotificationConfig::default(),
            tariff: Tariff::default(),
        }
    }
}

fn default_port() -> u16 {
    5000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Reads `.env`, an optional `configuration.{toml,yaml,json}` file and
    /// `DISPATCH_*` variables, later sources winning. Nested keys use `__`,
    /// e.g. `DISPATCH_NOTIFICATIONS__BRAND_NAME`.
    pub fn load() -> DispatchResult<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                Environment::with_prefix("DISPATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_source() {
        let config: AppConfig = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.notifications.whatsapp_base_url, "https://wa.me");
        assert_eq!(config.tariff, Tariff::default());
    }

    #[test]
    fn test_overrides_are_layered() {
        let config: AppConfig = Config::builder()
            .set_override("port", 8080)
            .unwrap()
            .set_override("notifications.brand_name", "City Cabs")
            .unwrap()
            .set_override("tariff.outstation.driver_batta", 650.0)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.notifications.brand_name, "City Cabs");
        assert_eq!(config.notifications.country_code, "91");
        assert_eq!(config.tariff.outstation.driver_batta, 650.0);
        assert_eq!(config.tariff.local, Default::default());
    }
}
