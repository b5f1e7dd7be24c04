pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use errors::{DispatchError, DispatchResult, ValidationError};
pub use state::AppState;
