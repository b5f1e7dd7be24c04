// src/models/mod.rs
pub mod booking;
pub mod customer;
pub mod dashboard;
pub mod driver;
pub mod fare;
pub mod messages;
pub mod page;
pub mod trip;

pub use booking::*;
pub use customer::*;
pub use dashboard::*;
pub use driver::*;
pub use fare::*;
pub use messages::*;
pub use page::*;
pub use trip::*;
