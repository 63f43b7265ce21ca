//! HTTP handlers for the Inverter Tracking Platform

pub mod auth;
pub mod catalog;
pub mod dealer;
pub mod health;
pub mod ownership;
pub mod parts;
pub mod service_job;
pub mod unit;

pub use auth::*;
pub use catalog::*;
pub use dealer::*;
pub use health::*;
pub use ownership::*;
pub use parts::*;
pub use service_job::*;
pub use unit::*;
