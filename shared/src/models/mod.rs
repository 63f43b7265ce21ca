//! Domain models for the Inverter Tracking Platform

pub mod catalog;
pub mod dealer;
pub mod dispatch;
pub mod service;
pub mod unit;

pub use catalog::*;
pub use dealer::*;
pub use dispatch::*;
pub use service::*;
pub use unit::*;
