//! Shared types and domain logic for the Inverter Tracking Platform
//!
//! This crate contains the data model and the pure rules of the inventory
//! lifecycle: custody transition guards, warranty computation, and stock
//! derivation. Everything here is free of I/O so the invariants can be
//! tested without a database.

pub mod lifecycle;
pub mod models;
pub mod stock;
pub mod types;
pub mod validation;
pub mod warranty;

pub use models::*;
pub use types::*;
