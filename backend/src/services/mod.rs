//! Business logic services for the Inverter Tracking Platform

pub mod auth;
pub mod catalog;
pub mod dealer;
pub mod ownership;
pub mod parts;
pub mod service_job;
pub mod unit;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use dealer::DealerService;
pub use ownership::OwnershipService;
pub use parts::PartsService;
pub use service_job::ServiceJobService;
pub use unit::UnitService;
