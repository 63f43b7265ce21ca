//! Route definitions for the Inverter Tracking Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - catalog
        .nest("/models", model_routes())
        .nest("/parts", part_routes())
        // Protected routes - parties
        .nest("/dealers", dealer_routes())
        .nest("/service-centers", service_center_routes())
        // Protected routes - units and lifecycle
        .nest("/units", unit_routes())
        .nest("/dispatches", unit_dispatch_routes())
        .nest("/transfers", transfer_routes())
        .nest("/sales", sale_routes())
        // Protected routes - spare-parts ledger
        .nest("/part-dispatches", part_dispatch_routes())
        .nest("/stock", stock_routes())
        // Protected routes - service workflow
        .nest("/service-jobs", service_job_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Inverter model catalog routes (protected)
fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_models).post(handlers::create_model))
        .route("/:model_id", get(handlers::get_model))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Part catalog routes (protected)
fn part_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_parts).post(handlers::create_part))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dealer management routes (protected)
fn dealer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_dealers).post(handlers::create_dealer))
        .route("/:dealer_id", get(handlers::get_dealer))
        .route(
            "/:dealer_id/sub-dealers",
            get(handlers::list_sub_dealers).post(handlers::create_sub_dealer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Service center management routes (protected)
fn service_center_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_service_centers).post(handlers::create_service_center),
        )
        .route("/:center_id", get(handlers::get_service_center))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Unit registration and lookup routes (protected)
fn unit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_units).post(handlers::register_unit))
        .route("/bulk", post(handlers::register_units_bulk))
        .route("/:serial_number", get(handlers::get_unit))
        .route("/:serial_number/lifecycle", get(handlers::get_unit_lifecycle))
        .route("/:serial_number/warranty", get(handlers::get_unit_warranty))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Factory-to-dealer unit dispatch routes (protected)
fn unit_dispatch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_unit_dispatches).post(handlers::create_unit_dispatch),
        )
        .route("/:dispatch_id", get(handlers::get_unit_dispatch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dealer-to-sub-dealer transfer routes (protected)
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_unit_transfers).post(handlers::create_unit_transfer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Customer sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::record_sale))
        .route("/bulk", post(handlers::record_sales_bulk))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Spare-part dispatch routes (protected)
fn part_dispatch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_part_dispatches).post(handlers::create_part_dispatch),
        )
        .route("/:dispatch_id", get(handlers::get_part_dispatch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Derived stock routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/:center_id", get(handlers::get_center_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Service job routes (protected)
fn service_job_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_service_jobs).post(handlers::create_service_job),
        )
        .route("/:job_id", get(handlers::get_service_job))
        .route(
            "/:job_id/replaced-parts",
            get(handlers::list_job_replaced_parts).post(handlers::add_replaced_part),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
