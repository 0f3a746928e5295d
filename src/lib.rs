//! Granite Gate-Pass API Library
//!
//! Backend service for a granite export company: quarried block stock,
//! derived volumetric/tonnage metrics, gate-pass invoicing, and role-gated
//! reference-data management.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod derivation;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use sea_orm::DatabaseConnection;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::AuthService;
use crate::events::EventSender;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub blocks: services::blocks::BlockService,
    pub invoices: services::invoices::InvoiceService,
    pub clients: services::clients::ClientService,
    pub reports: services::reports::ReportService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                token_expiration: Duration::from_secs(config.jwt_expiration_secs),
            },
            db.clone(),
        ));
        Self {
            blocks: services::blocks::BlockService::new(db.clone(), event_sender.clone()),
            invoices: services::invoices::InvoiceService::new(db.clone(), event_sender.clone()),
            clients: services::clients::ClientService::new(db.clone(), event_sender),
            reports: services::reports::ReportService::new(db.clone()),
            auth,
            db,
            config,
        }
    }
}

/// Assemble the full application router. Everything under `/api/v1` except
/// login sits behind the bearer-token middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/blocks", handlers::blocks::block_routes())
        .nest("/invoices", handlers::invoices::invoice_routes())
        .nest("/clients", handlers::clients::client_routes())
        .nest("/reports", handlers::reports::report_routes())
        .nest("/users", handlers::users::user_routes())
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::auth_middleware,
        ));

    let cors = cors_layer(&state.config);
    let timeout = TimeoutLayer::new(Duration::from_secs(state.config.request_timeout_secs));

    Router::new()
        .nest("/api/v1/auth", handlers::auth::auth_routes())
        .nest("/api/v1", protected)
        .nest("/health", handlers::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(timeout)
        .layer(cors)
        .with_state(state)
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    match cfg
        .cors_allowed_origins
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        Some(origins) => {
            let origins: Vec<http::HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}
