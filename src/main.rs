//! Trainee Onboarding Backend
//!
//! REST backend tracking depot trainees through their 14-day training
//! periods, with SQLite persistence.

mod api;
mod auth;
mod calendar;
mod codec;
mod config;
mod db;
mod errors;
mod models;
mod report;
mod workflow;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{AuthProvider, StaticCredentials};
use config::Config;
use db::Repository;
use workflow::SelectionSessions;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub auth: Arc<dyn AuthProvider>,
    pub selections: Arc<SelectionSessions>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Repository, config: Config) -> Self {
        let auth = StaticCredentials::new(config.credentials.clone());
        if auth.is_empty() {
            tracing::warn!("No operator credentials configured (ONBOARDING_CREDENTIALS). Login will fail!");
        }
        Self {
            repo: Arc::new(repo),
            auth: Arc::new(auth),
            selections: Arc::new(SelectionSessions::new()),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Trainee Onboarding Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (ONBOARDING_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let bind_addr = config.bind_addr;
    let state = AppState::new(Repository::new(pool), config);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        .route("/catalog", get(api::get_catalog))
        // Legacy title views
        .route("/events", get(api::list_events).post(api::create_event))
        .route("/progress", get(api::list_progress).post(api::create_progress))
        // Trainees
        .route("/trainees", get(api::list_trainees).post(api::create_trainee))
        .route("/trainees/{name}", get(api::get_trainee).delete(api::delete_trainee))
        .route(
            "/trainees/{name}/checklist",
            get(api::get_checklist).put(api::set_checklist_item),
        )
        .route(
            "/trainees/{name}/details",
            get(api::get_details).put(api::set_detail),
        )
        // Periods
        .route("/periods", get(api::list_periods).post(api::create_period))
        .route("/periods/grouped", get(api::grouped_periods))
        .route("/calendar", get(api::calendar_events))
        // Selection workflow
        .route("/selections", post(api::start_selection))
        .route("/selections/{id}", delete(api::cancel_selection))
        .route("/selections/{id}/name", put(api::enter_selection_name))
        .route("/selections/{id}/depot", put(api::choose_selection_depot))
        .route("/selections/{id}/vehicle", put(api::choose_selection_vehicle))
        // Report
        .route("/report", get(api::training_report))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Login sits outside the PSK guard
    let public_api = Router::new().route("/login", post(api::login));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes.merge(public_api))
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
