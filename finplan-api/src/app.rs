/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use finplan_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = finplan_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::middleware::security::SecurityHeadersLayer;
use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::get,
    Router,
};
use finplan_shared::auth::{jwt, middleware::{bearer_token, AuthContext}};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// ├── /v1/                      # API v1 (versioned)
/// │   ├── /auth                 # GET verify / POST action / DELETE logout
/// │   ├── /goals                # GET / POST / PUT / DELETE?id=
/// │   ├── /transactions         # GET?action= / POST action / PUT / DELETE?id=
/// │   ├── /budgets              # GET / POST / PUT / DELETE?id=
/// │   └── /calendar             # GET?start=&end= / POST / PUT / DELETE?id=
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (resource routes only; /auth handles its own credential)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth endpoint manages its own credential: GET reads the bearer
    // header itself, POST/DELETE are public
    let auth_routes = Router::new().route(
        "/",
        get(routes::auth::verify)
            .post(routes::auth::auth_action)
            .delete(routes::auth::logout),
    );

    // Resource routes (require JWT authentication)
    let goal_routes = Router::new().route(
        "/",
        get(routes::goals::list_goals)
            .post(routes::goals::create_goal)
            .put(routes::goals::update_goal)
            .delete(routes::goals::delete_goal),
    );

    let transaction_routes = Router::new().route(
        "/",
        get(routes::transactions::get_transactions)
            .post(routes::transactions::transaction_action)
            .put(routes::transactions::update_transaction)
            .delete(routes::transactions::delete_transaction),
    );

    let budget_routes = Router::new().route(
        "/",
        get(routes::budgets::list_budgets)
            .post(routes::budgets::create_budget)
            .put(routes::budgets::update_budget)
            .delete(routes::budgets::delete_budget),
    );

    let calendar_routes = Router::new().route(
        "/",
        get(routes::calendar::list_events)
            .post(routes::calendar::create_event)
            .put(routes::calendar::update_event)
            .delete(routes::calendar::delete_event),
    );

    let protected = Router::new()
        .nest("/goals", goal_routes)
        .nest("/transactions", transaction_routes)
        .nest("/budgets", budget_routes)
        .nest("/calendar", calendar_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(protected);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = bearer_token(req.headers())?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_claims(&claims);

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
