pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod inspection;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod validate;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::totp::Authenticator;
use crate::config::Config;
use crate::crypto::SecretBox;
use crate::rate_limit::AttemptLimiter;
use crate::state::{AppState, SharedState};

/// Assemble the router. The state is handed back so the binary can run
/// housekeeping against the attempt limiters.
pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let state: SharedState = Arc::new(AppState {
        pool,
        authenticator: Authenticator::new(config.totp_issuer.clone()),
        secrets: SecretBox::new(&config.encryption_key),
        login_limiter: AttemptLimiter::for_logins(),
        totp_limiter: AttemptLimiter::for_totp_codes(),
        config,
    });

    let app = Router::new()
        .merge(routes::api_routes(state.config.max_upload_size))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state.clone());

    (app, state)
}

async fn health() -> &'static str {
    "ok"
}
