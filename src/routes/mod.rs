pub mod audit;
pub mod auth;
pub mod parameters;
pub mod photos;
pub mod products;
pub mod records;
pub mod reports;
pub mod two_factor;
pub mod users;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::SharedState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn api_routes(max_upload_size: usize) -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/login/2fa", post(auth::login_second_factor))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Two-factor
        .route("/api/v1/auth/2fa", get(two_factor::status))
        .route("/api/v1/auth/2fa/setup", post(two_factor::setup))
        .route("/api/v1/auth/2fa/verify", post(two_factor::verify))
        .route("/api/v1/auth/2fa/disable", post(two_factor::disable))
        // Users
        .route("/api/v1/users", get(users::list).post(users::create))
        .route(
            "/api/v1/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        // Products
        .route("/api/v1/products", get(products::list).post(products::create))
        .route(
            "/api/v1/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        // Parameters
        .route(
            "/api/v1/products/{id}/parameters",
            get(parameters::list_by_product).post(parameters::create),
        )
        .route(
            "/api/v1/parameters/{id}",
            get(parameters::get)
                .put(parameters::update)
                .delete(parameters::delete),
        )
        // Records
        .route("/api/v1/records", get(records::list).post(records::create))
        .route(
            "/api/v1/records/{id}",
            get(records::get).put(records::update).delete(records::delete),
        )
        // Photos
        .merge(photo_upload_routes(max_upload_size))
        .route(
            "/api/v1/photos/{id}",
            get(photos::download).delete(photos::delete),
        )
        // Reports & audit
        .route("/api/v1/reports", get(reports::generate))
        .route("/api/v1/audit", get(audit::list))
}

/// Uploads get their own body limit sized from config instead of axum's default.
fn photo_upload_routes(max_upload_size: usize) -> Router<SharedState> {
    Router::new()
        .route(
            "/api/v1/records/{id}/photos",
            get(photos::list_by_record).post(photos::upload),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            max_upload_size.saturating_add(MULTIPART_OVERHEAD),
        ))
}
