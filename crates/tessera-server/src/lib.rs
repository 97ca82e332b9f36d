//! Tessera HTTP server: routing, bearer guard, response envelope and
//! process configuration.

pub mod config;
pub mod envelope;
pub mod guard;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tessera_auth::service::AuthService;
use tessera_core::repository::{CacheStore, UserRepository};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Routes mounted under `/user`.
fn user_routes<U, C>() -> Router<Arc<AuthService<U, C>>>
where
    U: UserRepository + 'static,
    C: CacheStore,
{
    Router::new()
        .route("/public/create", post(routes::create::<U, C>))
        .route("/public/login", post(routes::login::<U, C>))
        .route("/public/register", post(routes::register_external::<U, C>))
        .route("/get/code", post(routes::get_code::<U, C>))
        .route("/login/code/{code}", post(routes::login_with_code::<U, C>))
        .route("/get/image", get(routes::get_image::<U, C>))
        .route("/get/devices", get(routes::get_devices::<U, C>))
        .route("/delete/devices", post(routes::delete_devices::<U, C>))
}

/// Build the application router around a shared [`AuthService`].
pub fn router<U, C>(service: Arc<AuthService<U, C>>) -> Router
where
    U: UserRepository + 'static,
    C: CacheStore,
{
    Router::new()
        .route("/health", get(routes::health))
        .nest("/user", user_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}
