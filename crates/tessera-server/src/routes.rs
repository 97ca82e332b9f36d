//! Route handlers. Public routes take no [`Authenticated`] extractor.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use tessera_auth::service::AuthService;
use tessera_core::repository::{CacheStore, UserRepository};

use crate::envelope::{AppResult, JsonBody, success};
use crate::guard::Authenticated;

type Service<U, C> = State<Arc<AuthService<U, C>>>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let token = service.register(body).await?;
    Ok(success(json!({ "token": token })))
}

pub async fn login<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let token = service.login(body).await?;
    Ok(success(json!({ "token": token })))
}

pub async fn register_external<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let outcome = service.register_external(body).await?;
    let message = if outcome.already_registered {
        "User already registered"
    } else {
        "success"
    };
    Ok(success(json!({ "message": message, "token": outcome.token })))
}

pub async fn get_code<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    Authenticated(principal): Authenticated,
) -> AppResult<Json<Value>> {
    let code = service.issue_code(&principal).await?;
    Ok(success(json!({ "code": code })))
}

pub async fn login_with_code<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    Authenticated(_): Authenticated,
    Path(code): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let token = service.login_with_code(&code, body).await?;
    Ok(success(json!({ "message": "Login success", "token": token })))
}

pub async fn get_image<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    Authenticated(principal): Authenticated,
) -> AppResult<Json<Value>> {
    let image = service.profile_photo(&principal).await?;
    Ok(success(json!({ "message": "success", "image": image })))
}

pub async fn get_devices<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    Authenticated(principal): Authenticated,
) -> AppResult<Json<Value>> {
    let devices = service.list_devices(&principal).await?;
    Ok(success(json!({ "devices": devices })))
}

pub async fn delete_devices<U: UserRepository + 'static, C: CacheStore>(
    State(service): Service<U, C>,
    Authenticated(principal): Authenticated,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    service.remove_devices(&principal, body).await?;
    Ok(success(json!({ "message": "Device removed successfully" })))
}
