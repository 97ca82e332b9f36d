//! Bearer-token extractor for protected routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tessera_auth::service::{AuthService, Principal};
use tessera_core::repository::{CacheStore, UserRepository};

use crate::envelope::AppError;

/// The authenticated caller. Extraction fails with 401 unless the
/// request carries a valid token for a still-registered device.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<U, C> FromRequestParts<Arc<AuthService<U, C>>> for Authenticated
where
    U: UserRepository + 'static,
    C: CacheStore,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        service: &Arc<AuthService<U, C>>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let principal = service.authorize(header).await?;
        Ok(Self(principal))
    }
}
