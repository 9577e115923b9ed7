use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use storefront_core::{AuthError, verify_bearer};
use tracing::warn;

use crate::state::AppState;
use crate::utils::errors::AppError;

fn authorize(parts: &Parts, expected: Option<&str>, caller: &'static str) -> Result<(), AppError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    verify_bearer(header, expected).map_err(|e| {
        warn!(caller, reason = %e, "Rejected privileged request");
        match e {
            // Don't reveal whether a secret is configured.
            AuthError::NotConfigured => AppError::unauthorized(AuthError::InvalidSecret),
            other => AppError::unauthorized(other),
        }
    })
}

/// Caller authenticated with the invalidation webhook secret.
#[derive(Debug, Clone, Copy)]
pub struct WebhookCaller;

impl FromRequestParts<AppState> for WebhookCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state.secrets.webhook_secret.as_deref(), "webhook")?;
        Ok(WebhookCaller)
    }
}

/// Operator authenticated with the cache admin token.
#[derive(Debug, Clone, Copy)]
pub struct CacheAdmin;

impl FromRequestParts<AppState> for CacheAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state.secrets.admin_token.as_deref(), "cache_admin")?;
        Ok(CacheAdmin)
    }
}
