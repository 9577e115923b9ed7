use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use storefront_cache::{CacheError, KeyError, UnknownResourceClass};
use storefront_core::AuthError;
use validator::ValidationErrors;

use crate::catalog::CatalogError;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn service_unavailable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, err)
    }
}

/// Status for errors converted with `?`. Anything unrecognised is a 500.
fn status_for(error: &Error) -> StatusCode {
    if error.is::<KeyError>() || error.is::<UnknownResourceClass>() {
        StatusCode::BAD_REQUEST
    } else if error.is::<ValidationErrors>() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else if error.is::<AuthError>() {
        StatusCode::UNAUTHORIZED
    } else if error.is::<CacheError>() {
        StatusCode::SERVICE_UNAVAILABLE
    } else if let Some(catalog) = error.downcast_ref::<CatalogError>() {
        match catalog {
            CatalogError::ProductNotFound(_) | CatalogError::CategoryNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CatalogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.error, "Request failed");
        }

        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        Self {
            status: status_for(&error),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let key = AppError::from(KeyError::InvalidIdentifier("a b".into()));
        assert_eq!(key.status, StatusCode::BAD_REQUEST);

        let missing = AppError::from(CatalogError::ProductNotFound(9));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let auth = AppError::from(AuthError::InvalidSecret);
        assert_eq!(auth.status, StatusCode::UNAUTHORIZED);

        let cache = AppError::from(CacheError::Unavailable("down"));
        assert_eq!(cache.status, StatusCode::SERVICE_UNAVAILABLE);

        let other = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_explicit_constructors() {
        assert_eq!(
            AppError::unauthorized(anyhow::anyhow!("no")).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::bad_request(anyhow::anyhow!("bad")).status,
            StatusCode::BAD_REQUEST
        );
    }
}
