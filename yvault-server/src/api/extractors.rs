//! Custom Axum extractors for request authentication and path validation.
//!
//! Provides:
//! - `AdminAuth`: checks the `Yvault-Admin-Authorization` header against the
//!   hashed admin secret (used by the Admin API).
//! - `UserAddress`: a `{address}` path segment validated and normalized to
//!   lowercase hex (used by the read API).

use axum::{
    extract::{FromRequestParts, Path},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use yvault_sdk::ADMIN_AUTH_HEADER;
use yvault_sdk::address::{AddressError, normalize_address};

use crate::state::AppState;

/// Proof that the request carried the admin secret.
pub struct AdminAuth;

/// Errors returned by the [`AdminAuth`] extractor.
#[derive(Debug)]
pub enum AdminAuthError {
    MissingHeader,
    InvalidHeader,
    Unauthorized,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AdminAuthError::MissingHeader => "missing Yvault-Admin-Authorization header",
            AdminAuthError::InvalidHeader => "invalid Yvault-Admin-Authorization header",
            AdminAuthError::Unauthorized => "invalid admin secret",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?;

        if !state.admin.verify(presented) {
            tracing::warn!("Rejected admin request with wrong secret");
            return Err(AdminAuthError::Unauthorized);
        }
        Ok(AdminAuth)
    }
}

/// A normalized user address taken from the `{address}` path segment.
pub struct UserAddress(pub String);

/// Errors returned by the [`UserAddress`] extractor.
#[derive(Debug)]
pub enum UserAddressError {
    MissingPath,
    Invalid(AddressError),
}

impl IntoResponse for UserAddressError {
    fn into_response(self) -> Response {
        match self {
            UserAddressError::MissingPath => {
                (StatusCode::BAD_REQUEST, "missing address").into_response()
            }
            UserAddressError::Invalid(e) => {
                (StatusCode::BAD_REQUEST, format!("invalid address: {e}")).into_response()
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for UserAddress {
    type Rejection = UserAddressError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| UserAddressError::MissingPath)?;
        normalize_address(&raw)
            .map(UserAddress)
            .map_err(UserAddressError::Invalid)
    }
}
