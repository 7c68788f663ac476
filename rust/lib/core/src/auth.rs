//! Shared-secret request authentication.
//!
//! Routes do not read secrets from the environment. The concrete
//! authenticator is built from configuration at startup and injected.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::ServiceError;

/// Message returned to callers that fail the shared-secret check.
pub const INVALID_AUTHORIZATION: &str = "Invalid Authorization header";

/// Pluggable authenticator consulted by every protected route.
pub trait Authenticator: Send + Sync + 'static {
    /// Check the request headers. Returns `Err(ServiceError)` if denied.
    fn check(&self, headers: &HeaderMap) -> Result<(), ServiceError>;
}

/// Compares the raw `Authorization` header value to a configured secret.
///
/// Header names are case-insensitive in `HeaderMap`, so `authorization`
/// and `Authorization` are treated alike.
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The secret, also used as the HMAC key for token derivation.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl Authenticator for SharedSecret {
    fn check(&self, headers: &HeaderMap) -> Result<(), ServiceError> {
        let provided = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::PermissionDenied(INVALID_AUTHORIZATION.into()))?;

        if provided != self.secret {
            return Err(ServiceError::PermissionDenied(INVALID_AUTHORIZATION.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(name, HeaderValue::from_static(value));
        h
    }

    #[test]
    fn accepts_matching_secret() {
        let auth = SharedSecret::new("hunter2");
        assert!(auth.check(&headers("authorization", "hunter2")).is_ok());
    }

    #[test]
    fn rejects_missing_and_wrong_secret() {
        let auth = SharedSecret::new("hunter2");
        assert!(auth.check(&HeaderMap::new()).is_err());
        let err = auth.check(&headers("authorization", "hunter3")).unwrap_err();
        assert_eq!(err.to_string(), INVALID_AUTHORIZATION);
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn secret_is_exposed_for_token_derivation() {
        let auth = SharedSecret::new(String::from("hunter2"));
        assert_eq!(auth.secret(), "hunter2");
    }

    #[test]
    fn bearer_prefix_is_not_stripped() {
        let auth = SharedSecret::new("hunter2");
        assert!(auth.check(&headers("authorization", "Bearer hunter2")).is_err());
    }
}
