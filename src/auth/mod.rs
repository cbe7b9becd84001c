//! Credential loading and request authentication.
//!
//! # Responsibilities
//! - Load the access password (environment variable or password file)
//! - Check HTTP Basic credentials on incoming requests
//! - Decorate handlers that require authentication
//!
//! # Design Decisions
//! - The check is a pure comparison against the configured secret, safe
//!   under unbounded concurrent invocation
//! - Any username is accepted; only the password is significant
//! - A missing credential at startup is fatal, never a silent open server

use std::path::Path;
use std::sync::Arc;

use axum::http::header::{HeaderMap, AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::prelude::{Engine, BASE64_STANDARD};
use thiserror::Error;

use crate::routing::dispatch::Handler;

/// Environment variable consulted for the access password.
pub const PASSWORD_ENV: &str = "BLOBSTORED_PASSWORD";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no access password configured; set {PASSWORD_ENV} or provide a password file")]
    Missing,

    #[error("could not read password file {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },
}

/// The configured access credential.
pub struct AccessCheck {
    password: String,
}

impl AccessCheck {
    pub fn new(password: impl Into<String>) -> Result<Self, CredentialError> {
        let password = password.into();
        if password.is_empty() {
            return Err(CredentialError::Missing);
        }
        Ok(AccessCheck { password })
    }

    /// Resolve the password from the environment, falling back to the
    /// optional password file (first line, trimmed).
    pub fn from_sources(password_file: Option<&Path>) -> Result<Self, CredentialError> {
        if let Ok(pw) = std::env::var(PASSWORD_ENV) {
            if !pw.is_empty() {
                return AccessCheck::new(pw);
            }
        }
        if let Some(path) = password_file {
            let contents = std::fs::read_to_string(path).map_err(|source| CredentialError::File {
                path: path.display().to_string(),
                source,
            })?;
            if let Some(line) = contents.lines().next() {
                return AccessCheck::new(line.trim());
            }
        }
        Err(CredentialError::Missing)
    }

    /// True when the request carries Basic credentials with the
    /// configured password.
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let Some(encoded) = value.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = BASE64_STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return false;
        };
        match pair.split_once(':') {
            Some((_user, password)) => password == self.password,
            None => false,
        }
    }
}

/// The fixed authentication-failure response.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, "Basic realm=\"blobstored\"")],
        "Authentication required.",
    )
        .into_response()
}

/// Decorate `inner` with a credential check: on failure the inner
/// handler is never invoked; on success it runs unchanged.
pub fn require_auth(check: Arc<AccessCheck>, inner: Handler) -> Handler {
    Handler::new(move |req| async move {
        if check.is_authorized(req.headers()) {
            inner.run(req).await
        } else {
            unauthorized()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn basic(user: &str, password: &str) -> String {
        format!("Basic {}", BASE64_STANDARD.encode(format!("{user}:{password}")))
    }

    fn check() -> AccessCheck {
        AccessCheck::new("s3cret").unwrap()
    }

    #[test]
    fn test_accepts_any_username_with_right_password() {
        let c = check();
        for user in ["", "alice", "bob"] {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, basic(user, "s3cret").parse().unwrap());
            assert!(c.is_authorized(&headers), "user {user:?}");
        }
    }

    #[test]
    fn test_rejects_bad_or_absent_credentials() {
        let c = check();
        assert!(!c.is_authorized(&HeaderMap::new()));

        for value in [
            basic("alice", "wrong"),
            "Bearer s3cret".to_string(),
            "Basic not!base64".to_string(),
        ] {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value.parse().unwrap());
            assert!(!c.is_authorized(&headers), "{value:?}");
        }
    }

    #[test]
    fn test_empty_password_is_rejected_at_construction() {
        assert!(matches!(
            AccessCheck::new(""),
            Err(CredentialError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_wrapper_short_circuits_on_failure() {
        static CALLED: AtomicBool = AtomicBool::new(false);
        let inner = Handler::new(|_req| async {
            CALLED.store(true, Ordering::SeqCst);
            StatusCode::OK.into_response()
        });

        let wrapped = require_auth(Arc::new(check()), inner);
        let req = Request::builder().body(Body::empty()).unwrap();
        let resp = wrapped.run(req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(WWW_AUTHENTICATE));
        assert!(!CALLED.load(Ordering::SeqCst), "inner handler must not run");
    }

    #[tokio::test]
    async fn test_wrapper_delegates_on_success() {
        let inner = Handler::new(|_req| async { StatusCode::OK.into_response() });
        let wrapped = require_auth(Arc::new(check()), inner);

        let req = Request::builder()
            .header(AUTHORIZATION, basic("any", "s3cret"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(wrapped.run(req).await.status(), StatusCode::OK);
    }
}
