//! Authentication module.
//!
//! Two independent checks live here: the PSK layer guarding the API from
//! unknown clients, and the operator login backed by an [`AuthProvider`].
//! Both compare secrets in constant time.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// An operator account from the configured allow-list.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Decides whether a username/password pair may use the dashboard.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Fixed allow-list of operator accounts, injected from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: Vec<Credential>,
}

impl StaticCredentials {
    pub fn new(users: Vec<Credential>) -> Self {
        Self { users }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl AuthProvider for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        // Every entry is checked so timing does not reveal which user matched.
        self.users.iter().fold(false, |found, user| {
            let matches = constant_time_compare(&user.username, username)
                & constant_time_compare(&user.password, password);
            found | matches
        })
    }
}

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let headers = request.headers();
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(str::to_string);

    match provided {
        Some(key) if constant_time_compare(&key, &expected) => next.run(request).await,
        Some(_) => {
            tracing::debug!("Rejected request with invalid API key");
            AppError::Unauthorized("Invalid API key".to_string()).into_response()
        }
        None => AppError::Unauthorized("Missing or invalid API key".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
