//! Login and static catalog endpoints.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::{success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::Catalog;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
}

/// POST /api/login - Check operator credentials.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if !state.auth.authenticate(&request.username, &request.password) {
        tracing::info!(username = %request.username, "Login rejected");
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    tracing::info!(username = %request.username, "Operator logged in");
    success(LoginResponse {
        username: request.username,
    })
}

/// GET /api/catalog - Depots, vehicles and checklist items.
pub async fn get_catalog() -> ApiResult<Catalog> {
    success(Catalog::current())
}
