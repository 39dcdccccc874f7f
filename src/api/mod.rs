//! REST API module.
//!
//! Contains all API routes and handlers consumed by the dashboard.

mod legacy;
mod periods;
mod report;
mod selections;
mod session;
mod trainees;

pub use legacy::*;
pub use periods::*;
pub use report::*;
pub use selections::*;
pub use session::*;
pub use trainees::*;

use axum::{
    extract::{FromRequest, FromRequestParts, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;

/// JSON body extractor that reports malformed bodies in the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor that reports bad parameters in the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// The operator's current calendar day.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
