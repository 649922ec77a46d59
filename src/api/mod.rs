//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod attention;
mod camps;
mod dashboard;
mod events;
mod follow_ups;
mod import;
mod members;
mod messaging;
mod users;

pub use attention::*;
pub use camps::*;
pub use dashboard::*;
pub use events::*;
pub use follow_ups::*;
pub use import::*;
pub use members::*;
pub use messaging::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{ActingUser, UserRole};

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

/// Restrict an operation to admins.
pub fn require_admin(acting: &ActingUser) -> Result<(), AppError> {
    match acting.role {
        UserRole::Admin => Ok(()),
        UserRole::Leader | UserRole::Shepherd => Err(AppError::Forbidden(
            "This operation requires the Admin role".to_string(),
        )),
    }
}

/// Restrict an operation to admins and leaders.
pub fn require_admin_or_leader(acting: &ActingUser) -> Result<(), AppError> {
    match acting.role {
        UserRole::Admin | UserRole::Leader => Ok(()),
        UserRole::Shepherd => Err(AppError::Forbidden(
            "This operation requires the Admin or Leader role".to_string(),
        )),
    }
}
