use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;
use crate::services::ServiceResult;

/// Successful response body with the route's declared status code
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.data)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Terminate a handler: unwrap a successful service result into the response
/// body, or translate the failure into an HTTP error.
pub fn respond<T: Serialize>(result: ServiceResult<T>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(ApiResponse::success(data)),
        Err(err) => {
            let api_error = ApiError::from(err);
            if api_error.status_code().is_server_error() {
                tracing::error!("Request failed: {}", api_error);
            }
            Err(api_error)
        }
    }
}
