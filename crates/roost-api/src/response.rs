use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Uniform success envelope: `{statuscode, data, message, success}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub statuscode: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: &str) -> Self {
        Self {
            statuscode: status.as_u16(),
            data,
            message: message.to_string(),
            success: status.as_u16() < 400,
            status,
        }
    }

    pub fn ok(data: T, message: &str) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: &str) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
