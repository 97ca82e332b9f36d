//! Uniform JSON response envelope.
//!
//! Success: `{status: true, success: true, count, data, type}`, where
//! `count`/`type` are the length and `"array"` for array data and
//! `1`/`"object"` otherwise. Failure: `{status: false, type: "error",
//! statusCode, message}`.

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tessera_core::error::TesseraError;
use tracing::{debug, error};

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again";

pub type AppResult<T> = Result<T, AppError>;

pub fn success(data: Value) -> Json<Value> {
    let (count, kind) = match &data {
        Value::Array(items) => (items.len(), "array"),
        _ => (1, "object"),
    };
    Json(json!({
        "status": true,
        "success": true,
        "count": count,
        "data": data,
        "type": kind,
    }))
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<TesseraError> for AppError {
    fn from(err: TesseraError) -> Self {
        match err {
            TesseraError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            err if err.is_domain() => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            err => {
                error!(error = %err, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "Request body rejected");
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// JSON request body whose rejections are reported in the failure
/// envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": false,
            "type": "error",
            "statusCode": self.status.as_u16(),
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_data_is_counted() {
        let Json(body) = success(json!([{ "fingerprint": "F1" }, { "fingerprint": "F2" }]));
        assert_eq!(body["count"], 2);
        assert_eq!(body["type"], "array");
        assert_eq!(body["status"], true);
        assert_eq!(body["success"], true);
    }

    #[test]
    fn object_data_counts_as_one() {
        let Json(body) = success(json!({ "token": "t" }));
        assert_eq!(body["count"], 1);
        assert_eq!(body["type"], "object");
        assert_eq!(body["data"]["token"], "t");
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            AppError::from(TesseraError::DeviceLimitExceeded).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(TesseraError::Unauthorized).status,
            StatusCode::UNAUTHORIZED
        );

        let internal = AppError::from(TesseraError::Cache("connection reset".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, GENERIC_FAILURE);
    }
}
