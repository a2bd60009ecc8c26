//! Success envelope shared by every route.
//!
//! `{"status": "success", "message"?: ..., "data"?: ...}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// A success response with an explicit status code.
#[derive(Debug, Clone)]
pub struct Success<T: Serialize> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T: Serialize> Success<T> {
    /// 200 with data.
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope {
                status: "success",
                message: None,
                data: Some(data),
            },
        }
    }

    /// 201 with data.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }
}

impl Success<()> {
    /// 200 with a message and no data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope {
                status: "success",
                message: Some(message.into()),
                data: None,
            },
        }
    }

    /// 201 with a message and no data.
    pub fn created_message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::message(message)
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
