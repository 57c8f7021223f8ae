use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope: `{"status":"success","code":..,"data":..}`.
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl ApiResponse<Message> {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::ok(Message {
            message: msg.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    status: &'static str,
    code: u16,
    data: &'a T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: "success",
            code: self.status.as_u16(),
            data: &self.data,
        };
        (self.status, Json(body)).into_response()
    }
}
