//! JSON bodies for the `/api/v1` DTC endpoint and chat body rejections.
//!
//! A lookup hit answers `{"data": <DtcRecord>, "meta": {...}}`, an unknown
//! code answers `{"error": {"code": "NOT_FOUND", ...}, "meta": {...}}` with
//! a 404. `/chat` replies and `/health` stay bare.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::types::DtcRecord;

/// Version reported in `meta.version`.
pub const API_VERSION: &str = "1";

/// Machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
}

impl ErrorCode {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Meta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: API_VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Serialized as a single `data` or `error` key next to `meta`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Payload<T> {
    Data(T),
    Error(ApiError),
}

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    #[serde(flatten)]
    payload: Payload<T>,
    meta: Meta,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            payload: Payload::Data(data),
            meta: Meta::now(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl Envelope<()> {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Response {
        let body = Self {
            payload: Payload::Error(ApiError {
                code,
                message: message.into(),
            }),
            meta: Meta::now(),
        };
        (code.status(), Json(body)).into_response()
    }
}

/// 200 with the stored record.
pub fn dtc_found(record: &DtcRecord) -> Response {
    Envelope::ok(record)
}

/// 404 naming the trimmed code as requested.
pub fn dtc_not_found(code: &str) -> Response {
    Envelope::<()>::error(ErrorCode::NotFound, format!("DTC {} not found", code.trim()))
}

/// 400 for a chat body that is not JSON.
pub fn invalid_chat_body(err: &serde_json::Error) -> Response {
    Envelope::<()>::error(ErrorCode::BadRequest, format!("Invalid JSON body: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_found_record_under_data() {
        let record = DtcRecord {
            code: "P0141".into(),
            meaning: "O2 Sensor Heater Circuit".into(),
            possible_cause: String::new(),
            fix_suggestion: "Replace sensor".into(),
            urgency: "Medium".into(),
        };
        let resp = dtc_found(&record);
        assert_eq!(resp.status(), StatusCode::OK);

        let v = body_json(resp).await;
        assert_eq!(v["data"]["code"], "P0141");
        assert_eq!(v["data"]["urgency"], "Medium");
        assert_eq!(v["meta"]["version"], "1");
        assert!(v.get("error").is_none());
    }

    #[tokio::test]
    async fn test_unknown_code_is_404() {
        let resp = dtc_not_found(" P9999 ");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let v = body_json(resp).await;
        assert_eq!(v["error"]["code"], "NOT_FOUND");
        assert_eq!(v["error"]["message"], "DTC P9999 not found");
        assert!(v.get("data").is_none());
    }

    #[tokio::test]
    async fn test_invalid_chat_body_is_400() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let resp = invalid_chat_body(&err);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let v = body_json(resp).await;
        assert_eq!(v["error"]["code"], "BAD_REQUEST");
        assert!(v["error"]["message"].as_str().unwrap().starts_with("Invalid JSON body"));
        assert!(v["meta"]["timestamp"].is_string());
    }
}
