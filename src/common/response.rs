use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Normalised outbound response
///
/// Handlers return it for full control over status, headers and body; the
/// dispatcher synthesises one from every other return value. Serialises to
/// the wire shape `{ status, message, body, headers? }`.
///
/// # Example
/// ```
/// use zephyr::Response;
/// use axum::http::StatusCode;
/// use serde_json::json;
///
/// let created = Response::new(StatusCode::CREATED)
///     .body(json!({ "id": 5 }))
///     .header("Location", "/users/5");
///
/// assert_eq!(created.message, "Created");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(with = "status_code")]
    pub status: StatusCode,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub body: Value,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// The response message, attached to outgoing responses as an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage(pub String);

impl Response {
    /// Empty response with the canonical message for `status`
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: default_message(status),
            body: Value::Null,
            headers: BTreeMap::new(),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK).body(body)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Serialise `value` as the body
    pub fn json<T: Serialize>(self, value: &T) -> serde_json::Result<Self> {
        Ok(self.body(serde_json::to_value(value)?))
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Structured error: the body carries `{ status, message, body: null }`
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = default_message(status);
        }

        Self {
            status,
            body: json!({
                "status": status.as_u16(),
                "message": message,
                "body": null,
            }),
            message,
            headers: BTreeMap::new(),
        }
    }

    /// 500 carrying the error's message
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    /// Fill in the canonical message when none was set
    pub fn with_default_message(mut self) -> Self {
        if self.message.is_empty() {
            self.message = default_message(self.status);
        }
        self
    }
}

/// Canonical reason phrase for a status code, e.g. `204` → `"No Content"`
pub fn default_message(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown Status").to_string()
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let bodiless = self.body.is_null()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED;

        let mut response = if bodiless {
            self.status.into_response()
        } else {
            (self.status, Json(self.body)).into_response()
        };

        for (name, value) in &self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid response header"),
            }
        }

        response
            .extensions_mut()
            .insert(StatusMessage(self.message));
        response
    }
}

mod status_code {
    use axum::http::StatusCode;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_wire_shape() {
        let response = Response::new(StatusCode::CREATED)
            .body(json!({ "id": 5 }))
            .header("x-trace", "abc");

        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(
            wire,
            json!({
                "status": 201,
                "message": "Created",
                "body": { "id": 5 },
                "headers": { "x-trace": "abc" },
            })
        );

        let parsed: Response = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_error_payload() {
        let response = Response::error(StatusCode::FORBIDDEN, "nope");
        assert_eq!(response.message, "nope");
        assert_eq!(
            response.body,
            json!({ "status": 403, "message": "nope", "body": null })
        );

        let fallback = Response::from_error(&anyhow::anyhow!(""));
        assert_eq!(fallback.message, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_into_response_applies_headers_and_body() {
        let response = Response::new(StatusCode::CREATED)
            .body(json!({ "id": 5 }))
            .header("x-trace", "abc")
            .header("bad header", "ignored")
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert_eq!(
            response.extensions().get::<StatusMessage>(),
            Some(&StatusMessage("Created".into()))
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "id": 5 }));
    }

    #[tokio::test]
    async fn test_no_content_has_empty_body() {
        let response = Response::new(StatusCode::NO_CONTENT)
            .body(json!([]))
            .into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
