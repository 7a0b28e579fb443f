use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use super::ProxyError;

/// Longest downstream error text relayed to the caller
const MAX_ERROR_LEN: usize = 500;

/// Successful downstream response, passed through to the caller unchanged
#[derive(Debug)]
pub struct Relayed {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Normalize a downstream response.
///
/// 2xx bodies pass through as-is (empty becomes `{ success: true }`, plain
/// text becomes `{ success: true, data }`). Anything else is an error carrying
/// the downstream status and the best error text found in the body.
pub async fn relay(target: &str, response: reqwest::Response) -> Result<Relayed, ProxyError> {
    let status = response.status();
    let text = response.text().await.map_err(|source| ProxyError::Transport {
        target: target.to_string(),
        source,
    })?;

    if status.is_success() {
        let body = success_body(&text);
        // 204 cannot carry the synthesized envelope
        let status = match StatusCode::from_u16(status.as_u16()) {
            Ok(StatusCode::NO_CONTENT) | Err(_) => StatusCode::OK,
            Ok(status) => status,
        };
        return Ok(Relayed { status, body });
    }

    let message = error_message(&text)
        .unwrap_or_else(|| format!("{} respondeu com status {}", target, status.as_u16()));
    tracing::warn!("Downstream {} failed with {}: {}", target, status.as_u16(), message);

    Err(ProxyError::Status {
        target: target.to_string(),
        status: status.as_u16(),
        message,
    })
}

fn success_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return json!({ "success": true });
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| json!({ "success": true, "data": trimmed }))
}

/// `error` / `message` / `error.message` from a JSON body, else the raw text
fn error_message(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let message = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => {
            let from_error = match map.get("error") {
                Some(Value::String(s)) => Some(s.as_str()),
                Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
                _ => None,
            };
            from_error
                .filter(|s| !s.trim().is_empty())
                .or_else(|| {
                    map.get("message")
                        .and_then(Value::as_str)
                        .filter(|s| !s.trim().is_empty())
                })
                .unwrap_or(trimmed)
                .to_string()
        }
        Ok(Value::String(s)) => s,
        _ => trimmed.to_string(),
    };

    if message.trim().is_empty() {
        return None;
    }
    Some(truncate(message))
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_ERROR_LEN {
        let mut cut = MAX_ERROR_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    message
}
