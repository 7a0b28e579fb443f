use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde_json::{Map, Value};

use super::{parse_f64, parse_i64, positive};
use crate::error::ApiError;

/// JSON object body that never rejects with a framework error.
///
/// Empty body reads as `{}` so that required-field checks produce the usual
/// `<campo> é obrigatório` message; malformed JSON is a 400.
#[derive(Debug)]
pub struct JsonBody(pub Fields);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large("Corpo da requisição muito grande")
            } else {
                tracing::warn!("Failed to read request body: {}", rejection.body_text());
                ApiError::bad_request("Não foi possível ler o corpo da requisição")
            }
        })?;

        Fields::from_bytes(&bytes).map(JsonBody)
    }
}

/// Validated access to the fields of a JSON object body
#[derive(Debug, Clone, Default)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(ApiError::invalid_json("O corpo da requisição deve ser um objeto JSON")),
            Err(e) => {
                tracing::debug!("Rejected malformed JSON body: {}", e);
                Err(ApiError::invalid_json("JSON inválido"))
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Present, non-null and not an empty/blank string
    fn present(&self, key: &str) -> Option<&Value> {
        match self.0.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    pub fn require(&self, key: &str) -> Result<&Value, ApiError> {
        self.present(key).ok_or_else(|| ApiError::missing_field(key))
    }

    pub fn require_str(&self, key: &str) -> Result<String, ApiError> {
        self.optional_str(key)?.ok_or_else(|| ApiError::missing_field(key))
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(ApiError::invalid_field(key, "deve ser texto")),
        }
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, ApiError> {
        self.optional_i64(key)?.ok_or_else(|| ApiError::missing_field(key))
    }

    pub fn optional_i64(&self, key: &str) -> Result<Option<i64>, ApiError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| ApiError::invalid_field(key, "deve ser um número inteiro")),
            Some(Value::String(s)) => parse_i64(key, s).map(Some),
            Some(_) => Err(ApiError::invalid_field(key, "deve ser um número inteiro")),
        }
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, ApiError> {
        match self.present(key) {
            None => Err(ApiError::missing_field(key)),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| ApiError::invalid_field(key, "deve ser um número")),
            Some(Value::String(s)) => parse_f64(key, s),
            Some(_) => Err(ApiError::invalid_field(key, "deve ser um número")),
        }
    }

    /// Positive integer bar identifier
    pub fn require_bar_id(&self, key: &str) -> Result<i64, ApiError> {
        self.require_i64(key).and_then(|id| positive(key, id))
    }

    /// Copy of the listed keys that are present in the body (nulls included)
    pub fn pick(&self, keys: &[&str]) -> Map<String, Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
