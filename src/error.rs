// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::JwtError;
use crate::database::DatabaseError;
use crate::proxy::ProxyError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    // Non-2xx relayed from a downstream function or API
    Downstream { status: u16, message: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Downstream { status, .. } => *status,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Downstream { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Downstream { .. } => "DOWNSTREAM_ERROR",
        }
    }

    /// Convert to the `{ success: false, error }` envelope
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["fields"] = json!(field_errors);
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// `<field> é obrigatório`, with the field listed under `fields`
    pub fn missing_field(field: &str) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), "obrigatório".to_string());
        ApiError::validation_error(format!("{} é obrigatório", field), Some(field_errors))
    }

    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), reason.clone());
        ApiError::validation_error(format!("{} inválido: {}", field, reason), Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Relay a downstream failure, keeping its status only when it is an error status
    pub fn downstream(status: u16, message: impl Into<String>) -> Self {
        let status = if (400..600).contains(&status) { status } else { 500 };
        ApiError::Downstream {
            status,
            message: message.into(),
        }
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Data client misconfigured: {} is not set", name);
                ApiError::service_unavailable("Serviço de dados não configurado")
            }
            DatabaseError::InvalidBaseUrl(url) => {
                tracing::error!("Data client misconfigured: invalid base URL {}", url);
                ApiError::service_unavailable("Serviço de dados não configurado")
            }
            DatabaseError::InvalidIdentifier(name) => {
                tracing::error!("Rejected table or function name: {}", name);
                ApiError::internal_server_error("Erro ao processar a requisição")
            }
            DatabaseError::UnfilteredMutation(op) => {
                tracing::error!("Refused unfiltered {}", op);
                ApiError::internal_server_error("Erro ao processar a requisição")
            }
            DatabaseError::Transport(e) => {
                tracing::error!("Database transport error: {}", e);
                ApiError::bad_gateway("Serviço de dados indisponível")
            }
            DatabaseError::Api { status, code, message } => {
                match code.as_deref() {
                    Some("PGRST116") => return ApiError::not_found("Registro não encontrado"),
                    Some("23505") => return ApiError::conflict("Registro duplicado"),
                    _ => {}
                }
                // Don't expose internal SQL errors to clients
                tracing::error!(
                    "Database API error (status {}, code {:?}): {}",
                    status,
                    code,
                    message
                );
                ApiError::internal_server_error("Erro ao processar a requisição")
            }
            DatabaseError::Decode(msg) => {
                tracing::error!("Database response decode error: {}", msg);
                ApiError::internal_server_error("Erro ao processar a requisição")
            }
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::ConfigMissing(name) => {
                tracing::error!("Downstream misconfigured: {} is not set", name);
                ApiError::service_unavailable("Integração não configurada")
            }
            ProxyError::InvalidUrl(url) => {
                tracing::error!("Downstream misconfigured: invalid URL {}", url);
                ApiError::service_unavailable("Integração não configurada")
            }
            ProxyError::Transport { target, source } => {
                tracing::error!("Downstream {} unreachable: {}", target, source);
                ApiError::bad_gateway(format!("Falha ao contatar {}", target))
            }
            ProxyError::Status { status, message, .. } => ApiError::downstream(status, message),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidSecret => {
                tracing::error!("Session secret is not configured");
                ApiError::service_unavailable("Autenticação não configurada")
            }
            JwtError::TokenGeneration(msg) => {
                tracing::error!("Session token generation failed: {}", msg);
                ApiError::internal_server_error("Falha ao gerar sessão")
            }
            JwtError::Expired => ApiError::unauthorized("Sessão expirada"),
            JwtError::Invalid(msg) => {
                tracing::debug!("Rejected session token: {}", msg);
                ApiError::unauthorized("Token inválido")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!("{} {}: {}", status.as_u16(), self.error_code(), self.message());
        }
        (status, Json(self.to_json())).into_response()
    }
}
