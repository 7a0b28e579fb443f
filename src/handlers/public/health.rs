use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::proxy::PROXY_ROUTES;
use crate::server::AppState;

/// GET / - Service name, version and endpoint overview
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let integracoes: Vec<&str> = PROXY_ROUTES.iter().map(|r| r.path).collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Zykor API",
            "version": version,
            "environment": format!("{:?}", state.config.environment).to_lowercase(),
            "endpoints": {
                "health": "/health (public)",
                "auth": "/api/auth/login, /api/auth/logout (public), /api/auth/me (protected)",
                "checklists": "/api/checklists[/:id] (protected)",
                "receitas": "/api/receitas[/:id] (protected)",
                "vendas": "/api/vendas/resumo (protected)",
                "notificacoes": "/api/notificacoes, /api/notificacoes/:id/lida, /api/notificacoes/discord (protected)",
                "configuracoes": "/api/configuracoes/backup[/restore] (protected)",
                "integracoes": integracoes,
            }
        }
    }))
}

/// GET /health - Database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.data.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Banco de dados indisponível",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
