use axum::extract::{Path, State};
use chrono::Utc;
use serde_json::{json, Value};

use super::utils::{limit_or_default, load_bar_row};
use crate::api::{parse_id, JsonBody, QueryParams};
use crate::auth::Module;
use crate::database::{Order, Query};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;

const TABLE: &str = "notificacoes";

/// GET /api/notificacoes?bar_id=&lida=&limit= - Latest notifications of a bar
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    params: QueryParams,
) -> ApiResult<Vec<Value>> {
    user.require_module(Module::Notificacoes)?;
    let bar_id = params.require_bar_id("bar_id")?;
    let lida = params.optional_bool("lida")?;
    let limit = limit_or_default(params.optional_i64("limit")?, 50, 200)?;
    user.require_bar(bar_id, Module::Notificacoes)?;

    let mut query = Query::new()
        .eq("bar_id", bar_id)
        .order("created_at", Order::Desc)
        .limit(limit);
    if let Some(lida) = lida {
        query = query.eq("lida", lida);
    }

    let rows = state.data.service().await?.select(TABLE, &query).await?;
    Ok(ApiResponse::success(rows))
}

/// PUT /api/notificacoes/:id/lida - Mark one notification as read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_module(Module::Notificacoes)?;
    let id = parse_id(&id)?;

    let client = state.data.service().await?;
    load_bar_row(
        &client,
        TABLE,
        id,
        &user,
        Module::Notificacoes,
        "Notificação não encontrada",
    )
    .await?;

    let updated = client
        .update(
            TABLE,
            &Query::new().eq("id", id),
            &json!({ "lida": true, "lida_em": Utc::now().to_rfc3339() }),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Notificação não encontrada"))?;

    Ok(ApiResponse::success(updated))
}

/// POST /api/notificacoes/discord - Relay a message to the team chat webhook
pub async fn discord(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Value> {
    user.require_module(Module::Notificacoes)?;
    if !state.config.features.discord_notifications {
        return Err(ApiError::service_unavailable("Notificações pelo Discord desativadas"));
    }
    let JsonBody(body) = body?;
    let bar_id = body.require_bar_id("bar_id")?;
    let mensagem = body.require_str("mensagem")?;
    let titulo = body.optional_str("titulo")?;
    user.require_bar(bar_id, Module::Notificacoes)?;

    state.discord.send(titulo.as_deref(), &mensagem).await?;

    tracing::info!("Discord notification sent for bar {} by {}", bar_id, user.id);
    Ok(ApiResponse::success(json!({ "enviado": true })))
}
