use axum::extract::State;
use serde_json::{json, Value};

use super::utils::limit_or_default;
use crate::api::{JsonBody, QueryParams};
use crate::auth::{Module, ADMIN_ONLY};
use crate::database::{Order, Query};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;

const TABLE: &str = "backups";

/// GET /api/configuracoes/backup?bar_id=&limit= - Backups of a bar, newest first
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    params: QueryParams,
) -> ApiResult<Vec<Value>> {
    user.require_module(Module::Configuracoes)?;
    let bar_id = params.require_bar_id("bar_id")?;
    let limit = limit_or_default(params.optional_i64("limit")?, 20, 100)?;
    user.require_bar(bar_id, Module::Configuracoes)?;

    let query = Query::new()
        .select("id,bar_id,tipo,tamanho_bytes,status,created_at")
        .eq("bar_id", bar_id)
        .order("created_at", Order::Desc)
        .limit(limit);

    let rows = state.data.service().await?.select(TABLE, &query).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/configuracoes/backup/restore - Restore a backup into its bar (admins of that bar only)
///
/// Body: `{ "barId": number, "backupId": string | number }`
pub async fn restore(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Value> {
    user.require_role(ADMIN_ONLY)?;
    let JsonBody(body) = body?;
    let bar_id = body.require_bar_id("barId")?;
    let backup_id = body.require_str("backupId")?;
    user.require_bar(bar_id, ADMIN_ONLY)?;

    let client = state.data.service().await?;
    let backup = client
        .select_one(
            TABLE,
            &Query::new()
                .select("id,bar_id,status")
                .eq("id", &backup_id)
                .eq("bar_id", bar_id),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Backup não encontrado"))?;

    let result = client
        .rpc(
            "restore_backup",
            &json!({
                "p_backup_id": backup["id"],
                "p_bar_id": bar_id,
                "p_usuario_id": user.id,
            }),
        )
        .await?;

    tracing::info!("Backup {} restored into bar {} by {}", backup_id, bar_id, user.id);
    Ok(ApiResponse::success(json!({
        "backupId": backup["id"],
        "barId": bar_id,
        "resultado": result,
    })))
}
