use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::utils::{load_bar_row, non_empty_patch};
use crate::api::{parse_id, JsonBody, QueryParams};
use crate::auth::{Module, ADMIN_ONLY};
use crate::database::{Order, Query};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;

const TABLE: &str = "checklists";

/// Columns a client may set; everything else is server-owned
const EDITABLE: &[&str] = &["nome", "setor", "descricao", "tipo", "frequencia", "itens", "ativo"];

/// GET /api/checklists?bar_id=&setor=&ativo= - Checklists of one bar
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    params: QueryParams,
) -> ApiResult<Vec<Value>> {
    user.require_module(Module::Checklists)?;
    let bar_id = params.require_bar_id("bar_id")?;
    let ativo = params.optional_bool("ativo")?;
    user.require_bar(bar_id, Module::Checklists)?;

    let mut query = Query::new().eq("bar_id", bar_id).order("nome", Order::Asc);
    if let Some(setor) = params.optional("setor") {
        query = query.eq("setor", setor);
    }
    if let Some(ativo) = ativo {
        query = query.eq("ativo", ativo);
    }

    let rows = state.data.service().await?.select(TABLE, &query).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/checklists - Create a checklist (`bar_id`, `nome`, `setor` required)
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Value> {
    user.require_module(Module::Checklists)?;
    let JsonBody(body) = body?;
    let bar_id = body.require_bar_id("bar_id")?;
    let nome = body.require_str("nome")?;
    let setor = body.require_str("setor")?;
    user.require_bar(bar_id, Module::Checklists)?;

    let mut row = body.pick(EDITABLE);
    row.insert("bar_id".into(), json!(bar_id));
    row.insert("nome".into(), json!(nome));
    row.insert("setor".into(), json!(setor));
    row.insert("criado_por".into(), json!(user.id));

    let created = state
        .data
        .service()
        .await?
        .insert(TABLE, &Value::Object(row))
        .await?;

    tracing::info!("Checklist '{}' created in bar {} by {}", nome, bar_id, user.id);
    Ok(ApiResponse::created(created))
}

/// GET /api/checklists/:id - One checklist (404 when absent or from another bar)
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_module(Module::Checklists)?;
    let id = parse_id(&id)?;

    let client = state.data.service().await?;
    let row = load_bar_row(
        &client,
        TABLE,
        id,
        &user,
        Module::Checklists,
        "Checklist não encontrado",
    )
    .await?;
    Ok(ApiResponse::success(row))
}

/// PUT /api/checklists/:id - Update editable columns
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Value> {
    user.require_module(Module::Checklists)?;
    let id = parse_id(&id)?;
    let JsonBody(body) = body?;
    if body.get("nome").is_some() {
        body.require_str("nome")?;
    }
    let patch = non_empty_patch(body.pick(EDITABLE), EDITABLE)?;

    let client = state.data.service().await?;
    load_bar_row(&client, TABLE, id, &user, Module::Checklists, "Checklist não encontrado").await?;

    let updated = client
        .update(TABLE, &Query::new().eq("id", id), &patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Checklist não encontrado"))?;

    tracing::info!("Checklist {} updated by {}", id, user.id);
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/checklists/:id - Admins of the checklist's bar only
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_role(ADMIN_ONLY)?;
    let id = parse_id(&id)?;

    let client = state.data.service().await?;
    load_bar_row(&client, TABLE, id, &user, ADMIN_ONLY, "Checklist não encontrado").await?;
    client.delete(TABLE, &Query::new().eq("id", id)).await?;

    tracing::info!("Checklist {} deleted by {}", id, user.id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
