use axum::extract::{Path, State};
use serde_json::{json, Value};

use super::utils::{load_bar_row, non_empty_patch};
use crate::api::{parse_id, JsonBody, QueryParams};
use crate::auth::Module;
use crate::database::{Order, Query};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;

const TABLE: &str = "receitas";

const EDITABLE: &[&str] = &[
    "nome",
    "categoria",
    "rendimento",
    "unidade_rendimento",
    "modo_preparo",
    "ingredientes",
    "custo_total",
    "ativo",
];

/// GET /api/receitas?bar_id=&categoria= - Recipes of one bar
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    params: QueryParams,
) -> ApiResult<Vec<Value>> {
    user.require_module(Module::Receitas)?;
    let bar_id = params.require_bar_id("bar_id")?;
    user.require_bar(bar_id, Module::Receitas)?;

    let mut query = Query::new().eq("bar_id", bar_id).order("nome", Order::Asc);
    if let Some(categoria) = params.optional("categoria") {
        query = query.eq("categoria", categoria);
    }

    let rows = state.data.service().await?.select(TABLE, &query).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/receitas - Create a recipe (`bar_id`, `nome`, `rendimento` required)
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Value> {
    user.require_module(Module::Receitas)?;
    let JsonBody(body) = body?;
    let bar_id = body.require_bar_id("bar_id")?;
    let nome = body.require_str("nome")?;
    let rendimento = body.require_f64("rendimento")?;
    if rendimento <= 0.0 {
        return Err(ApiError::invalid_field("rendimento", "deve ser maior que zero"));
    }
    user.require_bar(bar_id, Module::Receitas)?;

    let mut row = body.pick(EDITABLE);
    row.insert("bar_id".into(), json!(bar_id));
    row.insert("nome".into(), json!(nome));
    row.insert("rendimento".into(), json!(rendimento));

    let created = state
        .data
        .service()
        .await?
        .insert(TABLE, &Value::Object(row))
        .await?;

    tracing::info!("Receita '{}' created in bar {} by {}", nome, bar_id, user.id);
    Ok(ApiResponse::created(created))
}

/// GET /api/receitas/:id
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    user.require_module(Module::Receitas)?;
    let id = parse_id(&id)?;

    let client = state.data.service().await?;
    let row = load_bar_row(
        &client,
        TABLE,
        id,
        &user,
        Module::Receitas,
        "Receita não encontrada",
    )
    .await?;
    Ok(ApiResponse::success(row))
}

/// PUT /api/receitas/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Value> {
    user.require_module(Module::Receitas)?;
    let id = parse_id(&id)?;
    let JsonBody(body) = body?;

    let mut patch = body.pick(EDITABLE);
    if patch.contains_key("rendimento") {
        let rendimento = body.require_f64("rendimento")?;
        if rendimento <= 0.0 {
            return Err(ApiError::invalid_field("rendimento", "deve ser maior que zero"));
        }
        patch.insert("rendimento".into(), json!(rendimento));
    }
    let patch = non_empty_patch(patch, EDITABLE)?;

    let client = state.data.service().await?;
    load_bar_row(&client, TABLE, id, &user, Module::Receitas, "Receita não encontrada").await?;

    let updated = client
        .update(TABLE, &Query::new().eq("id", id), &patch)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Receita não encontrada"))?;

    Ok(ApiResponse::success(updated))
}
