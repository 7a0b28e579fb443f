use axum::extract::State;
use serde_json::{json, Value};

use crate::api::QueryParams;
use crate::auth::Module;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;

/// GET /api/vendas/resumo?bar_id=&data_inicio=&data_fim= - Sales summary for a period
pub async fn resumo(
    State(state): State<AppState>,
    user: AuthUser,
    params: QueryParams,
) -> ApiResult<Value> {
    user.require_module(Module::Vendas)?;
    let bar_id = params.require_bar_id("bar_id")?;
    let inicio = params.require_date("data_inicio")?;
    let fim = params.require_date("data_fim")?;
    if inicio > fim {
        return Err(ApiError::invalid_field(
            "data_inicio",
            "deve ser anterior ou igual a data_fim",
        ));
    }
    user.require_bar(bar_id, Module::Vendas)?;

    let resumo = state
        .data
        .service()
        .await?
        .rpc(
            "get_vendas_resumo",
            &json!({
                "p_bar_id": bar_id,
                "p_data_inicio": inicio.to_string(),
                "p_data_fim": fim.to_string(),
            }),
        )
        .await?;

    Ok(ApiResponse::success(resumo))
}
