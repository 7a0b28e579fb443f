use crate::api::JsonBody;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::proxy::{ProxyRoute, Relayed};
use crate::server::AppState;

/// POST <route.path> - Validate the body and relay it to the route's edge function.
///
/// The caller's id is added as `usuario_id` so the function can audit the
/// request; the downstream answer is returned unchanged.
pub async fn invoke(
    route: &'static ProxyRoute,
    state: AppState,
    user: AuthUser,
    body: Result<JsonBody, ApiError>,
) -> Result<Relayed, ApiError> {
    if !state.config.features.integrations_enabled {
        return Err(ApiError::service_unavailable("Integrações desativadas"));
    }
    user.require_module(route.module)?;

    let JsonBody(body) = body?;
    for field in route.required {
        body.require(field)?;
    }
    let bar_id = body.require_bar_id("bar_id")?;
    user.require_bar(bar_id, route.module)?;

    let mut payload = body.into_value();
    payload["usuario_id"] = serde_json::json!(user.id);

    tracing::info!("Relaying {} for bar {} to {}", route.path, bar_id, route.function);
    Ok(state.functions.invoke(route.function, &payload).await?)
}
