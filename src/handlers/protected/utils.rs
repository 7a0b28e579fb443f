use serde_json::Value;

use crate::api::row_bar_id;
use crate::auth::Access;
use crate::database::{DataClient, Query};
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Load one row by id, hiding rows from bars the user cannot see.
///
/// A row from a bar whose grant does not allow `access` answers exactly
/// like a missing row.
pub async fn load_bar_row(
    client: &DataClient,
    table: &str,
    id: i64,
    user: &AuthUser,
    access: impl Into<Access>,
    missing: &str,
) -> Result<Value, ApiError> {
    let not_found = || ApiError::not_found(missing);
    let access = access.into();

    let row = client
        .select_one(table, &Query::new().eq("id", id))
        .await?
        .ok_or_else(not_found)?;

    match row_bar_id(&row) {
        Some(bar_id) if user.require_bar(bar_id, access).is_ok() => Ok(row),
        _ => {
            tracing::debug!("{} {} hidden from user {}", table, id, user.id);
            Err(not_found())
        }
    }
}

/// Reject updates that carry none of the editable columns
pub fn non_empty_patch(patch: serde_json::Map<String, Value>, allowed: &[&str]) -> Result<Value, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Nenhum campo para atualizar (permitidos: {})",
            allowed.join(", ")
        )));
    }
    Ok(Value::Object(patch))
}

pub fn limit_or_default(limit: Option<i64>, default: u32, max: u32) -> Result<u32, ApiError> {
    match limit {
        None => Ok(default),
        Some(n) if n > 0 => Ok((n as u64).min(max as u64) as u32),
        Some(_) => Err(ApiError::invalid_field("limit", "deve ser positivo")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn empty_patch_is_rejected() {
        let err = non_empty_patch(Map::new(), &["nome", "setor"]).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("nome, setor"));

        let mut patch = Map::new();
        patch.insert("nome".into(), json!("Fechamento"));
        assert_eq!(non_empty_patch(patch, &["nome"]).unwrap(), json!({"nome": "Fechamento"}));
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(limit_or_default(None, 50, 200).unwrap(), 50);
        assert_eq!(limit_or_default(Some(10), 50, 200).unwrap(), 10);
        assert_eq!(limit_or_default(Some(5000), 50, 200).unwrap(), 200);
        assert!(limit_or_default(Some(0), 50, 200).is_err());
    }
}
