use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::convert::Infallible;

use super::{parse_bool, parse_date, parse_i64, positive};
use crate::error::ApiError;

/// Query string parameters; extraction never fails, validation happens per field
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::parse(parts.uri.query().unwrap_or("")))
    }
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    pub fn optional(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn require(&self, key: &str) -> Result<String, ApiError> {
        self.optional(key).ok_or_else(|| ApiError::missing_field(key))
    }

    pub fn optional_i64(&self, key: &str) -> Result<Option<i64>, ApiError> {
        self.optional(key).map(|v| parse_i64(key, &v)).transpose()
    }

    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, ApiError> {
        self.optional(key).map(|v| parse_bool(key, &v)).transpose()
    }

    pub fn require_date(&self, key: &str) -> Result<NaiveDate, ApiError> {
        let raw = self.require(key)?;
        parse_date(key, &raw)
    }

    pub fn require_bar_id(&self, key: &str) -> Result<i64, ApiError> {
        let raw = self.require(key)?;
        parse_i64(key, &raw).and_then(|id| positive(key, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bar_id_is_explained() {
        let params = QueryParams::parse("setor=cozinha");
        let err = params.require_bar_id("bar_id").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "bar_id é obrigatório");
    }

    #[test]
    fn decodes_and_trims_values() {
        let params = QueryParams::parse("bar_id=%203%20&setor=sal%C3%A3o&vazio=&lida=false");
        assert_eq!(params.require_bar_id("bar_id").unwrap(), 3);
        assert_eq!(params.optional("setor").as_deref(), Some("salão"));
        assert_eq!(params.optional("vazio"), None);
        assert_eq!(params.optional_bool("lida").unwrap(), Some(false));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let params = QueryParams::parse("bar_id=abc&limit=-");
        assert!(params.require_bar_id("bar_id").is_err());
        assert!(params.optional_i64("limit").is_err());
        assert_eq!(params.optional_i64("ausente").unwrap(), None);
    }
}
