use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::manager::{CredentialTier, DatabaseError};
use super::query_builder::{is_valid_identifier, Query};

/// Client bound to the hosted database base URL and one credential tier.
///
/// Table operations map onto the REST surface (`/rest/v1/{table}`), stored
/// procedures onto `/rest/v1/rpc/{name}` and password sign-in onto the auth
/// surface (`/auth/v1/token`). Cheap to clone.
#[derive(Clone)]
pub struct DataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    tier: CredentialTier,
}

/// Session returned by the hosted auth password grant
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthAccount {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl DataClient {
    pub(super) fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: String,
        tier: CredentialTier,
    ) -> Result<Self, DatabaseError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|_| DatabaseError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DatabaseError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            tier,
        })
    }

    pub fn tier(&self) -> CredentialTier {
        self.tier
    }

    pub async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, DatabaseError> {
        let url = self.table_url(table)?;
        let body = self
            .send(self.request(Method::GET, &url).query(&query.to_params()))
            .await?;
        into_rows(body)
    }

    /// First matching row, if any
    pub async fn select_one(&self, table: &str, query: &Query) -> Result<Option<Value>, DatabaseError> {
        let rows = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored
    pub async fn insert(&self, table: &str, row: &Value) -> Result<Value, DatabaseError> {
        let url = self.table_url(table)?;
        let body = self
            .send(
                self.request(Method::POST, &url)
                    .header("Prefer", "return=representation")
                    .json(row),
            )
            .await?;
        into_rows(body)?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::Decode(format!("insert into {} returned no rows", table)))
    }

    pub async fn update(&self, table: &str, query: &Query, patch: &Value) -> Result<Vec<Value>, DatabaseError> {
        if !query.has_filters() {
            return Err(DatabaseError::UnfilteredMutation("update"));
        }
        let url = self.table_url(table)?;
        let body = self
            .send(
                self.request(Method::PATCH, &url)
                    .query(&query.to_params())
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;
        into_rows(body)
    }

    pub async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Value>, DatabaseError> {
        if !query.has_filters() {
            return Err(DatabaseError::UnfilteredMutation("delete"));
        }
        let url = self.table_url(table)?;
        let body = self
            .send(
                self.request(Method::DELETE, &url)
                    .query(&query.to_params())
                    .header("Prefer", "return=representation"),
            )
            .await?;
        into_rows(body)
    }

    /// Call a stored procedure with named arguments
    pub async fn rpc(&self, function: &str, args: &Value) -> Result<Value, DatabaseError> {
        if !is_valid_identifier(function) {
            return Err(DatabaseError::InvalidIdentifier(function.to_string()));
        }
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        self.send(self.request(Method::POST, &url).json(args)).await
    }

    /// Password grant against the hosted auth service.
    ///
    /// Returns `Ok(None)` when the credentials are rejected so callers can
    /// answer 401 without treating it as an outage.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthSession>, DatabaseError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let result = self
            .send(
                self.request(Method::POST, &url)
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await;

        match result {
            Ok(body) => serde_json::from_value(body)
                .map(Some)
                .map_err(|e| DatabaseError::Decode(e.to_string())),
            Err(DatabaseError::Api { status, .. }) if status == 400 || status == 401 => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reachability probe for `/health`
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let url = format!("{}/rest/v1/", self.base_url);
        let response = self.request(Method::GET, &url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DatabaseError::Api {
                status: status.as_u16(),
                code: None,
                message: format!("health probe returned {}", status),
            })
        }
    }

    fn table_url(&self, table: &str) -> Result<String, DatabaseError> {
        if !is_valid_identifier(table) {
            return Err(DatabaseError::InvalidIdentifier(table.to_string()));
        }
        Ok(format!("{}/rest/v1/{}", self.base_url, table))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, DatabaseError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DatabaseError::Decode(e.to_string()))
    }
}

fn api_error(status: StatusCode, text: &str) -> DatabaseError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(text).ok();
    let (code, message) = match parsed {
        Some(body) => {
            let message = body
                .message
                .or(body.error_description)
                .or(body.msg)
                .unwrap_or_else(|| text.to_string());
            (body.code, message)
        }
        None => (None, text.to_string()),
    };

    DatabaseError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

fn into_rows(body: Value) -> Result<Vec<Value>, DatabaseError> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other @ Value::Object(_) => Ok(vec![other]),
        other => Err(DatabaseError::Decode(format!("expected rows, got {}", other))),
    }
}
