pub mod relay;
pub mod routes;

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{IntegrationsConfig, SupabaseConfig};

pub use relay::{relay, Relayed};
pub use routes::{ProxyRoute, PROXY_ROUTES};

/// Errors from forwarding a request downstream
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid downstream URL: {0}")]
    InvalidUrl(String),

    #[error("{target} unreachable: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{target} returned {status}: {message}")]
    Status {
        target: String,
        status: u16,
        message: String,
    },
}

/// POST `payload` to `url` and relay the answer. Single shot, no retries.
pub async fn forward(
    http: &reqwest::Client,
    target: &str,
    url: &str,
    bearer: Option<&str>,
    payload: &Value,
) -> Result<Relayed, ProxyError> {
    let parsed = url::Url::parse(url).map_err(|_| ProxyError::InvalidUrl(url.to_string()))?;

    let mut request = http.post(parsed).json(payload);
    if let Some(token) = bearer {
        request = request.bearer_auth(token).header("apikey", token);
    }

    let response = request.send().await.map_err(|source| ProxyError::Transport {
        target: target.to_string(),
        source,
    })?;

    relay(target, response).await
}

/// Invokes hosted edge functions with the service-role credential
#[derive(Clone)]
pub struct FunctionProxy {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl FunctionProxy {
    pub fn new(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            base_url: config.functions_base(),
            service_key: config.service_role_key.clone(),
        }
    }

    pub fn function_url(&self, function: &str) -> Result<String, ProxyError> {
        let valid = !function.is_empty()
            && function
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ProxyError::InvalidUrl(function.to_string()));
        }
        Ok(format!("{}/{}", self.base_url, function))
    }

    pub async fn invoke(&self, function: &str, payload: &Value) -> Result<Relayed, ProxyError> {
        if self.service_key.is_empty() {
            return Err(ProxyError::ConfigMissing("SUPABASE_SERVICE_ROLE_KEY"));
        }
        let url = self.function_url(function)?;

        tracing::debug!("Invoking edge function {}", function);
        forward(&self.http, function, &url, Some(&self.service_key), payload).await
    }
}

/// Posts messages to the team chat webhook
#[derive(Clone)]
pub struct DiscordWebhook {
    http: reqwest::Client,
    url: Option<String>,
    username: String,
}

impl DiscordWebhook {
    pub fn new(http: reqwest::Client, config: &IntegrationsConfig) -> Self {
        Self {
            http,
            url: config.discord_webhook_url.clone(),
            username: config.discord_username.clone(),
        }
    }

    pub fn content(titulo: Option<&str>, mensagem: &str) -> String {
        match titulo {
            Some(titulo) if !titulo.trim().is_empty() => format!("**{}**\n{}", titulo.trim(), mensagem),
            _ => mensagem.to_string(),
        }
    }

    pub async fn send(&self, titulo: Option<&str>, mensagem: &str) -> Result<Relayed, ProxyError> {
        let url = self
            .url
            .as_deref()
            .ok_or(ProxyError::ConfigMissing("DISCORD_WEBHOOK_URL"))?;

        let payload = json!({
            "content": Self::content(titulo, mensagem),
            "username": self.username,
        });
        forward(&self.http, "discord", url, None, &payload).await
    }
}
