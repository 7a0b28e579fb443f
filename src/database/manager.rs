use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::SupabaseConfig;

use super::client::DataClient;

/// Errors from the data access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid table or function name: {0}")]
    InvalidIdentifier(String),

    #[error("Refusing {0} without a row filter")]
    UnfilteredMutation(&'static str),

    #[error("Database API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Which key a client presents to the hosted database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialTier {
    /// Public key, row-level security applies
    Anon,
    /// Elevated key, server-side only
    ServiceRole,
}

impl CredentialTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialTier::Anon => "anon",
            CredentialTier::ServiceRole => "service_role",
        }
    }
}

/// Lazily built, process-lifetime data clients, one per credential tier
pub struct DataClients {
    config: SupabaseConfig,
    http: reqwest::Client,
    clients: RwLock<HashMap<CredentialTier, DataClient>>,
}

impl DataClients {
    pub fn new(config: SupabaseConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Client presenting the anonymous key
    pub async fn anon(&self) -> Result<DataClient, DatabaseError> {
        self.get(CredentialTier::Anon).await
    }

    /// Client presenting the service-role key
    pub async fn service(&self) -> Result<DataClient, DatabaseError> {
        self.get(CredentialTier::ServiceRole).await
    }

    /// Get existing client or create a new one lazily
    async fn get(&self, tier: CredentialTier) -> Result<DataClient, DatabaseError> {
        // Fast path: try read lock
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(&tier) {
                return Ok(client.clone());
            }
        }

        let client = self.build(tier)?;

        // Another request may have raced us here; keep whichever landed first
        let mut clients = self.clients.write().await;
        let client = clients.entry(tier).or_insert(client).clone();

        info!("Created data client for tier: {}", tier.as_str());
        Ok(client)
    }

    fn build(&self, tier: CredentialTier) -> Result<DataClient, DatabaseError> {
        if self.config.url.trim().is_empty() {
            return Err(DatabaseError::ConfigMissing("SUPABASE_URL"));
        }

        let key = match tier {
            CredentialTier::Anon => &self.config.anon_key,
            CredentialTier::ServiceRole => &self.config.service_role_key,
        };
        if key.is_empty() {
            return Err(DatabaseError::ConfigMissing(match tier {
                CredentialTier::Anon => "SUPABASE_ANON_KEY",
                CredentialTier::ServiceRole => "SUPABASE_SERVICE_ROLE_KEY",
            }));
        }

        DataClient::new(self.http.clone(), &self.config.url, key.clone(), tier)
    }

    /// Pings the hosted database with the anonymous key
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.anon().await?.health_check().await
    }

    /// Number of memoized clients
    pub async fn cached(&self) -> usize {
        self.clients.read().await.len()
    }
}
