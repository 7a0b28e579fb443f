use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub supabase: SupabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub integrations: IntegrationsConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosted database + function runtime endpoints and keys
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    /// Overrides `{url}/functions/v1` when the functions runtime lives elsewhere
    pub functions_url: Option<String>,
}

impl SupabaseConfig {
    pub fn functions_base(&self) -> String {
        match &self.functions_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("{}/functions/v1", self.url.trim_end_matches('/')),
        }
    }
}

// Keys stay out of debug output
impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &redact(&self.anon_key))
            .field("service_role_key", &redact(&self.service_role_key))
            .field("functions_url", &self.functions_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub session_cookie: String,
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("session_cookie", &self.session_cookie)
            .field("secure_cookies", &self.secure_cookies)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    pub discord_webhook_url: Option<String>,
    pub discord_username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Edge-function integrations (banking, accounting, POS sync)
    pub integrations_enabled: bool,
    pub discord_notifications: bool,
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Hosted database
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.supabase.url = v;
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_role_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_FUNCTIONS_URL") {
            self.supabase.functions_url = Some(v);
        }

        // API overrides
        if let Some(port) = env::var("ZYKOR_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("ZYKOR_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ZYKOR_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("ZYKOR_SESSION_COOKIE") {
            if !v.trim().is_empty() {
                self.security.session_cookie = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("ZYKOR_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("ZYKOR_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Integrations
        if let Ok(v) = env::var("DISCORD_WEBHOOK_URL") {
            self.integrations.discord_webhook_url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("DISCORD_USERNAME") {
            self.integrations.discord_username = v;
        }

        // Feature flags
        if let Ok(v) = env::var("FEATURE_INTEGRATIONS_ENABLED") {
            self.features.integrations_enabled = v.parse().unwrap_or(self.features.integrations_enabled);
        }
        if let Ok(v) = env::var("FEATURE_DISCORD_NOTIFICATIONS") {
            self.features.discord_notifications = v.parse().unwrap_or(self.features.discord_notifications);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            supabase: SupabaseConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                service_role_key: String::new(),
                functions_url: None,
            },
            api: ApiConfig {
                port: 3001,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "zykor-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                session_cookie: "zykor_session".to_string(),
                secure_cookies: false,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            integrations: IntegrationsConfig {
                discord_webhook_url: None,
                discord_username: "Zykor (dev)".to_string(),
            },
            features: FeatureFlags {
                integrations_enabled: true,
                discord_notifications: true,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 3001,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                session_cookie: "zykor_session".to_string(),
                secure_cookies: true,
                cors_origins: vec!["https://staging.zykor.com.br".to_string()],
            },
            integrations: IntegrationsConfig {
                discord_webhook_url: None,
                discord_username: "Zykor (staging)".to_string(),
            },
            ..Self::development()
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 3001,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                session_cookie: "zykor_session".to_string(),
                secure_cookies: true,
                cors_origins: vec!["https://zykor.com.br".to_string()],
            },
            integrations: IntegrationsConfig {
                discord_webhook_url: None,
                discord_username: "Zykor".to_string(),
            },
            ..Self::development()
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
