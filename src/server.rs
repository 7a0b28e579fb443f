use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::JsonBody;
use crate::config::AppConfig;
use crate::database::DataClients;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, AuthUser};
use crate::proxy::{DiscordWebhook, FunctionProxy, PROXY_ROUTES};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: Arc<DataClients>,
    pub functions: FunctionProxy,
    pub discord: DiscordWebhook,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("zykor-api/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            data: Arc::new(DataClients::new(config.supabase.clone(), http.clone())),
            functions: FunctionProxy::new(http.clone(), &config.supabase),
            discord: DiscordWebhook::new(http, &config.integrations),
            config: Arc::new(config),
        })
    }
}

/// Hand-written routes as (method, path, access); proxy routes live in `PROXY_ROUTES`
pub const ROUTE_TABLE: &[(&str, &str, &str)] = &[
    ("GET", "/", "public"),
    ("GET", "/health", "public"),
    ("POST", "/api/auth/login", "public"),
    ("POST", "/api/auth/logout", "public"),
    ("GET", "/api/auth/me", "session"),
    ("GET", "/api/checklists", "checklists + bar"),
    ("POST", "/api/checklists", "checklists + bar"),
    ("GET", "/api/checklists/:id", "checklists + bar"),
    ("PUT", "/api/checklists/:id", "checklists + bar"),
    ("DELETE", "/api/checklists/:id", "bar admin"),
    ("GET", "/api/receitas", "receitas + bar"),
    ("POST", "/api/receitas", "receitas + bar"),
    ("GET", "/api/receitas/:id", "receitas + bar"),
    ("PUT", "/api/receitas/:id", "receitas + bar"),
    ("GET", "/api/vendas/resumo", "vendas + bar"),
    ("GET", "/api/notificacoes", "notificacoes + bar"),
    ("PUT", "/api/notificacoes/:id/lida", "notificacoes + bar"),
    ("POST", "/api/notificacoes/discord", "notificacoes + bar"),
    ("GET", "/api/configuracoes/backup", "configuracoes + bar"),
    ("POST", "/api/configuracoes/backup/restore", "bar admin"),
];

pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(public::health::root))
        .route("/health", get(public::health::health))
        .merge(auth_public_routes())
        // Protected (session required)
        .merge(protected_routes().route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware)))
        .fallback(not_found)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body)),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
}

fn protected_routes() -> Router<AppState> {
    use protected::{auth, backups, checklists, notificacoes, receitas, vendas};

    Router::new()
        .route("/api/auth/me", get(auth::me))
        // Checklists
        .route("/api/checklists", get(checklists::list).post(checklists::create))
        .route(
            "/api/checklists/:id",
            get(checklists::get).put(checklists::update).delete(checklists::delete),
        )
        // Receitas
        .route("/api/receitas", get(receitas::list).post(receitas::create))
        .route("/api/receitas/:id", get(receitas::get).put(receitas::update))
        // Vendas
        .route("/api/vendas/resumo", get(vendas::resumo))
        // Notificações
        .route("/api/notificacoes", get(notificacoes::list))
        .route("/api/notificacoes/discord", post(notificacoes::discord))
        .route("/api/notificacoes/:id/lida", put(notificacoes::mark_read))
        // Configurações
        .route("/api/configuracoes/backup", get(backups::list))
        .route("/api/configuracoes/backup/restore", post(backups::restore))
        .merge(proxy_routes())
}

/// One POST route per edge-function table entry
fn proxy_routes() -> Router<AppState> {
    PROXY_ROUTES.iter().fold(Router::new(), |router, route| {
        router.route(
            route.path,
            post(
                move |State(state): State<AppState>,
                      user: AuthUser,
                      body: Result<JsonBody, ApiError>| {
                    protected::integracoes::invoke(route, state, user, body)
                },
            ),
        )
    })
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Credentialed CORS cannot use wildcards
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

async fn not_found() -> ApiError {
    ApiError::not_found("Rota não encontrada")
}
