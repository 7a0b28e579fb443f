use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use serde_json::Value;

use crate::api::JsonBody;
use crate::auth::{generate_jwt, BarGrant, Claims, Role};
use crate::database::Query;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, AuthUser};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

/// One grant per bar from the active `usuarios_bar` rows of a user
#[derive(Debug, PartialEq)]
pub struct BarAccess {
    pub bares: Vec<BarGrant>,
    pub nome: Option<String>,
}

impl BarAccess {
    /// `None` when the user has no usable bar membership
    pub fn from_rows(rows: &[Value]) -> Option<Self> {
        let mut bares: Vec<BarGrant> = Vec::new();
        let mut nome = None;

        for row in rows {
            let Some(bar_id) = crate::api::row_bar_id(row) else {
                continue;
            };
            let Some(role) = row.get("role").and_then(Value::as_str).and_then(Role::parse) else {
                tracing::warn!("Ignoring usuarios_bar row with unknown role for bar {}", bar_id);
                continue;
            };
            let modulos = row
                .get("modulos_permitidos")
                .and_then(Value::as_array)
                .map(|list| list.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();

            match bares.iter_mut().find(|g| g.bar_id == bar_id) {
                // Duplicate membership for one bar: keep the stronger role, union the modules
                Some(grant) => {
                    grant.role = grant.role.highest(role);
                    for m in modulos {
                        if !grant.modulos.contains(&m) {
                            grant.modulos.push(m);
                        }
                    }
                }
                None => bares.push(BarGrant::new(bar_id, role, modulos)),
            }
            if nome.is_none() {
                nome = row.get("nome").and_then(Value::as_str).map(str::to_string);
            }
        }

        if bares.is_empty() {
            return None;
        }
        bares.sort_unstable_by_key(|g| g.bar_id);
        Some(Self { bares, nome })
    }
}

/// POST /api/auth/login - Password grant, then session token in body and cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<JsonBody, ApiError>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), ApiError> {
    let JsonBody(body) = body?;
    let email = body.require_str("email")?.to_lowercase();
    let senha = match body.optional_str("senha")? {
        Some(senha) => senha,
        None => body.optional_str("password")?.ok_or_else(|| ApiError::missing_field("senha"))?,
    };

    let session = state
        .data
        .anon()
        .await?
        .sign_in_with_password(&email, &senha)
        .await?
        .ok_or_else(|| {
            tracing::info!("Rejected login for {}", email);
            ApiError::unauthorized("Email ou senha inválidos")
        })?;

    let rows = state
        .data
        .service()
        .await?
        .select(
            "usuarios_bar",
            &Query::new()
                .eq("user_id", session.user.id)
                .eq("ativo", true),
        )
        .await?;

    let access = BarAccess::from_rows(&rows).ok_or_else(|| {
        tracing::info!("User {} has no active bar membership", session.user.id);
        ApiError::forbidden("Usuário sem acesso a nenhum bar")
    })?;

    let security = &state.config.security;
    let claims = Claims::new(
        session.user.id,
        session.user.email.unwrap_or(email),
        access.nome,
        false,
        access.bares,
        security.jwt_expiry_hours,
    );
    let token = generate_jwt(&claims, &security.jwt_secret)?;
    let expires_in = claims.expires_in();

    let cookie = Cookie::build((security.session_cookie.clone(), token.clone()))
        .path("/")
        .http_only(true)
        .secure(security.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(expires_in))
        .build();

    let user = AuthUser::from(claims);
    tracing::info!("User {} logged in ({} bars)", user.id, user.bares.len());

    Ok((
        jar.add(cookie),
        ApiResponse::success(LoginResponse {
            token,
            expires_in,
            user,
        }),
    ))
}

/// POST /api/auth/logout - Clear the session cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    let mut cookie = Cookie::build((state.config.security.session_cookie.clone(), ""))
        .path("/")
        .http_only(true)
        .build();
    // Sent even when the request carried no session cookie
    cookie.make_removal();
    (
        jar.add(cookie),
        ApiResponse::success(serde_json::json!({ "logout": true })),
    )
}
