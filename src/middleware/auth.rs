use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{validate_jwt, Access, BarGrant, Claims, Module, Role};
use crate::error::ApiError;
use crate::server::AppState;

/// Authenticated user context extracted from the session token
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub nome: Option<String>,
    pub superadmin: bool,
    pub bares: Vec<BarGrant>,
    pub expires_at: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            nome: claims.nome,
            superadmin: claims.superadmin,
            bares: claims.bares,
            expires_at: claims.exp,
        }
    }
}

impl AuthUser {
    pub fn grant(&self, bar_id: i64) -> Option<&BarGrant> {
        self.bares.iter().find(|g| g.bar_id == bar_id)
    }

    /// Coarse check before the target bar is known: some bar must grant `module`
    pub fn require_module(&self, module: Module) -> Result<(), ApiError> {
        if self.superadmin || self.bares.iter().any(|g| g.allows(module.into())) {
            return Ok(());
        }
        tracing::info!("User {} denied module {}", self.id, module.as_str());
        Err(denied(module.into()))
    }

    /// Coarse check before the target bar is known: some bar must grant one of `roles`
    pub fn require_role(&self, roles: &'static [Role]) -> Result<(), ApiError> {
        if self.superadmin || self.bares.iter().any(|g| g.allows(roles.into())) {
            return Ok(());
        }
        tracing::info!("User {} denied role-restricted operation", self.id);
        Err(denied(roles.into()))
    }

    /// The grant on `bar_id` itself must allow `access`
    pub fn require_bar(&self, bar_id: i64, access: impl Into<Access>) -> Result<(), ApiError> {
        if self.superadmin {
            return Ok(());
        }
        let access = access.into();
        match self.grant(bar_id) {
            Some(grant) if grant.allows(access) => Ok(()),
            Some(grant) => {
                tracing::info!(
                    "User {} as {} in bar {} denied {:?}",
                    self.id,
                    grant.role.as_str(),
                    bar_id,
                    access
                );
                Err(denied(access))
            }
            None => {
                tracing::info!("User {} denied access to bar {}", self.id, bar_id);
                Err(ApiError::forbidden("Sem acesso a este bar"))
            }
        }
    }
}

fn denied(access: Access) -> ApiError {
    match access {
        Access::Module(module) => {
            ApiError::forbidden(format!("Sem permissão para o módulo {}", module.as_str()))
        }
        Access::Role(_) => ApiError::forbidden("Permissão insuficiente para esta operação"),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Autenticação necessária"))
    }
}

/// Validates the session token and injects `AuthUser` into the request
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie_name = &state.config.security.session_cookie;
    let token = extract_token(request.headers(), &jar, cookie_name)
        .ok_or_else(|| ApiError::unauthorized("Token de autenticação ausente"))?;

    let claims = validate_jwt(&token, &state.config.security.jwt_secret)?;

    let auth_user = AuthUser::from(claims);
    tracing::debug!("Authenticated {} ({} bars)", auth_user.email, auth_user.bares.len());
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Bearer header first, then the session cookie
fn extract_token(headers: &HeaderMap, jar: &CookieJar, cookie_name: &str) -> Option<String> {
    if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
        let token = auth.token().trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    jar.get(cookie_name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}
