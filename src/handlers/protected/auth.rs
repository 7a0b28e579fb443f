use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - Identity carried by the current session
pub async fn me(user: AuthUser) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
