use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use sea_orm::EntityTrait;

use crate::entities::session;
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session_token";

/// Bearer header first, then the session cookie.
fn token_from(request: &Request) -> Option<String> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    bearer.or_else(|| {
        CookieJar::from_headers(request.headers())
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// Validate the JWT and the session row behind it
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = token_from(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;
    let claims = verify_token(&token, &state.config.jwt_secret)?;

    let session = session::Entity::find_by_id(claims.sid)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

    if !session.active || session.user_id != claims.sub {
        return Err(AppError::Unauthorized("Session is closed".to_string()));
    }
    if session.expires_at.with_timezone(&Utc) <= Utc::now() {
        return Err(AppError::Unauthorized("Session expired".to_string()));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Require admin role
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if claims.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
