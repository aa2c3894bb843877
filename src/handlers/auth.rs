use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::entities::session;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::SESSION_COOKIE;
use crate::utils::jwt::{create_token, Claims};
use crate::utils::password::verify_password;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl From<user::Model> for UserInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
        }
    }
}

/// Login with username and password; opens a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let user = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    verify_password(&payload.password, &user.password_hash)?;

    let now = Utc::now();
    let expires_at = now + Duration::hours(state.config.jwt_expiration_hours);
    let session = session::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        expires_at: Set(expires_at.into()),
        active: Set(true),
        created_at: Set(now.into()),
    }
    .insert(&state.db)
    .await?;

    let token = create_token(
        user.id,
        session.id,
        &user.username,
        user.role,
        &state.config.jwt_secret,
        expires_at,
    )?;

    tracing::info!(user = %user.username, session = %session.id, "login");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            token,
            expires_at,
            user: user.into(),
        }),
    ))
}

/// Close the caller's session
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(existing) = session::Entity::find_by_id(claims.sid).one(&state.db).await? {
        let mut active = existing.into_active_model();
        active.active = Set(false);
        active.update(&state.db).await?;
    }

    tracing::info!(user = %claims.username, session = %claims.sid, "logout");
    Ok((jar.remove(Cookie::build(SESSION_COOKIE).path("/")), StatusCode::NO_CONTENT))
}

/// Current user
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(user.into()))
}
