use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::session;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult, FieldError};
use crate::utils::jwt::Claims;
use crate::utils::password::hash_password;
use crate::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<UserRole>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

fn check_password(password: &str) -> Result<(), FieldError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FieldError::new(
            "password",
            format!("Password must have at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Username)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let username = payload.username.trim().to_string();

    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    }
    if let Err(e) = check_password(&payload.password) {
        errors.push(e);
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(user = %created.username, role = ?created.role, "user created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Change role and/or password
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let existing = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(password) = &payload.password {
        check_password(password).map_err(|e| AppError::Validation(vec![e]))?;
    }

    let credentials_changed = payload.role.is_some() || payload.password.is_some();
    let mut active: user::ActiveModel = existing.into();
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(password) = &payload.password {
        active.password_hash = Set(hash_password(password)?);
    }
    let updated = active.update(&state.db).await?;

    // Tokens carry the old role; the user signs in again.
    if credentials_changed {
        let closed = session::Entity::update_many()
            .col_expr(session::Column::Active, Expr::value(false))
            .filter(session::Column::UserId.eq(id))
            .filter(session::Column::Active.eq(true))
            .exec(&state.db)
            .await?;
        tracing::info!(user = %updated.username, sessions = closed.rows_affected, "user sessions closed");
    }

    Ok(Json(updated.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if claims.sub == id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    session::Entity::delete_many()
        .filter(session::Column::UserId.eq(id))
        .exec(&state.db)
        .await?;
    user::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
