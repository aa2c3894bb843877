use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::password::hash_password;

/// Open the connection pool and bring the schema up to date.
pub async fn connect(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;

    Ok(db)
}

/// Create the first admin account when no admin exists yet. Returns whether
/// one was created.
pub async fn seed_admin(db: &DatabaseConnection, username: &str, password: &str) -> AppResult<bool> {
    let admins = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .count(db)
        .await?;
    if admins > 0 {
        return Ok(false);
    }

    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(UserRole::Admin),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;

    tracing::info!(username, "admin account created");
    Ok(true)
}
