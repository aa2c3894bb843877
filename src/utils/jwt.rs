use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user id
    pub sid: Uuid,       // session id
    pub username: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

/// Sign a token bound to `session_id`; it expires together with the session row.
pub fn create_token(
    user_id: Uuid,
    session_id: Uuid,
    username: &str,
    role: UserRole,
    secret: &str,
    expires_at: DateTime<Utc>,
) -> AppResult<String> {
    let claims = Claims {
        sub: user_id,
        sid: session_id,
        username: username.to_string(),
        role,
        exp: expires_at.timestamp(),
        iat: Utc::now().timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_round_trips_session_id() {
        let user = Uuid::new_v4();
        let session = Uuid::new_v4();
        let token = create_token(
            user,
            session,
            "caja",
            UserRole::Operator,
            "secret",
            Utc::now() + Duration::hours(1),
        )
        .unwrap();

        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.sid, session);
        assert_eq!(claims.role, UserRole::Operator);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = create_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "caja",
            UserRole::Operator,
            "secret",
            Utc::now() + Duration::hours(1),
        )
        .unwrap();

        assert!(matches!(
            verify_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
