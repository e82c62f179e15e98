use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::schema::{Id, User, UserRole};
use crate::error::ApiError;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

/// Verified caller identity, handed to every action that mutates state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::PermissionDenied);
        }
        Ok(())
    }

    /// Authorship check for mutating an owned entity; admins pass.
    pub fn can_modify(&self, author_id: Id) -> bool {
        self.is_admin || self.user_id == author_id
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

fn session_key() -> Hmac<Sha256> {
    let secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| String::from("secret"));
    Hmac::new_from_slice(secret.as_bytes()).unwrap()
}

pub fn generate_jwt_session(user: &User) -> String {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims.sign_with_key(&session_key()).unwrap()
}

pub fn verify_jwt_session(token: String) -> Result<JwtSessionData, ApiError> {
    token
        .verify_with_key(&session_key())
        .map_err(|_| ApiError::Unauthorized)
        .map(|session: JwtSessionData| {
            let now = Utc::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::Unauthorized);
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 7,
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "hash".to_string(),
            bio: String::new(),
            profile_picture: None,
            registered_on: Utc::now(),
            role: UserRole::User,
        }
    }

    #[test]
    fn sessions_round_trip() {
        let token = generate_jwt_session(&user());
        let session = verify_jwt_session(token).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "maria");
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let mut token = generate_jwt_session(&user());
        token.push('x');
        assert!(verify_jwt_session(token).is_err());
    }

    #[test]
    fn expired_sessions_are_rejected() {
        let claims = JwtSessionData {
            user_id: 7,
            username: "maria".to_string(),
            role: UserRole::User,
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = claims.sign_with_key(&session_key()).unwrap();

        assert!(verify_jwt_session(token).is_err());
    }

    #[test]
    fn admins_can_modify_foreign_entities() {
        let session: SessionData = JwtSessionData::new(1, "admin".to_string(), UserRole::Admin).into();
        assert!(session.can_modify(999));

        let session: SessionData = JwtSessionData::new(1, "maria".to_string(), UserRole::User).into();
        assert!(session.can_modify(1));
        assert!(!session.can_modify(2));
    }
}
