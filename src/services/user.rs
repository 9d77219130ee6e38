//! User service
//!
//! Registration, login/logout, and cookie-session validation.

use crate::db::repositories::{AuthSessionRepository, UserRepository};
use crate::models::{AuthSession, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Result;
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Registration input
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login input; accepts a username or an email address
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn AuthSessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn AuthSessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if username, email, or password fails validation
    /// - `UserExists` if the username or email is already taken
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let username = input.username.trim();
        let email = input.email.trim();

        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if username.len() > 50 {
            return Err(UserServiceError::ValidationError(
                "Username cannot exceed 50 characters".to_string(),
            ));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "A valid email address is required".to_string(),
            ));
        }
        if input.password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.user_repo.get_by_username(username).await?.is_some() {
            return Err(UserServiceError::UserExists(username.to_string()));
        }
        if self.user_repo.get_by_email(email).await?.is_some() {
            return Err(UserServiceError::UserExists(email.to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(username.to_string(), email.to_string(), password_hash);

        let created = self.user_repo.create(&user).await?;
        tracing::info!(user_id = created.id, username = %created.username, "user registered");

        Ok(created)
    }

    /// Log a user in and create a session.
    ///
    /// # Errors
    ///
    /// `AuthenticationError` on unknown account or wrong password; the two
    /// cases are not distinguished in the message.
    pub async fn login(&self, input: LoginInput) -> Result<(User, AuthSession), UserServiceError> {
        let identifier = input.username_or_email.trim();

        let user = if identifier.contains('@') {
            self.user_repo.get_by_email(identifier).await?
        } else {
            self.user_repo.get_by_username(identifier).await?
        };

        let user = user.ok_or_else(|| {
            UserServiceError::AuthenticationError("Invalid credentials".to_string())
        })?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(UserServiceError::AuthenticationError(
                "Invalid credentials".to_string(),
            ));
        }

        let session = AuthSession::new(user.id, Duration::days(self.session_expiration_days));
        let session = self.session_repo.create(&session).await?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok((user, session))
    }

    /// Log out by deleting the session. Unknown tokens are a no-op.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo.delete(session_id).await?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for unknown tokens. Expired sessions are deleted on
    /// sight and also resolve to `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self.session_repo.get_by_id(token).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo.delete(&session.id).await?;
            return Ok(None);
        }

        Ok(self.user_repo.get_by_id(session.user_id).await?)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.user_repo.get_by_id(id).await?)
    }

    /// Delete expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self.session_repo.delete_expired().await?;
        if removed > 0 {
            tracing::debug!(removed, "expired sessions cleaned up");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxAuthSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxAuthSessionRepository::boxed(pool),
        )
    }

    fn register_input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "long enough password".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = setup_service().await;

        let user = service
            .register(register_input("alice", "alice@example.com"))
            .await
            .expect("Failed to register");
        assert_eq!(user.username, "alice");

        let (logged_in, session) = service
            .login(LoginInput {
                username_or_email: "alice".to_string(),
                password: "long enough password".to_string(),
            })
            .await
            .expect("Failed to log in");

        assert_eq!(logged_in.id, user.id);
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_login_by_email() {
        let service = setup_service().await;
        service
            .register(register_input("bob", "bob@example.com"))
            .await
            .unwrap();

        let result = service
            .login(LoginInput {
                username_or_email: "bob@example.com".to_string(),
                password: "long enough password".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup_service().await;
        service
            .register(register_input("carol", "carol@example.com"))
            .await
            .unwrap();

        let result = service
            .login(LoginInput {
                username_or_email: "carol".to_string(),
                password: "wrong password here".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let service = setup_service().await;

        let result = service
            .login(LoginInput {
                username_or_email: "ghost".to_string(),
                password: "whatever password".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let service = setup_service().await;
        service
            .register(register_input("dave", "dave@example.com"))
            .await
            .unwrap();

        let result = service
            .register(register_input("dave", "other@example.com"))
            .await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = setup_service().await;

        let empty_username = service
            .register(register_input("", "x@example.com"))
            .await;
        assert!(matches!(
            empty_username,
            Err(UserServiceError::ValidationError(_))
        ));

        let bad_email = service.register(register_input("eve", "not-an-email")).await;
        assert!(matches!(
            bad_email,
            Err(UserServiceError::ValidationError(_))
        ));

        let short_password = service
            .register(RegisterInput {
                username: "eve".to_string(),
                email: "eve@example.com".to_string(),
                password: "short".to_string(),
            })
            .await;
        assert!(matches!(
            short_password,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_session_roundtrip() {
        let service = setup_service().await;
        service
            .register(register_input("frank", "frank@example.com"))
            .await
            .unwrap();
        let (user, session) = service
            .login(LoginInput {
                username_or_email: "frank".to_string(),
                password: "long enough password".to_string(),
            })
            .await
            .unwrap();

        let resolved = service
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("Session should resolve");
        assert_eq!(resolved.id, user.id);

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let service = setup_service().await;
        assert!(service.validate_session("bogus").await.unwrap().is_none());
    }
}
