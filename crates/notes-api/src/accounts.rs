//! Registration and login.

use std::sync::LazyLock;

use notes_core::{DatabaseService, User};
use regex::Regex;

use crate::error::AppError;
use crate::password::{hash_password_blocking, verify_password_blocking};
use crate::token::TokenService;

const MIN_PASSWORD_CHARS: usize = 6;
const MAX_NAME_CHARS: usize = 100;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// A persisted user and a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: DatabaseService,
    tokens: TokenService,
}

impl AuthService {
    pub const fn new(db: DatabaseService, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, AppError> {
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        let name_chars = name.trim().chars().count();
        if name_chars == 0 || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::validation(format!(
                "Name is required and must be at most {MAX_NAME_CHARS} characters"
            )));
        }

        if self.db.find_user_by_email(email).await?.is_some() {
            return Err(AppError::EmailExists);
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let user = User::new(name, email, password_hash);
        // A concurrent registration can still trip the unique index.
        self.db.create_user(&user).await?;

        let token = self.issue(&user)?;
        tracing::info!(user = crate::auth::user_fingerprint(&user.id), "Registered user");
        Ok(AuthSession { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }

        let user = self.db.find_user_by_email(email).await?;
        let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
        let verified = verify_password_blocking(password.to_string(), stored_hash).await?;
        let Some(user) = user else {
            tracing::warn!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };
        if !verified {
            tracing::warn!(
                user = crate::auth::user_fingerprint(&user.id),
                "Login attempt with wrong password"
            );
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    fn issue(&self, user: &User) -> Result<String, AppError> {
        self.tokens
            .issue(&user.id)
            .map_err(|error| AppError::internal(error.to_string()))
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(AppError::validation("A valid email is required"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn service() -> AuthService {
        let db = DatabaseService::open_in_memory().await.unwrap();
        AuthService::new(db, TokenService::new("test-secret", Duration::from_secs(3600)))
    }

    #[tokio::test]
    async fn register_issues_token_for_new_user() {
        let auth = service().await;
        let session = auth
            .register("ada@example.com", "secret1", "Ada")
            .await
            .unwrap();

        assert_eq!(session.user.email, "ada@example.com");
        assert_ne!(session.user.password_hash, "secret1");
        assert_eq!(auth.tokens.verify(&session.token).unwrap(), session.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service().await;
        auth.register("ada@example.com", "secret1", "Ada")
            .await
            .unwrap();

        let err = auth
            .register("ada@example.com", "secret2", "Other")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailExists));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let auth = service().await;
        let long_name = "x".repeat(101);
        for (email, password, name) in [
            ("not-an-email", "secret1", "Ada"),
            ("ada@example.com", "short", "Ada"),
            ("ada@example.com", "secret1", "  "),
            ("ada@example.com", "secret1", long_name.as_str()),
        ] {
            let err = auth.register(email, password, name).await.unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR", "{email} / {password} / {name}");
        }
    }

    #[tokio::test]
    async fn login_checks_credentials() {
        let auth = service().await;
        let registered = auth
            .register("ada@example.com", "secret1", "Ada")
            .await
            .unwrap();

        let session = auth.login("ada@example.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, registered.user.id);

        assert!(matches!(
            auth.login("ada@example.com", "wrong-pass").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "secret1").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ADA@example.com", "secret1").await,
            Err(AppError::InvalidCredentials)
        ));
        assert_eq!(
            auth.login("ada@example.com", "").await.unwrap_err().code(),
            "VALIDATION_ERROR"
        );
    }
}
