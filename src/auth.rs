// src/auth.rs
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{LoginRequest, NewUser, RegisterRequest, UserProfile};
use crate::poll::MAX_IDENTITY_LEN;
use crate::store::Store;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_EMAIL_LEN: usize = 255;
/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("invalid credentials".to_string())
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AppError> {
        let email = normalize_email(&request.email);
        let username = request.username.trim().to_string();

        if email.is_empty() || username.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "email, username, password are required".to_string(),
            ));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if request.password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::Validation(format!(
                "password must be at most {MAX_PASSWORD_BYTES} bytes"
            )));
        }
        if email.chars().count() > MAX_EMAIL_LEN || username.chars().count() > MAX_IDENTITY_LEN {
            return Err(AppError::Validation(
                "email or username too long".to_string(),
            ));
        }

        let password_hash = hash_password(request.password, self.bcrypt_cost).await?;
        let user = self
            .store
            .create_user(&NewUser {
                email,
                username,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user.into())
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<UserProfile, AppError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }

        // bcrypt would compare only the first MAX_PASSWORD_BYTES bytes.
        if request.password.len() > MAX_PASSWORD_BYTES {
            return Err(invalid_credentials());
        }

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        Ok(user.into())
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), 4)
    }

    fn register_request(email: &str, username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let user = service
            .register(register_request(" Alice@Example.com", "alice", "hunter22"))
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");

        let logged_in = service
            .login(login_request("ALICE@example.com", "hunter22"))
            .await
            .unwrap();
        assert_eq!(logged_in, user);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let service = service();
        service
            .register(register_request("bob@example.com", "bob", "correct-horse"))
            .await
            .unwrap();

        let wrong = service
            .login(login_request("bob@example.com", "battery-staple"))
            .await
            .unwrap_err();
        let unknown = service
            .login(login_request("carol@example.com", "correct-horse"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AppError::Unauthorized(_)));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service();
        assert!(matches!(
            service.register(register_request("", "bob", "secret1")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.register(register_request("bob@example.com", "bob", "12345")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_password_beyond_bcrypt_limit() {
        let service = service();
        let password = "a".repeat(MAX_PASSWORD_BYTES);
        service
            .register(register_request("erin@example.com", "erin", &password))
            .await
            .unwrap();

        service
            .login(login_request("erin@example.com", &password))
            .await
            .unwrap();

        let err = service
            .login(login_request("erin@example.com", &format!("{password}DIFFERENT")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_register_length_limits() {
        let service = service();

        let password = "p".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            service.register(register_request("frank@example.com", "frank", &password)).await,
            Err(AppError::Validation(_))
        ));

        let local = "e".repeat(MAX_EMAIL_LEN - "@example.com".len());
        let email = format!("{local}@example.com");
        assert_eq!(email.len(), MAX_EMAIL_LEN);
        service
            .register(register_request(&email, "grace", "secret1"))
            .await
            .unwrap();
        assert!(matches!(
            service.register(register_request(&format!("x{email}"), "heidi", "secret1")).await,
            Err(AppError::Validation(_))
        ));

        let username = "u".repeat(MAX_IDENTITY_LEN);
        service
            .register(register_request("ivan@example.com", &username, "secret1"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .register(register_request("judy@example.com", &format!("{username}u"), "secret1"))
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let service = service();
        service
            .register(register_request("dana@example.com", "dana", "secret1"))
            .await
            .unwrap();

        let err = service
            .register(register_request("DANA@example.com", "someone-else", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
