use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{AppRole, Profile, SignUpRequest},
    error::{AppError, Result},
    repository::{NewProfile, ProfileRepository, RoleRepository},
};

pub mod session;

use session::{Session, SessionStore};

pub const SESSION_COOKIE: &str = "session";

/// Identity provider: accounts, passwords and server-side sessions.
pub struct AuthService {
    session_store: SessionStore,
    profiles: Arc<dyn ProfileRepository>,
    roles: Arc<dyn RoleRepository>,
    session_duration_hours: i64,
}

impl AuthService {
    pub fn new(
        pool: SqlitePool,
        profiles: Arc<dyn ProfileRepository>,
        roles: Arc<dyn RoleRepository>,
        session_duration_hours: i64,
    ) -> Self {
        Self {
            session_store: SessionStore::new(pool),
            profiles,
            roles,
            session_duration_hours,
        }
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Creates the account and its profile. New accounts start as students.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Profile> {
        request.validate()?;

        let password_hash = Self::hash_password(&request.password).await?;
        let profile = self.profiles
            .create(NewProfile {
                email: request.email,
                full_name: request.full_name,
                password_hash,
            })
            .await?;

        self.roles.assign(profile.id, AppRole::Student, None).await?;

        tracing::info!("New account created for {}", profile.email);
        Ok(profile)
    }

    /// Checks credentials and opens a session. Returns the raw token for the cookie.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(Profile, String)> {
        let (user_id, hash) = self.profiles
            .password_hash(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !Self::verify_password(password, &hash).await? {
            tracing::debug!("Rejected sign-in for {}", email);
            return Err(AppError::Unauthorized);
        }

        let profile = self.profiles
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let (_session, token) = self.create_session(user_id).await?;
        Ok((profile, token))
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.session_store.delete_by_token(token).await
    }

    /// Administrative deletion: drops sessions, then the profile (role rows cascade).
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        self.session_store.delete_by_user(user_id).await?;
        self.profiles.delete(user_id).await
    }

    pub async fn create_session(&self, user_id: Uuid) -> Result<(Session, String)> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.session_duration_hours);

        let session = self.session_store
            .create(user_id, &token, expires_at)
            .await?;

        Ok((session, token))
    }

    pub async fn validate_session(&self, token: &str) -> Result<Option<Session>> {
        self.session_store.find_by_token(token).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.session_store.cleanup_expired().await
    }

    pub fn create_session_cookie(&self, token: &str, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(secure)
            .max_age(cookie::time::Duration::hours(self.session_duration_hours))
            .build()
    }

    pub fn create_logout_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
