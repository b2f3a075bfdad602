use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::user::{ProfileChanges, normalize_email};
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, normalize_email(&email), hash);
        self.repo.create(user).await
    }

    /// Checks credentials and issues a session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.issue_token(user.id)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, DomainError> {
        self.keys
            .generate_token(user_id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Resolves a session token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let claims = self
            .keys
            .verify_token(token)
            .map_err(|_| DomainError::Unauthorized)?;
        let user_id = claims.user_id().ok_or(DomainError::Unauthorized)?;
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let changes = ProfileChanges {
            email: normalize_email(&changes.email),
            ..changes
        };
        self.repo
            .update_profile(id, changes)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }
}
