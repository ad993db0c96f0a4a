//! Port for user directory and credential persistence.

use async_trait::async_trait;

use crate::domain::auth::PasswordDigest;
use crate::domain::user::{EmailAddress, Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
    }
}

/// A user profile joined with its stored credential digest.
#[derive(Debug, Clone, PartialEq)]
pub struct UserCredentials {
    /// Directory profile.
    pub user: User,
    /// Stored salted digest.
    pub digest: PasswordDigest,
}

/// Port for user lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a profile by id.
    async fn find_by_id(&self, user_id: &UserId)
    -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a profile and credential digest by normalised email.
    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, UserPersistenceError>;

    /// List the full directory, ordered by display name.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// List ids of every user holding `role`.
    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<UserId>, UserPersistenceError>;
}

/// Fixture implementation backed by a static in-memory directory.
#[derive(Debug, Default, Clone)]
pub struct FixtureUserRepository {
    users: Vec<User>,
}

impl FixtureUserRepository {
    /// Build a fixture directory from the given profiles.
    #[must_use]
    pub fn with_users(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.users.iter().find(|u| u.id == *user_id).cloned())
    }

    async fn find_credentials_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, UserPersistenceError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.users.clone())
    }

    async fn list_ids_by_role(
        &self,
        role: Role,
    ) -> Result<Vec<UserId>, UserPersistenceError> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.id.clone())
            .collect())
    }
}
