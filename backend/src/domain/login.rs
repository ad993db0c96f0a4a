//! Credential authentication over the user directory.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::auth::LoginCredentials;
use super::error::Error;
use super::ports::{LoginService, UserPersistenceError, UserRepository};
use super::user::User;

/// [`LoginService`] backed by the user repository's stored digests.
///
/// Lookup misses and digest mismatches produce the same `Unauthorized`
/// payload so responses do not reveal which accounts exist.
#[derive(Clone)]
pub struct PasswordLoginService {
    users: Arc<dyn UserRepository>,
}

impl PasswordLoginService {
    /// Create a service over the given directory.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

#[async_trait]
impl LoginService for PasswordLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let found = self
            .users
            .find_credentials_by_email(credentials.email())
            .await
            .map_err(map_user_error)?;

        let Some(stored) = found else {
            return Err(Error::unauthorized("invalid credentials"));
        };

        if !stored.digest.verify(credentials.password()) {
            warn!(email = %credentials.email(), "failed login attempt");
            return Err(Error::unauthorized("invalid credentials"));
        }

        Ok(stored.user)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::auth::PasswordDigest;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockUserRepository, UserCredentials};
    use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserId};

    fn stored_user(password: &str) -> UserCredentials {
        UserCredentials {
            user: User::new(
                UserId::random(),
                DisplayName::new("Grace Hopper").expect("valid name"),
                EmailAddress::new("grace@corp.example").expect("valid email"),
                Role::Purchaser,
            ),
            digest: PasswordDigest::create(password),
        }
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts("grace@corp.example", password).expect("valid shape")
    }

    #[rstest]
    #[tokio::test]
    async fn correct_password_authenticates() {
        let stored = stored_user("hunter2");
        let expected_id = stored.user.id.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials_by_email()
            .return_once(move |_| Ok(Some(stored)));

        let service = PasswordLoginService::new(Arc::new(users));
        let user = service
            .authenticate(&credentials("hunter2"))
            .await
            .expect("authentication succeeds");
        assert_eq!(user.id, expected_id);
    }

    #[rstest]
    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials_by_email()
            .return_once(|_| Ok(Some(stored_user("hunter2"))));
        let wrong_password = PasswordLoginService::new(Arc::new(users))
            .authenticate(&credentials("nope"))
            .await
            .expect_err("must reject");

        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials_by_email()
            .return_once(|_| Ok(None));
        let unknown_user = PasswordLoginService::new(Arc::new(users))
            .authenticate(&credentials("hunter2"))
            .await
            .expect_err("must reject");

        assert_eq!(wrong_password.code(), ErrorCode::Unauthorized);
        assert_eq!(unknown_user.code(), ErrorCode::Unauthorized);
        assert_eq!(wrong_password.message(), unknown_user.message());
    }

    #[rstest]
    #[tokio::test]
    async fn directory_outages_surface_as_service_unavailable() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials_by_email()
            .return_once(|_| Err(UserPersistenceError::connection("refused")));

        let error = PasswordLoginService::new(Arc::new(users))
            .authenticate(&credentials("hunter2"))
            .await
            .expect_err("must fail");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
