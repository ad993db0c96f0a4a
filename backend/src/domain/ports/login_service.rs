//! Driving port for login/authentication use-cases.
//!
//! In hexagonal terms this is a *driving* port: inbound adapters call it to
//! authenticate credentials without knowing (or importing) the backing
//! infrastructure. This makes HTTP handler tests deterministic because they
//! can substitute a test double instead of wiring persistence.

use async_trait::async_trait;

use crate::domain::auth::LoginCredentials;
use crate::domain::error::Error;
use crate::domain::user::User;

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated profile.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;
}

/// Authenticator that rejects everything; used where login is not wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, _credentials: &LoginCredentials) -> Result<User, Error> {
        Err(Error::unauthorized("invalid credentials"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::error::ErrorCode;

    #[rstest]
    #[tokio::test]
    async fn fixture_login_rejects_all_credentials() {
        let creds = LoginCredentials::try_from_parts("a@b.example", "pw").expect("valid shape");
        let error = FixtureLoginService
            .authenticate(&creds)
            .await
            .expect_err("fixture must reject");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }
}
