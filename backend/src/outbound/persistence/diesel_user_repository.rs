//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::auth::PasswordDigest;
use crate::domain::ports::{UserCredentials, UserPersistenceError, UserRepository};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserId};

use super::diesel_helpers::impl_error_mappers;
use super::models::UserRow;
use super::pool::DbPool;
use super::schema::users;

impl_error_mappers!(UserPersistenceError);

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain profile.
///
/// Corrupt rows (unparsable role, name, or email) surface as query errors
/// rather than panics so one bad row cannot take a handler down.
fn row_to_user(row: &UserRow) -> Result<User, UserPersistenceError> {
    let display_name = DisplayName::new(&row.display_name)
        .map_err(|err| UserPersistenceError::query(format!("corrupt user row: {err}")))?;
    let email = EmailAddress::new(&row.email)
        .map_err(|err| UserPersistenceError::query(format!("corrupt user row: {err}")))?;
    let role = Role::parse(&row.role)
        .map_err(|err| UserPersistenceError::query(format!("corrupt user row: {err}")))?;

    let mut user = User::new(UserId::from_uuid(row.id), display_name, email, role);
    if let Some(url) = &row.avatar_url {
        user = user.with_avatar_url(url.clone());
    }
    Ok(user)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(user_id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| {
            let user = row_to_user(&row)?;
            Ok(UserCredentials {
                user,
                digest: PasswordDigest::from_stored(row.password_salt, row.password_digest),
            })
        })
        .transpose()
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::display_name.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.iter().map(row_to_user).collect()
    }

    async fn list_ids_by_role(
        &self,
        role: Role,
    ) -> Result<Vec<UserId>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<uuid::Uuid> = users::table
            .filter(users::role.eq(role.as_str()))
            .select(users::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }
}
