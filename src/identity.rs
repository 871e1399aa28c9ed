use diesel::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::{schema, store::StoreError, DbPool};

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account already exists for this email")]
    AccountExists,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<diesel::result::Error> for IdentityError {
    fn from(e: diesel::result::Error) -> Self {
        IdentityError::Store(e.into())
    }
}

impl From<diesel::r2d2::PoolError> for IdentityError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        IdentityError::Store(e.into())
    }
}

/// The identity provider that owns passwords. Accounts are keyed by an
/// opaque uid which the user record keeps as its external reference.
pub trait IdentityGateway: Send + Sync {
    fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    fn delete_account(&self, uid: &str) -> Result<(), IdentityError>;
}

/// Keeps bcrypt hashes in the `credentials` table.
pub struct LocalIdentityGateway {
    pool: DbPool,
    cost: u32,
}

impl LocalIdentityGateway {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl IdentityGateway for LocalIdentityGateway {
    fn create_account(&self, new_email: &str, password: &str) -> Result<String, IdentityError> {
        use schema::credentials::dsl::*;

        let mut conn = self.pool.get()?;
        let existing = credentials
            .filter(email.eq(new_email))
            .select(uid)
            .first::<String>(&mut conn)
            .optional()?;
        if existing.is_some() {
            return Err(IdentityError::AccountExists);
        }

        let new_uid = uuid::Uuid::new_v4().to_string();
        let hash = bcrypt::hash(password, self.cost)?;
        diesel::insert_into(credentials)
            .values((uid.eq(&new_uid), email.eq(new_email), password_hash.eq(&hash)))
            .execute(&mut conn)?;
        Ok(new_uid)
    }

    fn sign_in(&self, login_email: &str, password: &str) -> Result<String, IdentityError> {
        use schema::credentials::dsl::*;

        let mut conn = self.pool.get()?;
        let (account, hash) = credentials
            .filter(email.eq(login_email))
            .select((uid, password_hash))
            .first::<(String, String)>(&mut conn)
            .optional()?
            .ok_or(IdentityError::InvalidCredentials)?;
        match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(account),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    fn send_password_reset(&self, reset_email: &str) -> Result<(), IdentityError> {
        use schema::credentials::dsl::*;

        let mut conn = self.pool.get()?;
        let account = credentials
            .filter(email.eq(reset_email))
            .select(uid)
            .first::<String>(&mut conn)
            .optional()?;
        match account {
            Some(account) => info!(uid = %account, "password reset requested"),
            None => info!("password reset requested for unknown email"),
        }
        Ok(())
    }

    fn delete_account(&self, account: &str) -> Result<(), IdentityError> {
        use schema::credentials::dsl::*;

        let mut conn = self.pool.get()?;
        diesel::delete(credentials.filter(uid.eq(account))).execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Gateway for tests that never reach the identity provider.
    pub struct NoIdentity;

    impl IdentityGateway for NoIdentity {
        fn create_account(&self, _: &str, _: &str) -> Result<String, IdentityError> {
            Err(IdentityError::AccountExists)
        }

        fn sign_in(&self, _: &str, _: &str) -> Result<String, IdentityError> {
            Err(IdentityError::InvalidCredentials)
        }

        fn send_password_reset(&self, _: &str) -> Result<(), IdentityError> {
            Ok(())
        }

        fn delete_account(&self, _: &str) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    #[test]
    fn store_failures_surface_as_store_errors() {
        let err: IdentityError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, IdentityError::Store(StoreError::Query(_))));
    }
}
