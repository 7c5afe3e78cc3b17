//! Credential store: account lookup, creation and password checks.

use tracing::{debug, info};

use crate::auth::password::{hash_password, password_matches};
use crate::config::SeedUser;
use crate::db::{DbPool, NewUser, User, UserRepository};
use crate::{CloudStoreError, Result};

/// Account operations over the users table.
pub struct CredentialStore<'a> {
    pool: &'a DbPool,
}

impl<'a> CredentialStore<'a> {
    /// Create a new credential store over the given pool.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Check a raw password against a stored hash.
    pub fn verify(&self, raw_password: &str, stored_hash: &str) -> bool {
        password_matches(raw_password, stored_hash)
    }

    /// Create an account, hashing the password.
    ///
    /// Fails with `AlreadyExists` if the username is taken.
    pub async fn create(&self, username: &str, raw_password: &str) -> Result<User> {
        let repo = UserRepository::new(self.pool);
        if repo.username_exists(username).await? {
            return Err(CloudStoreError::AlreadyExists(format!("user {username}")));
        }

        let hash =
            hash_password(raw_password).map_err(|e| CloudStoreError::Internal(e.to_string()))?;
        repo.create(&NewUser::new(username, hash)).await
    }

    /// Look up an account by username.
    pub async fn lookup(&self, username: &str) -> Result<User> {
        UserRepository::new(self.pool)
            .get_by_username(username)
            .await?
            .ok_or_else(|| CloudStoreError::NotFound(format!("user {username}")))
    }

    /// Check a login/password pair.
    ///
    /// Unknown users and wrong passwords both fail with `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> Result<User> {
        let user = match self.lookup(username).await {
            Ok(user) => user,
            Err(CloudStoreError::NotFound(_)) => {
                debug!(user = %username, "Login for unknown user");
                return Err(CloudStoreError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !self.verify(raw_password, &user.password) {
            debug!(user = %username, "Password mismatch");
            return Err(CloudStoreError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Create each seed account that does not exist yet.
    ///
    /// Existing accounts are never overwritten. Returns how many accounts
    /// were created.
    pub async fn seed_default_accounts(&self, seeds: &[SeedUser]) -> Result<usize> {
        let mut created = 0;
        for seed in seeds {
            match self.create(&seed.username, &seed.password).await {
                Ok(_) => {
                    info!(user = %seed.username, "Seeded default account");
                    created += 1;
                }
                // Lost a race with another bootstrap, or already present.
                Err(CloudStoreError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}
