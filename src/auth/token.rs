//! Token registry: opaque bearer tokens with expiry and an active flag.
//!
//! A token is valid iff it is active and `now < expires_at`. Validity is
//! computed on every lookup and never cached.

use chrono::{Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::datetime::{now_db_string, to_db_string};
use crate::db::{DbPool, NewToken, TokenRepository, User, UserRepository};
use crate::{CloudStoreError, Result};

/// Request header carrying the bearer token.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// The single capability granted to every authenticated user.
pub const ROLE_USER: &str = "USER";

/// Default token lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;

const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Identity resolved from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Owning user ID.
    pub user_id: i64,
    /// Owning username.
    pub username: String,
    /// Fixed role.
    pub role: &'static str,
}

impl Principal {
    fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: ROLE_USER,
        }
    }
}

/// Extract the token from an `auth-token` header value.
///
/// Accepts an optional `Bearer` prefix. Returns `None` for a blank value,
/// including a bare `Bearer`.
pub fn parse_token_header(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => value,
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Issues, validates and revokes tokens.
pub struct TokenRegistry<'a> {
    pool: &'a DbPool,
    ttl: Duration,
}

impl<'a> TokenRegistry<'a> {
    /// Create a registry with the default 24 hour lifetime.
    pub fn new(pool: &'a DbPool) -> Self {
        Self::with_ttl(pool, Duration::hours(DEFAULT_TOKEN_TTL_HOURS as i64))
    }

    /// Create a registry with a custom token lifetime.
    pub fn with_ttl(pool: &'a DbPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Issue a new active token for the user.
    pub async fn issue(&self, user: &User) -> Result<String> {
        self.issue_with(user, || Uuid::new_v4().to_string()).await
    }

    async fn issue_with(&self, user: &User, generate: impl Fn() -> String) -> Result<String> {
        let repo = TokenRepository::new(self.pool);
        let expires_at = to_db_string(&(Utc::now() + self.ttl));

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let new_token = NewToken {
                user_id: user.id,
                token: generate(),
                expires_at: expires_at.clone(),
            };
            match repo.create(&new_token).await {
                Ok(token) => {
                    debug!(user = %user.username, expires_at = %token.expires_at, "Issued token");
                    return Ok(token.token);
                }
                Err(CloudStoreError::AlreadyExists(_)) => {
                    warn!(attempt, "Generated token collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CloudStoreError::Database(
            "could not generate a unique token".to_string(),
        ))
    }

    /// Resolve the identity behind a token.
    ///
    /// Returns `None` for an absent, deactivated or expired token.
    pub async fn resolve_identity(&self, token: Option<&str>) -> Result<Option<Principal>> {
        let Some(token) = token else {
            return Ok(None);
        };

        let Some(record) = TokenRepository::new(self.pool)
            .get_valid_token(token, &now_db_string())
            .await?
        else {
            return Ok(None);
        };

        let user = UserRepository::new(self.pool)
            .get_by_id(record.user_id)
            .await?;
        Ok(user.as_ref().map(Principal::for_user))
    }

    /// Check whether a token is currently valid.
    ///
    /// Fails closed: storage errors count as invalid.
    pub async fn validate(&self, token: Option<&str>) -> bool {
        match self.resolve_identity(token).await {
            Ok(principal) => principal.is_some(),
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                false
            }
        }
    }

    /// Deactivate a token.
    ///
    /// Revoking an unknown or already deactivated token is a no-op.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        if !TokenRepository::new(self.pool).deactivate(token).await? {
            debug!("Revoke matched no active token");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;
    use crate::Database;

    async fn setup() -> (Database, User) {
        let db = Database::open_in_memory().await.unwrap();
        let user = CredentialStore::new(db.pool())
            .create("user@example.com", "password")
            .await
            .unwrap();
        (db, user)
    }

    #[test]
    fn test_parse_token_header() {
        assert_eq!(parse_token_header("abc"), Some("abc"));
        assert_eq!(parse_token_header("Bearer abc"), Some("abc"));
        assert_eq!(parse_token_header("  Bearer  abc "), Some("abc"));
        assert_eq!(parse_token_header(""), None);
        assert_eq!(parse_token_header("Bearer "), None);
        assert_eq!(parse_token_header("   "), None);
        assert_eq!(parse_token_header("Bearer"), None);
        assert_eq!(parse_token_header("Bearer\tabc"), Some("abc"));
        assert_eq!(parse_token_header("Bearerabc"), Some("Bearerabc"));
    }

    #[tokio::test]
    async fn test_issue_then_validate() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        let token = registry.issue(&user).await.unwrap();
        assert!(!token.is_empty());
        assert!(Uuid::parse_str(&token).is_ok());
        assert!(registry.validate(Some(&token)).await);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        let t1 = registry.issue(&user).await.unwrap();
        let t2 = registry.issue(&user).await.unwrap();
        assert_ne!(t1, t2);
        // Multiple sessions stay valid at once
        assert!(registry.validate(Some(&t1)).await);
        assert!(registry.validate(Some(&t2)).await);
    }

    #[tokio::test]
    async fn test_issue_sets_ttl() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        let before = Utc::now();
        let token = registry.issue(&user).await.unwrap();
        let record = TokenRepository::new(db.pool())
            .get_by_token(&token)
            .await
            .unwrap()
            .unwrap();

        let expires = crate::datetime::parse_db_string(&record.expires_at).unwrap();
        assert!(expires > before + Duration::hours(24) - Duration::seconds(1));
        assert!(expires <= Utc::now() + Duration::hours(24));
    }

    #[tokio::test]
    async fn test_absent_token_is_invalid() {
        let (db, _) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        assert!(!registry.validate(None).await);
        assert!(!registry.validate(Some("never-issued")).await);
        assert!(registry.resolve_identity(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        let token = registry.issue(&user).await.unwrap();
        registry.revoke(&token).await.unwrap();
        assert!(!registry.validate(Some(&token)).await);

        // Idempotent
        registry.revoke(&token).await.unwrap();
        registry.revoke("never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_only_touches_one_token() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        let t1 = registry.issue(&user).await.unwrap();
        let t2 = registry.issue(&user).await.unwrap();
        registry.revoke(&t1).await.unwrap();

        assert!(!registry.validate(Some(&t1)).await);
        assert!(registry.validate(Some(&t2)).await);
    }

    #[tokio::test]
    async fn test_expired_token_is_invalid() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::with_ttl(db.pool(), Duration::zero());

        let token = registry.issue(&user).await.unwrap();
        let record = TokenRepository::new(db.pool())
            .get_by_token(&token)
            .await
            .unwrap()
            .unwrap();
        assert!(record.active);
        assert!(!registry.validate(Some(&token)).await);
    }

    #[tokio::test]
    async fn test_resolve_identity() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        let token = registry.issue(&user).await.unwrap();
        let principal = registry.resolve_identity(Some(&token)).await.unwrap().unwrap();

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.username, "user@example.com");
        assert_eq!(principal.role, ROLE_USER);
    }

    #[tokio::test]
    async fn test_issue_retries_on_collision() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        registry.issue_with(&user, || "fixed".to_string()).await.unwrap();

        let attempts = std::sync::atomic::AtomicUsize::new(0);
        let token = registry
            .issue_with(&user, || {
                let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if n == 0 {
                    "fixed".to_string()
                } else {
                    "fresh".to_string()
                }
            })
            .await
            .unwrap();
        assert_eq!(token, "fresh");
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_issue_gives_up_after_repeated_collisions() {
        let (db, user) = setup().await;
        let registry = TokenRegistry::new(db.pool());

        registry.issue_with(&user, || "fixed".to_string()).await.unwrap();
        let result = registry.issue_with(&user, || "fixed".to_string()).await;
        assert!(matches!(result, Err(CloudStoreError::Database(_))));
    }
}
