//! Bearer tokens signed with the platform Ed25519 key.

use std::time::Duration;

use chrono::Utc;
use emporium_crypto::{open_token, seal_token, CryptoError, SigningKey, SigningKeyManager, VerifyingKey};
use emporium_store::{constants::KEYS_COLLECTION, Store, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, trace};

use crate::{models::Role, ApiError, ApiResult};

/// Id of the signing key document in the platform `.keys` collection.
const SIGNING_KEY_ID: &str = "token-signing";

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub:    String,
    pub tenant: String,
    pub role:   Role,
    /// Issued at, seconds since the epoch.
    pub iat:    i64,
    /// Expiry, seconds since the epoch.
    pub exp:    i64,
}

/// Issues and checks bearer tokens.
pub struct TokenService {
    signing_key:   SigningKey,
    verifying_key: VerifyingKey,
    ttl:           Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("verifying_key", &self.verifying_key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(signing_key: SigningKey, ttl: Duration) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            ttl,
        }
    }

    /// Uses the configured key, or the one persisted in the platform store,
    /// generating and persisting a new key on first start.
    pub async fn load_or_create(platform: &Store, configured: Option<&str>, ttl: Duration) -> ApiResult<Self> {
        if let Some(hex) = configured {
            debug!("Using configured token signing key");
            return Ok(Self::new(SigningKeyManager::import_key(hex)?, ttl));
        }

        let keys = platform.collection(KEYS_COLLECTION).await?;
        if let Some(doc) = keys.get(SIGNING_KEY_ID).await? {
            let hex = doc.data()["key"]
                .as_str()
                .ok_or_else(|| ApiError::internal("stored signing key is malformed"))?;
            debug!("Loaded token signing key from platform store");
            return Ok(Self::new(SigningKeyManager::import_key(hex)?, ttl));
        }

        let key = SigningKeyManager::generate_key();
        match keys
            .insert(
                SIGNING_KEY_ID,
                json!({ "key": SigningKeyManager::export_key(&key) }),
            )
            .await
        {
            Ok(_) => {
                info!("Generated a new token signing key");
                Ok(Self::new(key, ttl))
            },
            // Another process won the race; use its key
            Err(StoreError::DocumentAlreadyExists { .. }) => Box::pin(Self::load_or_create(platform, None, ttl)).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Signs a token for `user_id` in `tenant`.
    pub fn issue(&self, user_id: &str, tenant: &str, role: Role) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_owned(),
            tenant: tenant.to_owned(),
            role,
            iat,
            exp: iat.saturating_add(ttl),
        };
        trace!("Issuing token for user {} in tenant {}", user_id, tenant);
        Ok(seal_token(&serde_json::to_value(&claims)?, &self.signing_key)?)
    }

    /// Checks the signature and expiry of a token.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let payload = open_token(token, &self.verifying_key).map_err(|e| {
            if matches!(e, CryptoError::MalformedToken | CryptoError::VerificationFailed) {
                ApiError::unauthorized("Invalid token")
            }
            else {
                ApiError::from(e)
            }
        })?;
        let claims: Claims =
            serde_json::from_value(payload).map_err(|_| ApiError::unauthorized("Invalid token"))?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(ApiError::unauthorized("Token expired"));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use emporium_store::StoreConfig;

    use super::*;

    fn service(ttl: Duration) -> TokenService { TokenService::new(SigningKeyManager::generate_key(), ttl) }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service(Duration::from_secs(60));
        let token = tokens.issue("u1", "acme", Role::Admin).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.tenant, "acme");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_rejects_foreign_tampered_and_expired_tokens() {
        let tokens = service(Duration::from_secs(60));
        let other = service(Duration::from_secs(60));
        let token = other.issue("u1", "acme", Role::Customer).unwrap();
        assert!(matches!(tokens.verify(&token), Err(ApiError::Unauthorized { .. })));
        assert!(matches!(tokens.verify("garbage"), Err(ApiError::Unauthorized { .. })));
        assert!(matches!(tokens.verify("zz.zz"), Err(ApiError::Unauthorized { .. })));

        let expired = service(Duration::ZERO);
        let token = expired.issue("u1", "acme", Role::Customer).unwrap();
        assert!(matches!(
            expired.verify(&token),
            Err(ApiError::Unauthorized { ref message }) if message == "Token expired"
        ));
    }

    #[tokio::test]
    async fn test_signing_key_is_persisted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::open(temp_dir.path(), StoreConfig::default())
            .await
            .unwrap();
        let ttl = Duration::from_secs(60);

        let first = TokenService::load_or_create(&store, None, ttl).await.unwrap();
        let token = first.issue("u1", "acme", Role::Customer).unwrap();

        let second = TokenService::load_or_create(&store, None, ttl).await.unwrap();
        assert!(second.verify(&token).is_ok());
    }

    #[tokio::test]
    async fn test_configured_key_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::open(temp_dir.path(), StoreConfig::default())
            .await
            .unwrap();
        let key = SigningKeyManager::generate_key();
        let hex = SigningKeyManager::export_key(&key);

        let tokens = TokenService::load_or_create(&store, Some(&hex), Duration::from_secs(60))
            .await
            .unwrap();
        let direct = TokenService::new(key, Duration::from_secs(60));
        let token = direct.issue("u1", "acme", Role::Customer).unwrap();
        assert!(tokens.verify(&token).is_ok());
        assert!(store.collection(KEYS_COLLECTION).await.unwrap().get(SIGNING_KEY_ID).await.unwrap().is_none());
    }
}
