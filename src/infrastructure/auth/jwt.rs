//! Access and refresh token issuing and verification

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use crate::domain::user::{Role, UserId};
use crate::domain::DomainError;

/// Which half of a token pair a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
    pub username: String,
    /// Only present on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub token_type: TokenType,
    /// Unique per token, so two pairs issued in the same second differ
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Configuration for the token issuer
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret for HS256
    pub secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[hidden]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl TokenConfig {
    /// Config with the default 10 minute access and 7 day refresh lifetimes
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_ttl: Duration::minutes(10),
            refresh_token_ttl: Duration::days(7),
        }
    }

    pub fn with_access_ttl_minutes(mut self, minutes: u64) -> Self {
        self.access_token_ttl = Duration::minutes(minutes as i64);
        self
    }

    pub fn with_refresh_ttl_days(mut self, days: u64) -> Self {
        self.refresh_token_ttl = Duration::days(days as i64);
        self
    }
}

/// Token operations used by the services and the bearer extractor
pub trait TokenService: Send + Sync + Debug {
    /// Sign a new access/refresh pair for a user
    fn issue(&self, user_id: &UserId, username: &str, role: Role) -> Result<TokenPair, DomainError>;

    /// True unless the token has a valid signature and has not yet expired
    fn is_expired(&self, token: &str) -> bool;

    /// Verify an access token and return its claims
    fn verify_access(&self, token: &str) -> Result<TokenClaims, DomainError>;

    /// Verify a refresh token and return its claims
    fn verify_refresh(&self, token: &str) -> Result<TokenClaims, DomainError>;
}

/// HS256 token issuer
#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .field("clock", &self.clock)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer reading the wall clock
    pub fn new(config: TokenConfig) -> Result<Self, DomainError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an issuer reading time from `clock`
    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        if config.secret.is_empty() {
            return Err(DomainError::signing("Signing secret must not be empty"));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        })
    }

    fn sign(
        &self,
        user_id: &UserId,
        username: &str,
        role: Option<Role>,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String, DomainError> {
        let now = self.clock.now();

        let claims = TokenClaims {
            user_id: user_id.as_str().to_string(),
            username: username.to_string(),
            role,
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::signing(format!("Failed to sign token: {}", e)))
    }

    /// Check the signature and decode claims; expiry is checked against our clock
    fn decode_claims(&self, token: &str) -> Result<TokenClaims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::unauthorized(format!("Invalid token: {}", e)))
    }

    fn has_expired(&self, claims: &TokenClaims) -> bool {
        self.clock.now().timestamp() >= claims.exp
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<TokenClaims, DomainError> {
        let claims = self.decode_claims(token)?;

        if self.has_expired(&claims) {
            return Err(DomainError::unauthorized("Token has expired"));
        }

        if claims.token_type != expected {
            return Err(DomainError::unauthorized("Wrong token type"));
        }

        Ok(claims)
    }
}

impl TokenService for TokenIssuer {
    fn issue(&self, user_id: &UserId, username: &str, role: Role) -> Result<TokenPair, DomainError> {
        let access_token = self.sign(
            user_id,
            username,
            Some(role),
            TokenType::Access,
            self.config.access_token_ttl,
        )?;

        let refresh_token = self.sign(
            user_id,
            username,
            None,
            TokenType::Refresh,
            self.config.refresh_token_ttl,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn is_expired(&self, token: &str) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => self.has_expired(&claims),
            Err(_) => true,
        }
    }

    fn verify_access(&self, token: &str) -> Result<TokenClaims, DomainError> {
        self.verify(token, TokenType::Access)
    }

    fn verify_refresh(&self, token: &str) -> Result<TokenClaims, DomainError> {
        self.verify(token, TokenType::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::ManualClock;

    const SECRET: &str = "test-secret-key-for-testing-only";

    fn user_id() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn issuer_with_clock() -> (TokenIssuer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let issuer = TokenIssuer::with_clock(TokenConfig::new(SECRET), clock.clone()).unwrap();
        (issuer, clock)
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let result = TokenIssuer::new(TokenConfig::new(""));
        assert!(matches!(result, Err(DomainError::Signing { .. })));
    }

    #[test]
    fn test_issue_claims() {
        let (issuer, clock) = issuer_with_clock();
        let now = clock.now().timestamp();

        let pair = issuer.issue(&user_id(), "alice", Role::User).unwrap();

        let access = issuer.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.user_id, "user-1");
        assert_eq!(access.username, "alice");
        assert_eq!(access.role, Some(Role::User));
        assert_eq!(access.exp - now, 600);

        let refresh = issuer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.role, None);
        assert_eq!(refresh.exp - now, 7 * 24 * 3600);
    }

    #[test]
    fn test_pairs_issued_together_differ() {
        let (issuer, _) = issuer_with_clock();

        let first = issuer.issue(&user_id(), "alice", Role::User).unwrap();
        let second = issuer.issue(&user_id(), "alice", Role::User).unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let (issuer, _) = issuer_with_clock();
        let pair = issuer.issue(&user_id(), "alice", Role::User).unwrap();

        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(DomainError::Unauthorized { .. })
        ));
        assert!(matches!(
            issuer.verify_refresh(&pair.access_token),
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_access_expires_after_ten_minutes() {
        let (issuer, clock) = issuer_with_clock();
        let pair = issuer.issue(&user_id(), "alice", Role::User).unwrap();

        clock.advance(Duration::minutes(9));
        assert!(!issuer.is_expired(&pair.access_token));

        clock.advance(Duration::minutes(2));
        assert!(issuer.is_expired(&pair.access_token));
        assert!(issuer.verify_access(&pair.access_token).is_err());
        assert!(!issuer.is_expired(&pair.refresh_token));
    }

    #[test]
    fn test_refresh_expires_after_seven_days() {
        let (issuer, clock) = issuer_with_clock();
        let pair = issuer.issue(&user_id(), "alice", Role::User).unwrap();

        clock.advance(Duration::days(7) + Duration::seconds(1));

        assert!(issuer.is_expired(&pair.refresh_token));
        assert!(issuer.verify_refresh(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_configurable_lifetimes() {
        let clock = Arc::new(ManualClock::default());
        let config = TokenConfig::new(SECRET)
            .with_access_ttl_minutes(1)
            .with_refresh_ttl_days(1);
        let issuer = TokenIssuer::with_clock(config, clock.clone()).unwrap();

        let pair = issuer.issue(&user_id(), "alice", Role::User).unwrap();
        clock.advance(Duration::minutes(2));

        assert!(issuer.is_expired(&pair.access_token));
        assert!(!issuer.is_expired(&pair.refresh_token));
    }

    #[test]
    fn test_is_expired_fails_closed() {
        let (issuer, _) = issuer_with_clock();

        assert!(issuer.is_expired(""));
        assert!(issuer.is_expired("not.a.jwt"));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let (issuer, _) = issuer_with_clock();
        let other = TokenIssuer::new(TokenConfig::new("another-secret")).unwrap();

        let pair = other.issue(&user_id(), "alice", Role::User).unwrap();

        assert!(issuer.is_expired(&pair.refresh_token));
        assert!(issuer.verify_access(&pair.access_token).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let (issuer, _) = issuer_with_clock();

        let output = format!("{:?}", issuer);
        assert!(!output.contains(SECRET));
        assert!(output.contains("[hidden]"));
    }
}
