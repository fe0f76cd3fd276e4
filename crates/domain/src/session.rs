//! Access and refresh tokens.
//!
//! Tokens are HS256-signed JWTs, so any instance holding the secrets can
//! verify them and they survive restarts. Refresh rotation is enforced by
//! the user service, which stores the one refresh token it will accept.

use chrono::{Duration, Utc};
use document_store::DocumentId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Tokens handed to a client on login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies session tokens keyed by user id.
pub trait SessionService: Send + Sync {
    /// Issues a fresh pair for the user.
    fn issue(&self, user: DocumentId) -> Result<TokenPair>;

    /// Resolves an access token to its user.
    fn verify_access(&self, token: &str) -> Result<DocumentId>;

    /// Resolves a refresh token to its user.
    fn verify_refresh(&self, token: &str) -> Result<DocumentId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: DocumentId,
    exp: u64,
    iat: u64,
    /// Makes two pairs issued within the same second distinct.
    jti: String,
    token_type: TokenKind,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// JWT sessions with separate secrets for access and refresh tokens.
pub struct JwtSessionService {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl JwtSessionService {
    /// Access tokens last a day and refresh tokens ten days unless
    /// [`with_ttls`](Self::with_ttls) says otherwise.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            access: SigningKey::new(access_secret, Duration::days(1)),
            refresh: SigningKey::new(refresh_secret, Duration::days(10)),
            validation,
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access.ttl = access_ttl;
        self.refresh.ttl = refresh_ttl;
        self
    }

    fn sign(&self, user: DocumentId, kind: TokenKind) -> Result<String> {
        let key = self.key(kind);
        let now = Utc::now();
        let claims = Claims {
            sub: user,
            exp: (now + key.ttl).timestamp().max(0) as u64,
            iat: now.timestamp().max(0) as u64,
            jti: Uuid::new_v4().simple().to_string(),
            token_type: kind,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &key.encoding)
            .map_err(|e| DomainError::Internal(format!("cannot sign token: {e}")))
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<DocumentId> {
        let data = decode::<Claims>(token, &self.key(kind).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    DomainError::Unauthorized("token has expired".to_string())
                }
                _ => DomainError::Unauthorized("invalid token".to_string()),
            })?;
        if data.claims.token_type != kind {
            return Err(DomainError::Unauthorized("invalid token".to_string()));
        }
        Ok(data.claims.sub)
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

impl SessionService for JwtSessionService {
    fn issue(&self, user: DocumentId) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(user, TokenKind::Access)?,
            refresh_token: self.sign(user, TokenKind::Refresh)?,
        })
    }

    fn verify_access(&self, token: &str) -> Result<DocumentId> {
        self.verify(token, TokenKind::Access)
    }

    fn verify_refresh(&self, token: &str) -> Result<DocumentId> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> JwtSessionService {
        JwtSessionService::new("access-secret", "refresh-secret")
    }

    #[test]
    fn tokens_resolve_to_their_user_and_kind() {
        let sessions = sessions();
        let user = DocumentId::new();
        let pair = sessions.issue(user).unwrap();

        assert_eq!(sessions.verify_access(&pair.access_token).unwrap(), user);
        assert_eq!(sessions.verify_refresh(&pair.refresh_token).unwrap(), user);
        assert!(sessions.verify_access(&pair.refresh_token).is_err());
        assert!(sessions.verify_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn token_type_is_checked_when_secrets_match() {
        let sessions = JwtSessionService::new("shared", "shared");
        let pair = sessions.issue(DocumentId::new()).unwrap();
        assert!(sessions.verify_access(&pair.refresh_token).is_err());
    }

    #[test]
    fn another_instance_with_the_same_secrets_accepts_tokens() {
        let user = DocumentId::new();
        let pair = sessions().issue(user).unwrap();
        assert_eq!(sessions().verify_access(&pair.access_token).unwrap(), user);

        let stranger = JwtSessionService::new("other", "other");
        assert!(stranger.verify_access(&pair.access_token).is_err());
    }

    #[test]
    fn pairs_are_distinct() {
        let sessions = sessions();
        let user = DocumentId::new();
        let first = sessions.issue(user).unwrap();
        let second = sessions.issue(user).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let sessions = sessions().with_ttls(Duration::seconds(-120), Duration::days(1));
        let pair = sessions.issue(DocumentId::new()).unwrap();
        let err = sessions.verify_access(&pair.access_token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(msg) if msg.contains("expired")));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = sessions().verify_access("not-a-token").unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(msg) if msg == "invalid token"));
    }
}
