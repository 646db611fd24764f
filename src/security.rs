//! Password hashing, signed session tokens and password-reset tokens.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use password_hash::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidationError;

use crate::{config::JwtConfig, error::AppError};

/// Lifetime of a password-reset token.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// A stored hash that fails to parse counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// At least 8 ASCII letters or digits, with one lowercase, one uppercase and one digit.
pub fn validate_strong_password(password: &str) -> Result<(), ValidationError> {
    let strong = password.len() >= 8
        && password.chars().all(|c| c.is_ascii_alphanumeric())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        let mut err = ValidationError::new("weak_password");
        err.message = Some(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .into(),
        );
        Err(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub kind: TokenKind,
    /// Makes every issued token distinct, even within the same second.
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// HMAC signing keys plus the configured token lifetimes.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
        }
    }

    pub fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, email, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.issue(user_id, email, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Verifies signature, expiry and that the token is of the expected kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let decoded = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if decoded.claims.kind != expected {
            return Err(TokenError::Invalid);
        }
        Ok(decoded.claims)
    }
}

/// Returns the plain token to hand to the user and the digest to persist.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    let digest = digest_reset_token(&token);
    (token, digest)
}

pub fn digest_reset_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            access_ttl_secs: 60,
            refresh_ttl_secs: 120,
        })
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("Secret123").unwrap();
        assert!(verify_password("Secret123", &hash));
        assert!(!verify_password("secret123", &hash));
        assert!(!verify_password("Secret123", "not-a-phc-string"));
    }

    #[test]
    fn strong_password_rules() {
        assert!(validate_strong_password("Password123").is_ok());
        assert!(validate_strong_password("password123").is_err());
        assert!(validate_strong_password("PASSWORD123").is_err());
        assert!(validate_strong_password("Password").is_err());
        assert!(validate_strong_password("Pass12").is_err());
        assert!(validate_strong_password("Password_123").is_err());
    }

    #[test]
    fn access_token_verifies_as_access_only() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let pair = keys.issue_pair(user_id, "a@b.co").unwrap();

        let claims = keys.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@b.co");

        assert_eq!(
            keys.verify(&pair.access_token, TokenKind::Refresh).unwrap_err(),
            TokenError::Invalid
        );
        assert!(keys.verify(&pair.refresh_token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn consecutive_pairs_differ() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let first = keys.issue_pair(user_id, "a@b.co").unwrap();
        let second = keys.issue_pair(user_id, "a@b.co").unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = keys();
        let token = keys
            .issue(Uuid::new_v4(), "a@b.co", TokenKind::Access, Duration::seconds(-30))
            .unwrap();
        assert_eq!(
            keys.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = TokenKeys::new(&JwtConfig {
            secret: "other".into(),
            access_ttl_secs: 60,
            refresh_ttl_secs: 60,
        });
        let token = other
            .issue(Uuid::new_v4(), "a@b.co", TokenKind::Access, Duration::seconds(60))
            .unwrap();
        assert_eq!(
            keys().verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn reset_token_digest_is_stable_and_not_the_token() {
        let (token, digest) = generate_reset_token();
        assert_eq!(token.len(), 40);
        assert_ne!(token, digest);
        assert_eq!(digest, digest_reset_token(&token));
        let (other, _) = generate_reset_token();
        assert_ne!(token, other);
    }
}
