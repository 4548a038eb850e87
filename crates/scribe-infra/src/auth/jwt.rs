//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scribe_core::ports::{AuthError, TokenClaims, TokenService};

/// Secret used when none is configured. Refused in production.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            expiration_minutes: 30,
            issuer: "scribe-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_JWT_SECRET
    }
}

/// Internal JWT claims structure for serialization.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 JWT token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed(err.to_string()),
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.issue_with_ttl(user_id, TimeDelta::minutes(self.config.expiration_minutes))
    }

    fn issue_with_ttl(&self, user_id: Uuid, ttl: TimeDelta) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                let err = map_decode_error(e);
                tracing::debug!(error = %err, "Token rejected");
                err
            })?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AuthError::Malformed(format!("subject is not a user id: {}", e)))?;

        Ok(TokenClaims {
            user_id,
            issued_at: token_data.claims.iat,
            expires_at: token_data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_minutes: 30,
            issuer: "test-issuer".to_string(),
        }
    }

    #[test]
    fn test_issue_then_validate() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(service.validate(&token), Ok(user_id));
    }

    #[test]
    fn test_encode_failure_is_token_creation() {
        let mut service = JwtTokenService::new(test_config());
        // An RSA key cannot sign HS256 tokens.
        service.encoding_key = EncodingKey::from_rsa_der(b"not-a-key");

        let result = service.issue(Uuid::new_v4());

        assert!(matches!(result, Err(AuthError::TokenCreation(_))));
        assert!(!result.unwrap_err().is_rejection());
    }

    #[test]
    fn test_decode_claims() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.expires_at - claims.issued_at, 30 * 60);
    }

    #[test]
    fn test_expired_token() {
        let service = JwtTokenService::new(test_config());

        let token = service
            .issue_with_ttl(Uuid::new_v4(), TimeDelta::seconds(-5))
            .unwrap();

        assert_eq!(service.validate(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = JwtTokenService::new(test_config());

        assert!(matches!(
            service.validate("invalid-token"),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(service.validate(""), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let service = JwtTokenService::new(test_config());
        let other = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });

        let token = other.issue(Uuid::new_v4()).unwrap();

        assert_eq!(service.validate(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_wrong_issuer_token() {
        let service1 = JwtTokenService::new(JwtConfig {
            issuer: "issuer1".to_string(),
            ..test_config()
        });
        let service2 = JwtTokenService::new(JwtConfig {
            issuer: "issuer2".to_string(),
            ..test_config()
        });

        let token = service1.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(
            service2.validate(&token),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_uuid_subject_is_malformed() {
        let config = test_config();
        let claims = Claims {
            sub: "42".to_string(),
            exp: (Utc::now() + TimeDelta::minutes(5)).timestamp(),
            iat: Utc::now().timestamp(),
            iss: config.issuer.clone(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let service = JwtTokenService::new(config);
        assert!(matches!(
            service.validate(&token),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_tampering_any_byte_never_validates() {
        let service = JwtTokenService::new(test_config());
        let token = service.issue(Uuid::new_v4()).unwrap();
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            let mut tampered = bytes.to_vec();
            // Swap within the base64url alphabet; keep separators as they are
            // except for the dot itself, which becomes a letter.
            tampered[i] = match tampered[i] {
                b'A' => b'B',
                _ => b'A',
            };
            let tampered = String::from_utf8(tampered).unwrap();
            if tampered == token {
                continue;
            }

            match service.validate(&tampered) {
                Err(AuthError::InvalidSignature) | Err(AuthError::Malformed(_)) => {}
                other => panic!("byte {} tampered, got {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_expiration_seconds() {
        let service = JwtTokenService::new(test_config());
        assert_eq!(service.expiration_seconds(), 1800);
    }
}
