//! Argon2 password hashing implementation.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use scribe_core::ports::{AuthError, PasswordService};

/// Argon2id password service.
///
/// Hashes are PHC strings, so the salt and cost parameters travel with the
/// hash and older hashes keep verifying after the parameters change.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Use explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = %e, "Stored password hash could not be parsed");
            AuthError::CorruptHash(e.to_string())
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash is unsupported");
                Err(AuthError::CorruptHash(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters keep the test suite fast.
    fn service() -> Argon2PasswordService {
        Argon2PasswordService::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = service();
        let password = "secure_password_123";

        let hash = service.hash(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, password);
        assert!(service.verify(password, &hash).unwrap());
        assert!(!service.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differ() {
        let service = service();

        let first = service.hash("secret123").unwrap();
        let second = service.hash("secret123").unwrap();

        assert_ne!(first, second);
        assert!(service.verify("secret123", &first).unwrap());
        assert!(service.verify("secret123", &second).unwrap());
    }

    #[test]
    fn test_different_passwords_do_not_cross_verify() {
        let service = service();

        let hash_a = service.hash("password-a").unwrap();
        let hash_b = service.hash("password-b").unwrap();

        assert_ne!(hash_a, hash_b);
        assert!(!service.verify("password-a", &hash_b).unwrap());
        assert!(!service.verify("password-b", &hash_a).unwrap());
    }

    #[test]
    fn test_default_params_verify_cheap_hash() {
        let hash = service().hash("secret123").unwrap();
        assert!(Argon2PasswordService::new().verify("secret123", &hash).unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_distinct_error() {
        let service = service();

        let result = service.verify("anything", "not-a-valid-hash");
        assert!(matches!(result, Err(AuthError::CorruptHash(_))));

        let result = service.verify("anything", "$md5$abc$def");
        assert!(matches!(result, Err(AuthError::CorruptHash(_))));
    }
}
