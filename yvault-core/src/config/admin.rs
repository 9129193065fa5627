//! Admin secret hashing and verification.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Prefix of an argon2 PHC string.
const ARGON2_PREFIX: &str = "$argon2";

/// Credentials checked on every admin API request.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    secret_hash: String,
}

impl AdminCredentials {
    /// Wrap an argon2 PHC hash string.
    pub fn from_hash(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Whether `value` already is an argon2 hash rather than a plaintext secret.
    pub fn is_hashed(value: &str) -> bool {
        value.starts_with(ARGON2_PREFIX)
    }

    /// Check a presented plaintext secret.
    pub fn verify(&self, presented: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(presented.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hash a plaintext secret into an argon2 PHC string.
pub fn hash_secret(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_secret("vault-admin").unwrap();
        assert!(AdminCredentials::is_hashed(&hash));

        let credentials = AdminCredentials::from_hash(hash);
        assert!(credentials.verify("vault-admin"));
        assert!(!credentials.verify("vault-admin "));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let credentials = AdminCredentials::from_hash("plaintext".to_owned());
        assert!(!AdminCredentials::is_hashed("plaintext"));
        assert!(!credentials.verify("plaintext"));
    }
}
