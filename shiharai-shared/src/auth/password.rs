//! Password hashing module using Argon2id
//!
//! Flows depend on the [`PasswordHasher`] trait so tests can substitute a
//! cheap implementation; production wires in [`Argon2Hasher`].
//!
//! # Security
//!
//! - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
//! - **Memory**: 64 MB (65536 KB)
//! - **Iterations**: 3 passes
//! - **Parallelism**: 4 lanes
//! - **Output**: 32-byte hash
//!
//! Hashing is deliberately slow. Callers on an async runtime should run it
//! through `tokio::task::spawn_blocking`.
//!
//! # Example
//!
//! ```
//! use shiharai_shared::auth::password::{Argon2Hasher, PasswordHasher};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hasher = Argon2Hasher::default();
//! let hash = hasher.hash("super_secret_password_123")?;
//!
//! assert!(hasher.verify("super_secret_password_123", &hash)?);
//! assert!(!hasher.verify("wrong_password", &hash)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, Params, ParamsBuilder, PasswordHasher as _, PasswordVerifier as _, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// One-way salted password hashing with a constant-effort compare
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing string
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Checks a plaintext password against a stored hash
    ///
    /// Returns `Ok(false)` on mismatch. Errors are reserved for hashes that
    /// cannot be parsed or verification faults.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id hasher producing PHC strings
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Memory cost in KiB
    pub const MEMORY_KIB: u32 = 65536;

    /// Number of passes
    pub const ITERATIONS: u32 = 3;

    /// Parallel lanes
    pub const PARALLELISM: u32 = 4;

    /// Hash output length in bytes
    pub const OUTPUT_LEN: usize = 32;

    /// Creates a hasher with explicit parameters
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if argon2 rejects the parameters
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(memory_kib)
            .t_cost(iterations)
            .p_cost(parallelism)
            .output_len(Self::OUTPUT_LEN)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        let params = ParamsBuilder::new()
            .m_cost(Self::MEMORY_KIB)
            .t_cost(Self::ITERATIONS)
            .p_cost(Self::PARALLELISM)
            .output_len(Self::OUTPUT_LEN)
            .build()
            .unwrap_or_default();

        Self { params }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        // Parameters are read back from the PHC string
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small parameters keep the suite fast; the PHC output is still Argon2id.
    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(1024, 1, 1).expect("valid parameters")
    }

    #[test]
    fn test_default_parameters() {
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_produces_different_salts() {
        let hasher = fast_hasher();

        let hash1 = hasher.hash("same_password").expect("Hash 1 should succeed");
        let hash2 = hasher.hash("same_password").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct_password").unwrap();

        assert!(hasher.verify("correct_password", &hash).unwrap());
        assert!(!hasher.verify("wrong_password", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = fast_hasher();

        assert!(matches!(
            hasher.verify("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        // Parses as a PHC string without a hash part, so it is a mismatch
        assert!(!hasher.verify("password", "$argon2id$invalid").unwrap());
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hasher = fast_hasher();
        let passwords = vec![
            "simple",
            "with spaces",
            "with-special-chars!@#$%",
            "unicode-密码-パスワード",
            "very_long_password_that_is_longer_than_usual_passwords_123456789",
        ];

        for password in passwords {
            let hash = hasher.hash(password).expect("Hash should succeed");
            let verified = hasher.verify(password, &hash).expect("Verify should succeed");
            assert!(verified, "Password '{}' should verify", password);
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(
            Argon2Hasher::with_params(1, 0, 0),
            Err(PasswordError::HashError(_))
        ));
    }
}
