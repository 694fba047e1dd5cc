use crate::error::{AuthError, AuthResult};
use auth_data::entities::SaltedHash;
use rand::{thread_rng, RngCore};
use ring::pbkdf2;
use std::num::NonZeroU32;

static PBKDF2_ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const CREDENTIAL_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

pub const DEFAULT_ITERATIONS: u32 = 100_000;
pub const DEFAULT_SALT_LENGTH: usize = 32;

pub trait HashingService: Send + Sync {
    /// Hash with a freshly generated salt
    fn hash_password(&self, value: &str) -> SaltedHash;
    /// Constant-time check of `value` against a stored hash
    fn verify(&self, value: &str, salted_hash: &SaltedHash) -> bool;
    fn hash_with_salt(&self, value: &str, salt: &str) -> AuthResult<String>;
}

/// PBKDF2-HMAC-SHA256 password hashing
#[derive(Clone)]
pub struct Pbkdf2HashingService {
    salt_length: usize,
    iterations: NonZeroU32,
}

impl Pbkdf2HashingService {
    pub fn new(salt_length: usize, iterations: NonZeroU32) -> Self {
        Pbkdf2HashingService {
            salt_length,
            iterations,
        }
    }

    fn derive(&self, salt: &[u8], value: &str) -> [u8; CREDENTIAL_LEN] {
        let mut hash = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            PBKDF2_ALGORITHM,
            self.iterations,
            salt,
            value.as_bytes(),
            &mut hash,
        );
        hash
    }
}

impl Default for Pbkdf2HashingService {
    fn default() -> Self {
        Pbkdf2HashingService {
            salt_length: DEFAULT_SALT_LENGTH,
            iterations: NonZeroU32::new(DEFAULT_ITERATIONS).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl HashingService for Pbkdf2HashingService {
    fn hash_password(&self, value: &str) -> SaltedHash {
        let mut salt = vec![0u8; self.salt_length];
        thread_rng().fill_bytes(&mut salt);

        let hash = self.derive(&salt, value);

        SaltedHash {
            hash: hex::encode(hash),
            salt: hex::encode(salt),
        }
    }

    fn verify(&self, value: &str, salted_hash: &SaltedHash) -> bool {
        let (Ok(salt), Ok(expected)) = (
            hex::decode(&salted_hash.salt),
            hex::decode(&salted_hash.hash),
        ) else {
            tracing::warn!("Stored salted hash is not valid hex");
            return false;
        };

        pbkdf2::verify(
            PBKDF2_ALGORITHM,
            self.iterations,
            &salt,
            value.as_bytes(),
            &expected,
        )
        .is_ok()
    }

    fn hash_with_salt(&self, value: &str, salt: &str) -> AuthResult<String> {
        let salt = hex::decode(salt)
            .map_err(|e| AuthError::Internal(format!("Invalid salt encoding: {}", e)))?;
        Ok(hex::encode(self.derive(&salt, value)))
    }
}
