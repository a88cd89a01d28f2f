// crypto/kdf.rs - scrypt Key Derivation Function
//
// This module implements password-based key derivation using scrypt.
// scrypt is memory-hard, which makes custom ASIC/GPU brute-forcing
// considerably more expensive per guess than a purely CPU-hard KDF.
//
// Security Parameters:
// - Algorithm: scrypt
// - N: 2^15 (CPU/memory cost) - default, configurable
// - r: 8 (block size) - default, configurable
// - p: CPU count (parallelization) - default, configurable
// - Output Length: 32 bytes (256 bits) - suitable for AES-256
//
// When multiple passwords are supplied by the caller (e.g. a front-end that
// accepts more than one `--password` flag), they are concatenated with a
// single NUL byte separator before derivation. This framing is part of the
// wire contract and must not be changed without breaking compatibility with
// anything already encoded.

use scrypt::{scrypt, Params as ScryptParams};

use crate::crypto::secure::{Password, SecureBytes};
use crate::error::{CryptoError, CryptoResult};

/// Output key length in bytes (32 bytes = 256 bits for AES-256).
const KEY_LENGTH: usize = 32;

/// Salt length in bytes (16 bytes = 128 bits is standard).
pub const SALT_LENGTH: usize = 16;

/// Minimum memory scrypt is allowed to use, per the `maxmem` parameter.
const MIN_MAX_MEM: usize = 512 * 1024 * 1024;

/// scrypt cost parameters carried alongside every chunk payload so a decoder
/// can re-derive the same key without a sidecar manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub n: u64,
    pub r: u32,
    pub p: u32,
}

impl KdfParams {
    pub fn new(n: u64, r: u32, p: u32) -> Self {
        Self { n, r, p }
    }

    fn log_n(&self) -> CryptoResult<u8> {
        if self.n == 0 || !self.n.is_power_of_two() {
            return Err(CryptoError::FormatError(format!(
                "scrypt N must be a power of two, got {}",
                self.n
            )));
        }
        Ok(self.n.trailing_zeros() as u8)
    }
}

/// Concatenate one or more passwords with a single NUL byte separator.
///
/// Kept as a standalone step so the framing (and its rationale) is visible
/// at the call site rather than buried inside `derive_key`.
pub fn concat_passwords(passwords: &[Password]) -> Vec<u8> {
    let mut joined = Vec::new();
    for (i, password) in passwords.iter().enumerate() {
        if i > 0 {
            joined.push(0u8);
        }
        joined.extend_from_slice(password.as_bytes());
    }
    joined
}

/// Derive a cryptographic key from password bytes using scrypt.
///
/// # Arguments
/// * `password_bytes` - the (possibly NUL-joined) password material
/// * `salt` - random salt bytes, unique per encode session
/// * `params` - scrypt cost parameters (`N`, `r`, `p`)
///
/// # Example
/// ```no_run
/// use gitzipqr_lib::crypto::{derive_key, generate_salt, KdfParams};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let salt = generate_salt()?;
/// let params = KdfParams::new(1 << 15, 8, 1);
/// let _key = derive_key(b"my_password", &salt, params)?;
/// # Ok(())
/// # }
/// ```
pub fn derive_key(password_bytes: &[u8], salt: &[u8], params: KdfParams) -> CryptoResult<SecureBytes> {
    let log_n = params.log_n()?;
    let scrypt_params = ScryptParams::new(log_n, params.r, params.p.max(1), KEY_LENGTH)
        .map_err(|e| CryptoError::FormatError(format!("invalid scrypt params: {e}")))?;

    let _ = MIN_MAX_MEM; // scrypt crate derives maxmem from the params themselves.

    let mut key_bytes = vec![0u8; KEY_LENGTH];
    scrypt(password_bytes, salt, &scrypt_params, &mut key_bytes)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(SecureBytes::new(key_bytes))
}

/// Generate a cryptographically secure random salt.
///
/// # Example
/// ```no_run
/// use gitzipqr_lib::crypto::generate_salt;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let _salt = generate_salt()?;
/// # Ok(())
/// # }
/// ```
pub fn generate_salt() -> CryptoResult<Vec<u8>> {
    use rand::{rngs::OsRng, TryRngCore};

    let mut salt = vec![0u8; SALT_LENGTH];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut salt)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> KdfParams {
        // Small N for fast tests; production defaults live in `config.rs`.
        KdfParams::new(1 << 10, 8, 1)
    }

    #[test]
    fn derive_key_produces_correct_length() {
        let salt = generate_salt().unwrap();
        let key = derive_key(b"test_password", &salt, default_params()).unwrap();
        assert_eq!(key.len(), KEY_LENGTH);
    }

    #[test]
    fn same_password_and_salt_produce_same_key() {
        let salt = vec![42u8; SALT_LENGTH];
        let key1 = derive_key(b"consistent_password", &salt, default_params()).unwrap();
        let key2 = derive_key(b"consistent_password", &salt, default_params()).unwrap();
        assert_eq!(key1.as_slice(), key2.as_slice());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let salt1 = vec![1u8; SALT_LENGTH];
        let salt2 = vec![2u8; SALT_LENGTH];
        let key1 = derive_key(b"same_password", &salt1, default_params()).unwrap();
        let key2 = derive_key(b"same_password", &salt2, default_params()).unwrap();
        assert_ne!(key1.as_slice(), key2.as_slice());
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let salt = vec![42u8; SALT_LENGTH];
        let key1 = derive_key(b"password1", &salt, default_params()).unwrap();
        let key2 = derive_key(b"password2", &salt, default_params()).unwrap();
        assert_ne!(key1.as_slice(), key2.as_slice());
    }

    #[test]
    fn generate_salt_produces_correct_length() {
        let salt = generate_salt().unwrap();
        assert_eq!(salt.len(), SALT_LENGTH);
    }

    #[test]
    fn generate_salt_produces_unique_salts() {
        let salt1 = generate_salt().unwrap();
        let salt2 = generate_salt().unwrap();
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn concat_passwords_joins_with_single_nul() {
        let passwords = vec![Password::new("abc".to_string()), Password::new("def".to_string())];
        let joined = concat_passwords(&passwords);
        assert_eq!(joined, b"abc\0def".to_vec());
    }

    #[test]
    fn concat_single_password_has_no_separator() {
        let passwords = vec![Password::new("solo".to_string())];
        assert_eq!(concat_passwords(&passwords), b"solo".to_vec());
    }

    #[test]
    fn rejects_non_power_of_two_n() {
        let salt = generate_salt().unwrap();
        let bad = KdfParams::new(1000, 8, 1);
        assert!(derive_key(b"x", &salt, bad).is_err());
    }
}
