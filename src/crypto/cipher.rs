// crypto/cipher.rs - AES-256-GCM Encryption and Decryption
//
// This module implements authenticated encryption using AES-256-GCM.
// GCM (Galois/Counter Mode) provides both confidentiality and authenticity,
// protecting against tampering and ensuring data integrity.
//
// AES-256-GCM Properties:
// - Encryption: AES in counter mode with 256-bit keys
// - Authentication: GMAC (Galois Message Authentication Code)
// - Nonce: 96 bits (12 bytes) - must be unique for each encryption
// - Tag: 128 bits (16 bytes) - verifies data hasn't been tampered
//
// Security Features:
// - Authenticated encryption (AEAD) - detects any modifications
// - Protects against chosen-ciphertext attacks
// - Industry standard (used in TLS, IPSec, etc.)
//
// Performance:
// - Very fast (hardware acceleration on most modern CPUs)
// - Encryption/decryption is typically <10ms for small files

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use rand::{rngs::OsRng, TryRngCore};

use crate::crypto::secure::SecureBytes;
use crate::error::{CryptoError, CryptoResult};

/// Nonce size for AES-GCM (12 bytes = 96 bits is the standard)
const NONCE_SIZE: usize = 12;

/// Encrypt plaintext using AES-256-GCM
///
/// This function performs authenticated encryption, which means it both
/// encrypts the data and generates an authentication tag to detect tampering.
///
/// # Arguments
/// * `key` - 32-byte (256-bit) encryption key from key derivation
/// * `plaintext` - The data to encrypt
///
/// # Returns
/// A tuple of (nonce, ciphertext+tag) where:
/// - nonce: 12-byte random value (must be stored with ciphertext)
/// - ciphertext: Encrypted data with 16-byte authentication tag appended
///
/// # Security Notes
/// - A new random nonce is generated for each encryption
/// - The same key+nonce combination must NEVER be reused
/// - The authentication tag is automatically appended to ciphertext
/// - Tag verification happens automatically during decryption
///
/// # Errors
/// Returns `CryptoError::EncryptionFailed` if:
/// - Key length is not 32 bytes
/// - Encryption operation fails (rare, usually indicates hardware issues)
///
/// # Example
/// ```no_run
/// use gitzipqr_lib::crypto::{encrypt, SecureBytes};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = SecureBytes::new(vec![0u8; 32]);
/// let plaintext = b"Hello, World!";
/// let (_nonce, _ciphertext) = encrypt(&key, plaintext)?;
/// // ciphertext is now encrypted and includes authentication tag
/// # Ok(())
/// # }
/// ```
pub fn encrypt(key: &SecureBytes, plaintext: &[u8]) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
    // Validate key length (AES-256 requires exactly 32 bytes)
    if key.len() != 32 {
        return Err(CryptoError::EncryptionFailed);
    }

    // Generate a random nonce using OS-provided CSPRNG
    // CRITICAL: Nonces must be unique for each encryption with the same key
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    // Create the AES-256-GCM cipher instance with our key
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|_| CryptoError::EncryptionFailed)?;

    // Perform the encryption
    // This produces: ciphertext || tag (tag is automatically appended)
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    // Return both nonce and ciphertext (both are needed for decryption)
    Ok((nonce_bytes.to_vec(), ciphertext))
}

/// Decrypt ciphertext using AES-256-GCM
///
/// This function decrypts data and verifies the authentication tag.
/// If the tag doesn't match (data was tampered with or wrong key),
/// decryption fails and returns an error.
///
/// # Arguments
/// * `key` - 32-byte (256-bit) decryption key (must match encryption key)
/// * `nonce` - 12-byte nonce used during encryption
/// * `ciphertext` - Encrypted data with authentication tag appended
///
/// # Returns
/// The original plaintext if decryption and authentication succeed
///
/// # Security Notes
/// - Authentication tag is automatically verified
/// - If tag verification fails, an error is returned (data was tampered with)
/// - Wrong password results in tag verification failure
/// - Timing-safe comparison prevents timing attacks
///
/// # Errors
/// Returns `CryptoError::InvalidPassword` if:
/// - Wrong password (key) was used
/// - Data has been tampered with
/// - Authentication tag is invalid
///
/// Returns `CryptoError::DecryptionFailed` if:
/// - Key or nonce length is invalid
/// - Ciphertext is too short (missing tag)
///
/// # Example
/// ```no_run
/// use gitzipqr_lib::crypto::{decrypt, SecureBytes};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = SecureBytes::new(vec![0u8; 32]);
/// let nonce = vec![1u8; 12];
/// let ciphertext = vec![0u8; 16];
/// let _plaintext = decrypt(&key, &nonce, &ciphertext)?;
/// # Ok(())
/// # }
/// ```
pub fn decrypt(key: &SecureBytes, nonce: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    // Validate key length
    if key.len() != 32 {
        return Err(CryptoError::DecryptionFailed);
    }

    // Validate nonce length
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    // Convert nonce to the correct type
    let nonce = Nonce::from_slice(nonce);

    // Create the AES-256-GCM cipher instance with our key
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)?;

    // Perform the decryption
    // This automatically verifies the authentication tag
    // If the tag doesn't match, this returns an error
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::InvalidPassword)?; // Most likely wrong password

    Ok(plaintext)
}
