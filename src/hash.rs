// hash.rs - Streaming SHA-256 over files and buffers
//
// Used (a) over the whole ciphertext frame post-write, (b) over each
// in-memory chunk before emission, (c) to form the FileID. The file variant
// never loads the whole file into memory.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

const STREAM_BUF_SIZE: usize = 64 * 1024;

/// Incremental SHA-256 hasher.
#[derive(Default)]
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Consume the hasher and return the lower-case hex digest.
    pub fn digest_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// SHA-256 over an in-memory buffer, returned as lower-case hex.
pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.digest_hex()
}

/// Streaming SHA-256 over a file, without loading it into memory.
pub fn hash_file_hex(path: impl AsRef<Path>) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.digest_hex())
}

/// Derive the 16-hex-char FileID from the original name and the cipher
/// fingerprint: `SHA-256(name || ":" || cipher_fingerprint)[..16]`.
pub fn derive_file_id(name: &str, cipher_fingerprint_hex: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(cipher_fingerprint_hex.as_bytes());
    let full = hasher.digest_hex();
    full[..16].to_string()
}
