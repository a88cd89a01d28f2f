// error.rs - Error types for the encode/decode pipeline
//
// Two layers: `CryptoError` covers the cryptographic primitives (KDF, AEAD)
// exactly as in the original codebase, and `PipelineError` wraps it alongside
// the Input/Integrity/Capacity/Io kinds that the wider pipeline can fail with.
// Fatal step failure is always a typed `PipelineResult`, never a panic.

use thiserror::Error;

/// Error type for the cryptographic primitives (KDF, AEAD).
#[derive(Error, Debug)]
pub enum CryptoError {
    /// AEAD tag verification failed during decryption.
    #[error("Invalid password or corrupted data")]
    InvalidPassword,

    /// File format is invalid or corrupted.
    #[error("Invalid file format: {0}")]
    FormatError(String),

    /// Encryption operation failed.
    #[error("Encryption failed")]
    EncryptionFailed,

    /// Decryption operation failed.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// I/O error (file not found, permission denied, etc.)
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file path (symlinks, path traversal, etc.)
    #[error("InvalidPath: {0}")]
    InvalidPath(String),

    /// Archive operation error.
    #[error("ArchiveError: {0}")]
    ArchiveError(String),
}

/// Result type alias for crypto-primitive operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Error type for the full encode/decode pipeline.
///
/// Each variant is grouped by the error kinds described for the Orchestrator:
/// Input, Integrity, Crypto, Capacity, Io. The CLI front-end is the only place
/// a `PipelineError` is converted into a step-line cause and an exit code.
#[derive(Error, Debug)]
pub enum PipelineError {
    // --- Input ---
    #[error("input not found: {0}")]
    MissingInput(String),

    #[error("directory is unreadable: {0}")]
    UnreadableDirectory(String),

    #[error("no QR symbols found in input")]
    EmptySymbolSet,

    #[error("password must be at least 8 bytes")]
    PasswordTooShort,

    // --- Integrity ---
    #[error("chunk {index} failed its hash check")]
    ChunkHashMismatch { index: u32 },

    #[error("cipher hash mismatch: reassembled frame does not match cipherHash")]
    CipherHashMismatch,

    #[error("missing chunk indices: {0:?}")]
    MissingChunks(Vec<u32>),

    #[error("conflicting session field `{field}` across chunk payloads")]
    ConflictingField { field: &'static str },

    // --- Crypto ---
    #[error("wrong password or corrupted data")]
    CryptoFailure,

    // --- Capacity ---
    #[error("payload overhead exceeds capacity of ECL {ecl} at any chunk size; use a lower ECL")]
    CapacityExceeded { ecl: String },

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("QR codec error: {0}")]
    QrCodec(String),

    #[error("malformed chunk payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result type alias threaded throughout the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// The one-line cause rendered on a failing `STEP #N ... [0]` line.
    pub fn step_cause(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_message() {
        let error = CryptoError::FormatError("bad header".to_string());
        assert_eq!(error.to_string(), "Invalid file format: bad header");
    }

    #[test]
    fn crypto_error_converts_into_pipeline_error() {
        let err: PipelineError = CryptoError::InvalidPassword.into();
        assert_eq!(err.step_cause(), "Invalid password or corrupted data");
    }

    #[test]
    fn missing_chunks_lists_indices() {
        let err = PipelineError::MissingChunks(vec![2, 5]);
        assert!(err.step_cause().contains("2"));
        assert!(err.step_cause().contains("5"));
    }
}
