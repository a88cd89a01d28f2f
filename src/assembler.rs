// assembler.rs - Assembler (C9)
//
// Owns a mapping chunk_index -> raw_bytes. Memoizes the session-level
// fields from the first accepted payload and rejects any later payload
// that disagrees with them. A payload whose per-chunk hash does not match
// is dropped with a warning rather than failing the whole decode, since a
// later duplicate with the correct bytes may still arrive.

use std::collections::BTreeMap;

use base64::Engine;

use crate::crypto::KdfParams;
use crate::error::{PipelineError, PipelineResult};
use crate::hash::hash_bytes_hex;
use crate::payload::ChunkPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionFields {
    name: String,
    ext: String,
    cipher_hash: String,
    kdf_params: KdfParams,
    salt_b64: String,
    nonce_b64: String,
    total: u32,
    chunk_size: u32,
    file_id: String,
}

pub struct Assembler {
    session: Option<SessionFields>,
    chunks: BTreeMap<u32, Vec<u8>>,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            session: None,
            chunks: BTreeMap::new(),
        }
    }

    /// Accept one payload. Returns `Ok(())` even when the payload was
    /// dropped for a recoverable reason (hash mismatch); only a conflicting
    /// session field is a hard error, since that means two unrelated
    /// sessions' symbols are being fed into the same assembler.
    pub fn accept(&mut self, payload: ChunkPayload) -> PipelineResult<()> {
        let fields = SessionFields {
            name: payload.name.clone(),
            ext: payload.ext.clone(),
            cipher_hash: payload.cipher_hash.clone(),
            kdf_params: payload.kdf_params.clone().into(),
            salt_b64: payload.salt_b64.clone(),
            nonce_b64: payload.nonce_b64.clone(),
            total: payload.total,
            chunk_size: payload.chunk_size,
            file_id: payload.file_id.clone(),
        };

        match &self.session {
            None => self.session = Some(fields),
            Some(existing) => self.check_agrees(existing, &fields)?,
        }

        if payload.chunk >= payload.total {
            return Err(PipelineError::MalformedPayload(format!(
                "chunk index {} out of range for total {}",
                payload.chunk, payload.total
            )));
        }

        let raw = match base64::engine::general_purpose::STANDARD.decode(&payload.data_b64) {
            Ok(bytes) => bytes,
            Err(_) => {
                log::warn!("chunk {} has unparseable base64 data, dropping", payload.chunk);
                return Ok(());
            }
        };

        let actual_hash = hash_bytes_hex(&raw);
        if actual_hash != payload.hash {
            log::warn!(
                "chunk {} failed its hash check (got {}, expected {}), dropping",
                payload.chunk,
                actual_hash,
                payload.hash
            );
            return Ok(());
        }

        // Duplicates with identical bytes are idempotent; a later duplicate
        // with a correct hash may supersede an earlier dropped one.
        self.chunks.insert(payload.chunk, raw);
        Ok(())
    }

    fn check_agrees(&self, existing: &SessionFields, incoming: &SessionFields) -> PipelineResult<()> {
        if existing.name != incoming.name {
            return Err(PipelineError::ConflictingField { field: "name" });
        }
        if existing.ext != incoming.ext {
            return Err(PipelineError::ConflictingField { field: "ext" });
        }
        if existing.cipher_hash != incoming.cipher_hash {
            return Err(PipelineError::ConflictingField {
                field: "cipherHash",
            });
        }
        if existing.kdf_params != incoming.kdf_params {
            return Err(PipelineError::ConflictingField {
                field: "kdfParams",
            });
        }
        if existing.salt_b64 != incoming.salt_b64 {
            return Err(PipelineError::ConflictingField { field: "saltB64" });
        }
        if existing.nonce_b64 != incoming.nonce_b64 {
            return Err(PipelineError::ConflictingField { field: "nonceB64" });
        }
        if existing.total != incoming.total {
            return Err(PipelineError::ConflictingField { field: "total" });
        }
        if existing.chunk_size != incoming.chunk_size {
            return Err(PipelineError::ConflictingField {
                field: "chunkSize",
            });
        }
        if existing.file_id != incoming.file_id {
            return Err(PipelineError::ConflictingField { field: "fileId" });
        }
        Ok(())
    }

    /// The memoized session name (stem, no extension), if any payload has
    /// been accepted yet.
    pub fn name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.name.as_str())
    }

    pub fn ext(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.ext.as_str())
    }

    pub fn kdf_params(&self) -> Option<KdfParams> {
        self.session.as_ref().map(|s| s.kdf_params)
    }

    pub fn salt(&self) -> Option<Vec<u8>> {
        self.session
            .as_ref()
            .and_then(|s| base64::engine::general_purpose::STANDARD.decode(&s.salt_b64).ok())
    }

    pub fn nonce(&self) -> Option<Vec<u8>> {
        self.session
            .as_ref()
            .and_then(|s| base64::engine::general_purpose::STANDARD.decode(&s.nonce_b64).ok())
    }

    /// Once all `total` chunks are present, concatenate them in order and
    /// verify the result against `cipherHash`. Returns the list of missing
    /// indices as an error when the input is exhausted but incomplete.
    pub fn try_finish(&self) -> PipelineResult<Vec<u8>> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| PipelineError::EmptySymbolSet)?;

        let missing: Vec<u32> = (0..session.total)
            .filter(|i| !self.chunks.contains_key(i))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingChunks(missing));
        }

        let mut frame = Vec::new();
        for index in 0..session.total {
            frame.extend_from_slice(&self.chunks[&index]);
        }

        let actual = hash_bytes_hex(&frame);
        if actual != session.cipher_hash {
            return Err(PipelineError::CipherHashMismatch);
        }

        Ok(frame)
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}
