// chunker.rs - Splits the ciphertext frame into fixed-size chunks (C5)
//
// Operates on a file on disk via positional reads so the encoder never
// needs the whole ciphertext frame resident in memory. This is purely a
// slicing operation — no cryptography happens here, unlike the per-chunk
// AEAD streaming format this codebase's teacher uses elsewhere, which does
// not apply to an already-complete ciphertext frame.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::PipelineResult;
use crate::hash::hash_bytes_hex;

/// One slice of the ciphertext frame, ready to become a `ChunkPayload`.
pub struct RawChunk {
    pub index: u32,
    pub bytes: Vec<u8>,
    pub hash_hex: String,
}

/// Read `frame_path` in `chunk_size`-byte slices and yield each one with its
/// index and SHA-256 hash. The last chunk may be shorter than `chunk_size`.
pub fn chunk_frame(frame_path: &Path, chunk_size: usize) -> PipelineResult<Vec<RawChunk>> {
    let mut file = File::open(frame_path)?;
    let frame_len = file.metadata()?.len() as usize;
    let total = frame_len.div_ceil(chunk_size).max(1);

    let mut chunks = Vec::with_capacity(total);
    let mut buf = vec![0u8; chunk_size];

    for index in 0..total {
        let offset = index * chunk_size;
        let remaining = frame_len.saturating_sub(offset);
        let this_len = remaining.min(chunk_size);

        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(&mut buf[..this_len])?;
        let bytes = buf[..this_len].to_vec();
        let hash_hex = hash_bytes_hex(&bytes);

        chunks.push(RawChunk {
            index: index as u32,
            bytes,
            hash_hex,
        });
    }

    Ok(chunks)
}

/// Number of chunks `len` bytes will split into at `chunk_size`.
pub fn total_chunks(len: usize, chunk_size: usize) -> u32 {
    len.div_ceil(chunk_size).max(1) as u32
}
