// qr_decode.rs - QR Decoder Pool (C8)
//
// Symmetric to the encoder pool: a rayon-parallel pass over a list of image
// paths, each job pure over its input. Malformed or non-matching-type
// payloads are dropped (logged, not fatal) — only an empty symbol set at
// the Orchestrator level is fatal.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::Config;
use crate::payload::{decode_payload, ChunkPayload};

/// Outcome of decoding one image: the recognized, type-validated payload if
/// any QR symbol in the image parsed as one.
pub struct DecodeOutcome {
    pub path: PathBuf,
    pub payload: Option<ChunkPayload>,
}

fn decode_one(path: &Path) -> DecodeOutcome {
    let payload = decode_image(path);
    DecodeOutcome {
        path: path.to_path_buf(),
        payload,
    }
}

fn decode_image(path: &Path) -> Option<ChunkPayload> {
    let image = image::open(path).ok()?.to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(image);
    let grids = prepared.detect_grids();

    for grid in grids {
        if let Ok((_meta, text)) = grid.decode() {
            if let Some(payload) = decode_payload(&text) {
                return Some(payload);
            }
        }
    }
    None
}

/// Decode every image path in parallel across `config.qr_workers` threads.
/// Paths that fail to open, contain no QR symbol, or decode to a
/// non-matching payload yield `payload: None` rather than aborting the
/// batch.
pub fn decode_all(paths: &[PathBuf], config: &Config) -> Vec<DecodeOutcome> {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.qr_workers)
        .build()
    {
        Ok(pool) => pool,
        Err(_) => return paths.iter().map(|p| decode_one(p)).collect(),
    };

    pool.install(|| paths.par_iter().map(|p| decode_one(p)).collect())
}
