// capacity.rs - Capacity Calibrator (C6)
//
// Chooses the largest raw chunk size such that exactly one QR symbol at the
// configured Error Correction Level can carry one ChunkPayload. This
// implementation uses the analytical strategy named in the design notes:
// the version-40 byte capacity per ECL is a known constant, so the chunk
// size can be computed directly instead of rendering and discarding trial
// QR codes.
//
// The two fudge factors below (0.92, 0.98) are empirical and were not
// re-derived for this encoder; see DESIGN.md for why they are kept as-is.

use base64::Engine;

use crate::config::Ecl;
use crate::crypto::KdfParams;
use crate::payload::{encode_payload, ChunkPayload, KdfParamsWire, PAYLOAD_TYPE, PAYLOAD_VERSION};

/// Byte capacity of a version-40 QR symbol in 8-bit byte mode, per ECL.
/// JSON text is encoded in byte mode (it is not restricted to the QR
/// alphanumeric character set), so these are also the usable text-length
/// limits for a serialized `ChunkPayload`.
fn version_40_capacity(ecl: Ecl) -> usize {
    match ecl {
        Ecl::L => 2953,
        Ecl::M => 2331,
        Ecl::Q => 1663,
        Ecl::H => 1273,
    }
}

/// Absorbs per-chunk JSON variance in the overhead estimate (field values
/// of slightly different width than the placeholder fields below).
const SAFETY_FACTOR: f64 = 0.92;

/// Converts a base64-length budget into a raw-byte budget after the safety
/// factor has already been applied: base64 expands 3 raw bytes to 4
/// characters, then an additional conservative shave is applied.
const BASE64_TO_RAW_NUMERATOR: f64 = 3.0;
const BASE64_TO_RAW_DENOMINATOR: f64 = 4.0;
const RAW_BYTE_FACTOR: f64 = 0.98;

/// Chunk size is never calibrated below this floor, even at the most
/// redundant ECL with the longest plausible field values.
pub const CHUNK_SIZE_FLOOR: usize = 512;

/// Build a realistic placeholder payload (empty `dataB64`) to measure the
/// fixed overhead that every chunk pays regardless of its data.
fn overhead_probe_payload() -> ChunkPayload {
    ChunkPayload {
        payload_type: PAYLOAD_TYPE.to_string(),
        version: PAYLOAD_VERSION.to_string(),
        file_id: "0".repeat(16),
        name: "placeholder-name".to_string(),
        ext: ".placeholder".to_string(),
        chunk: 999_999,
        total: 999_999,
        hash: "0".repeat(64),
        cipher_hash: "0".repeat(64),
        data_b64: String::new(),
        kdf_params: KdfParamsWire::from(KdfParams::new(1 << 20, 8, 255)),
        salt_b64: base64::engine::general_purpose::STANDARD.encode([0u8; 16]),
        nonce_b64: base64::engine::general_purpose::STANDARD.encode([0u8; 12]),
        chunk_size: u32::MAX,
    }
}

/// Compute the calibrated chunk size (raw bytes) for the given ECL.
///
/// `override_size`, when present, is returned unchanged (an explicit
/// configuration override always takes precedence).
pub fn calibrate_chunk_size(ecl: Ecl, override_size: Option<usize>) -> usize {
    if let Some(size) = override_size {
        return size.max(CHUNK_SIZE_FLOOR);
    }

    let total_capacity = version_40_capacity(ecl);
    let overhead = encode_payload(&overhead_probe_payload())
        .expect("overhead probe payload always serializes")
        .len();

    let available_b64_chars = (total_capacity.saturating_sub(overhead)) as f64 * SAFETY_FACTOR;
    let raw_bytes =
        available_b64_chars * (BASE64_TO_RAW_NUMERATOR / BASE64_TO_RAW_DENOMINATOR) * RAW_BYTE_FACTOR;

    (raw_bytes.floor() as usize).max(CHUNK_SIZE_FLOOR)
}
