// payload.rs - ChunkPayload type and canonical JSON codec (C11)
//
// One ChunkPayload is embedded per QR symbol. The field set is exhaustive
// and self-describing: every symbol carries the full KDF params, salt,
// nonce, and cipher hash so a decoder never needs a sidecar manifest. Field
// order on encode matches the order below for compactness and readability
// of the raw JSON; the decoder accepts any field order (serde_json does not
// care about key order when deserializing a struct) and ignores unknown
// fields to preserve forward compatibility.

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;

pub const PAYLOAD_TYPE: &str = "GitZipQR-CHUNK-ENC";
pub const PAYLOAD_VERSION: &str = "3.1-inline-only";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParamsWire {
    #[serde(rename = "N")]
    pub n: u64,
    pub r: u32,
    pub p: u32,
}

impl From<KdfParams> for KdfParamsWire {
    fn from(p: KdfParams) -> Self {
        Self {
            n: p.n,
            r: p.r,
            p: p.p,
        }
    }
}

impl From<KdfParamsWire> for KdfParams {
    fn from(w: KdfParamsWire) -> Self {
        KdfParams::new(w.n, w.r, w.p)
    }
}

/// One QR symbol's worth of data, fully self-describing.
///
/// Field order here is the order serialized to JSON (see `payload.rs`
/// module docs); unknown fields are ignored on deserialize and the fixed
/// `type`/`version` strings are validated explicitly by `decode_payload`,
/// not by serde alone, so a malformed-but-parseable payload of the wrong
/// type is rejected rather than silently accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub version: String,
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub name: String,
    pub ext: String,
    pub chunk: u32,
    pub total: u32,
    pub hash: String,
    #[serde(rename = "cipherHash")]
    pub cipher_hash: String,
    #[serde(rename = "dataB64")]
    pub data_b64: String,
    #[serde(rename = "kdfParams")]
    pub kdf_params: KdfParamsWire,
    #[serde(rename = "saltB64")]
    pub salt_b64: String,
    #[serde(rename = "nonceB64")]
    pub nonce_b64: String,
    #[serde(rename = "chunkSize")]
    pub chunk_size: u32,
}

/// Serialize a `ChunkPayload` to canonical, compact JSON.
///
/// `serde_json::to_string` already emits struct fields in declaration
/// order with no extraneous whitespace, which is exactly the canonical
/// form the wire format calls for.
pub fn encode_payload(payload: &ChunkPayload) -> serde_json::Result<String> {
    serde_json::to_string(payload)
}

/// Parse and validate a `ChunkPayload` from symbol text.
///
/// Returns `None` (not an error) for malformed JSON or a payload whose
/// `type`/`version` do not match, since the decoder pool must not treat a
/// stray or foreign QR symbol as fatal.
pub fn decode_payload(text: &str) -> Option<ChunkPayload> {
    let payload: ChunkPayload = serde_json::from_str(text).ok()?;
    if payload.payload_type != PAYLOAD_TYPE || payload.version != PAYLOAD_VERSION {
        return None;
    }
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChunkPayload {
        ChunkPayload {
            payload_type: PAYLOAD_TYPE.to_string(),
            version: PAYLOAD_VERSION.to_string(),
            file_id: "0123456789abcdef".to_string(),
            name: "hello".to_string(),
            ext: ".txt".to_string(),
            chunk: 0,
            total: 1,
            hash: "a".repeat(64),
            cipher_hash: "b".repeat(64),
            data_b64: "SGVsbG8=".to_string(),
            kdf_params: KdfParamsWire {
                n: 1 << 15,
                r: 8,
                p: 1,
            },
            salt_b64: "c".repeat(24),
            nonce_b64: "d".repeat(16),
            chunk_size: 1024,
        }
    }

    #[test]
    fn round_trips_through_json() {
        let payload = sample();
        let json = encode_payload(&payload).unwrap();
        let decoded = decode_payload(&json).unwrap();
        assert_eq!(payload, decoded);
    }

    #[test]
    fn field_order_matches_the_wire_contract() {
        let json = encode_payload(&sample()).unwrap();
        let type_pos = json.find("\"type\"").unwrap();
        let version_pos = json.find("\"version\"").unwrap();
        let file_id_pos = json.find("\"fileId\"").unwrap();
        let data_pos = json.find("\"dataB64\"").unwrap();
        let kdf_pos = json.find("\"kdfParams\"").unwrap();
        assert!(type_pos < version_pos);
        assert!(version_pos < file_id_pos);
        assert!(file_id_pos < data_pos);
        assert!(data_pos < kdf_pos);
    }

    #[test]
    fn rejects_wrong_type_string() {
        let mut payload = sample();
        payload.payload_type = "something-else".to_string();
        let json = encode_payload(&payload).unwrap();
        assert!(decode_payload(&json).is_none());
    }

    #[test]
    fn rejects_wrong_version_string() {
        let mut payload = sample();
        payload.version = "9.9-unknown".to_string();
        let json = encode_payload(&payload).unwrap();
        assert!(decode_payload(&json).is_none());
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("partTotal".to_string(), serde_json::json!(4));
        let json = value.to_string();
        assert!(decode_payload(&json).is_some());
    }

    #[test]
    fn rejects_garbage_text() {
        assert!(decode_payload("not json at all").is_none());
    }
}
