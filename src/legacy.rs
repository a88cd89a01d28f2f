// legacy.rs - Legacy fragment/manifest decode-only acceptance
//
// An older on-disk format split a session into `*.bin.json` fragments (one
// chunk each) plus a `manifest.json` carrying the session-level fields.
// Both camelCase and snake_case field spellings are accepted since both
// were produced by different versions of the legacy encoder. No new
// artifacts in this format are ever produced — this module exists purely
// so old backups remain decodable.

use std::path::Path;

use serde::Deserialize;

use crate::crypto::KdfParams;
use crate::payload::{ChunkPayload, KdfParamsWire, PAYLOAD_TYPE, PAYLOAD_VERSION};

#[derive(Debug, Deserialize)]
struct LegacyKdfParams {
    #[serde(alias = "N", alias = "n")]
    n: u64,
    r: u32,
    p: u32,
}

impl From<LegacyKdfParams> for KdfParams {
    fn from(p: LegacyKdfParams) -> Self {
        KdfParams::new(p.n, p.r, p.p)
    }
}

#[derive(Debug, Deserialize)]
struct LegacyManifest {
    #[serde(alias = "kdfParams", alias = "kdf_params")]
    kdf_params: LegacyKdfParams,
    #[serde(alias = "saltB64", alias = "salt_b64")]
    salt_b64: String,
    #[serde(alias = "nonceB64", alias = "nonce_b64")]
    nonce_b64: String,
    #[serde(alias = "totalChunks", alias = "total_chunks")]
    total_chunks: u32,
    #[serde(alias = "cipherSha256", alias = "cipher_sha256")]
    cipher_sha256: String,
}

#[derive(Debug, Deserialize)]
struct LegacyFragment {
    data: String,
    chunk: u32,
    #[serde(default)]
    total: Option<u32>,
    name: String,
    hash: String,
    #[serde(rename = "cipherHash", alias = "cipher_hash", default)]
    cipher_hash: Option<String>,
}

/// Parse `manifest.json` and a set of `*.bin.json` fragments into
/// canonical `ChunkPayload`s, reusing the same assembler/decryption path
/// as the primary format.
///
/// `name`/`ext` splitting mirrors the primary format: the manifest does not
/// carry an extension field in the legacy format, so the fragment's `name`
/// is split on its last `.` the same way the orchestrator splits an
/// original filename.
pub fn parse_legacy_session(
    manifest_json: &str,
    fragment_jsons: &[String],
) -> Result<Vec<ChunkPayload>, String> {
    let manifest: LegacyManifest =
        serde_json::from_str(manifest_json).map_err(|e| format!("invalid manifest.json: {e}"))?;

    let mut payloads = Vec::with_capacity(fragment_jsons.len());
    for fragment_json in fragment_jsons {
        let fragment: LegacyFragment = serde_json::from_str(fragment_json)
            .map_err(|e| format!("invalid legacy fragment: {e}"))?;

        let (name, ext) = split_name_ext(&fragment.name);
        let cipher_hash = fragment
            .cipher_hash
            .unwrap_or_else(|| manifest.cipher_sha256.clone());
        let total = fragment.total.unwrap_or(manifest.total_chunks);

        payloads.push(ChunkPayload {
            payload_type: PAYLOAD_TYPE.to_string(),
            version: PAYLOAD_VERSION.to_string(),
            file_id: String::new(),
            name,
            ext,
            chunk: fragment.chunk,
            total,
            hash: fragment.hash,
            cipher_hash,
            data_b64: fragment.data,
            kdf_params: KdfParamsWire::from(KdfParams::from(manifest.kdf_params.clone_params())),
            salt_b64: manifest.salt_b64.clone(),
            nonce_b64: manifest.nonce_b64.clone(),
            chunk_size: 0,
        });
    }

    Ok(payloads)
}

impl LegacyKdfParams {
    fn clone_params(&self) -> LegacyKdfParams {
        LegacyKdfParams {
            n: self.n,
            r: self.r,
            p: self.p,
        }
    }
}

fn split_name_ext(file_name: &str) -> (String, String) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (
            file_name[..idx].to_string(),
            file_name[idx..].to_string(),
        ),
        _ => (file_name.to_string(), String::new()),
    }
}

/// Directory-scan helper: true if `entries` looks like a legacy session
/// (at least one `*.bin.json` fragment and a `manifest.json`).
pub fn looks_like_legacy_session(entries: &[std::path::PathBuf]) -> bool {
    let has_manifest = entries
        .iter()
        .any(|p| p.file_name().map(|n| n == "manifest.json").unwrap_or(false));
    let has_fragment = entries.iter().any(|p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(".bin.json"))
            .unwrap_or(false)
    });
    has_manifest && has_fragment
}

pub fn is_manifest(path: &Path) -> bool {
    path.file_name().map(|n| n == "manifest.json").unwrap_or(false)
}

pub fn is_fragment(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".bin.json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camelcase_manifest_and_fragments() {
        let manifest = r#"{
            "kdfParams": {"N": 32768, "r": 8, "p": 1},
            "saltB64": "c2FsdA==",
            "nonceB64": "bm9uY2U=",
            "totalChunks": 1,
            "cipherSha256": "deadbeef"
        }"#;
        let fragment = r#"{"data":"SGVsbG8=","chunk":0,"total":1,"name":"hello.txt","hash":"abc"}"#;

        let payloads = parse_legacy_session(manifest, &[fragment.to_string()]).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].name, "hello");
        assert_eq!(payloads[0].ext, ".txt");
        assert_eq!(payloads[0].cipher_hash, "deadbeef");
    }

    #[test]
    fn parses_snake_case_manifest_and_fragments() {
        let manifest = r#"{
            "kdf_params": {"n": 32768, "r": 8, "p": 1},
            "salt_b64": "c2FsdA==",
            "nonce_b64": "bm9uY2U=",
            "total_chunks": 1,
            "cipher_sha256": "deadbeef"
        }"#;
        let fragment = r#"{"data":"SGVsbG8=","chunk":0,"total":1,"name":"hello.txt","hash":"abc","cipher_hash":"override"}"#;

        let payloads = parse_legacy_session(manifest, &[fragment.to_string()]).unwrap();
        assert_eq!(payloads[0].cipher_hash, "override");
    }

    #[test]
    fn split_name_ext_handles_no_extension() {
        assert_eq!(split_name_ext("README"), ("README".to_string(), String::new()));
        assert_eq!(
            split_name_ext("archive.tar.gz"),
            ("archive.tar".to_string(), ".gz".to_string())
        );
    }

    #[test]
    fn detects_legacy_session_shape() {
        let entries = vec![
            std::path::PathBuf::from("manifest.json"),
            std::path::PathBuf::from("part0.bin.json"),
        ];
        assert!(looks_like_legacy_session(&entries));

        let not_legacy = vec![std::path::PathBuf::from("qr-000000.png")];
        assert!(!looks_like_legacy_session(&not_legacy));
    }
}
