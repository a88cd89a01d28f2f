// orchestrator.rs - Orchestrator (C10)
//
// Drives the seven-step encode pipeline and the four-step decode pipeline.
// Owns a temporary directory that is torn down on success and on failure
// (via `tempfile::TempDir`'s Drop impl — no explicit cleanup code is
// needed on either path). Prints `STEP #N <label> ... [1|0]` lines to
// stderr as each step completes; `0` indicates that step failed and the
// whole run is aborted there. This is distinct from, and always printed
// regardless of, the `log` diagnostic stream (see `main.rs`).

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use walkdir::WalkDir;

use crate::archive::{create_deterministic_zip, extract_zip};
use crate::assembler::Assembler;
use crate::capacity::calibrate_chunk_size;
use crate::chunker::chunk_frame;
use crate::config::Config;
use crate::crypto::{self, KdfParams, Password};
use crate::error::{PipelineError, PipelineResult};
use crate::hash::{derive_file_id, hash_file_hex};
use crate::legacy;
use crate::payload::{encode_payload, ChunkPayload, KdfParamsWire};
use crate::qr_decode::decode_all;
use crate::qr_encode::{out_path_for, render_all, EncodeJob};

/// Print a step line in the `STEP #N <label> ... [0|1]` format (C10
/// contract). Always goes to stderr, unconditionally, independent of the
/// `RUST_LOG` diagnostic filter.
fn step_line(n: u32, label: &str, ok: bool) {
    eprintln!("STEP #{n} {label} ... [{}]", if ok { 1 } else { 0 });
}

/// Outcome of a successful encode run.
pub struct EncodeOutcome {
    pub output_dir: PathBuf,
    pub total_chunks: u32,
    pub file_id: String,
}

/// Run the full encode pipeline: gather password, prepare data, encrypt,
/// calibrate capacity, chunk, render, summarize.
pub fn encode(
    input_path: &Path,
    output_dir: &Path,
    passwords: &[Password],
    config: &Config,
) -> PipelineResult<EncodeOutcome> {
    // Step 1: gather password.
    let password_bytes = crypto::concat_passwords(passwords);
    if password_bytes.len() < 8 {
        step_line(1, "gather password", false);
        return Err(PipelineError::PasswordTooShort);
    }
    step_line(1, "gather password", true);

    let temp_dir = tempfile::tempdir()?;

    // Step 2: prepare data (archive if directory, copy if file).
    let (plaintext_path, name, ext) = match prepare_source(input_path, temp_dir.path()) {
        Ok(result) => {
            step_line(2, "prepare data", true);
            result
        }
        Err(e) => {
            step_line(2, "prepare data", false);
            return Err(e);
        }
    };

    // Step 3: encrypt.
    let frame_path = temp_dir.path().join("frame.bin");
    let (kdf_params, salt, nonce) = match encrypt_step(&plaintext_path, &frame_path, &password_bytes, config) {
        Ok(result) => {
            step_line(3, "encrypt", true);
            result
        }
        Err(e) => {
            step_line(3, "encrypt", false);
            return Err(e);
        }
    };

    let cipher_hash = hash_file_hex(&frame_path)?;
    let file_id = derive_file_id(&name, &cipher_hash);

    // Step 4: calibrate capacity.
    let chunk_size = calibrate_chunk_size(config.qr_ecl, config.chunk_size_override);
    step_line(4, "calibrate capacity", true);

    // Step 5: chunk and enqueue jobs.
    let raw_chunks = match chunk_frame(&frame_path, chunk_size) {
        Ok(c) => {
            step_line(5, "chunk and enqueue", true);
            c
        }
        Err(e) => {
            step_line(5, "chunk and enqueue", false);
            return Err(e);
        }
    };
    let total = raw_chunks.len() as u32;

    fs::create_dir_all(output_dir)?;
    let mut jobs = Vec::with_capacity(raw_chunks.len());
    for chunk in &raw_chunks {
        let payload = ChunkPayload {
            payload_type: crate::payload::PAYLOAD_TYPE.to_string(),
            version: crate::payload::PAYLOAD_VERSION.to_string(),
            file_id: file_id.clone(),
            name: name.clone(),
            ext: ext.clone(),
            chunk: chunk.index,
            total,
            hash: chunk.hash_hex.clone(),
            cipher_hash: cipher_hash.clone(),
            data_b64: base64::engine::general_purpose::STANDARD.encode(&chunk.bytes),
            kdf_params: KdfParamsWire::from(kdf_params),
            salt_b64: base64::engine::general_purpose::STANDARD.encode(&salt),
            nonce_b64: base64::engine::general_purpose::STANDARD.encode(&nonce),
            chunk_size: chunk_size as u32,
        };
        let text = encode_payload(&payload)
            .map_err(|e| PipelineError::MalformedPayload(e.to_string()))?;
        jobs.push(EncodeJob {
            out_path: out_path_for(output_dir, chunk.index),
            text,
        });
    }

    // Step 6: render in parallel.
    match render_all(jobs, config) {
        Ok(_) => step_line(6, "render QR symbols", true),
        Err(e) => {
            step_line(6, "render QR symbols", false);
            return Err(e);
        }
    }

    // Step 7: summary.
    step_line(7, "summary", true);
    log::info!(
        "encoded {} into {} chunks, fileId={}",
        input_path.display(),
        total,
        file_id
    );

    Ok(EncodeOutcome {
        output_dir: output_dir.to_path_buf(),
        total_chunks: total,
        file_id,
    })
}

fn prepare_source(
    input_path: &Path,
    scratch_dir: &Path,
) -> PipelineResult<(PathBuf, String, String)> {
    if !input_path.exists() {
        return Err(PipelineError::MissingInput(
            input_path.display().to_string(),
        ));
    }

    if input_path.is_dir() {
        let name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());
        let zip_path = scratch_dir.join("source.zip");
        create_deterministic_zip(input_path, &zip_path)?;
        Ok((zip_path, name, ".zip".to_string()))
    } else {
        let (name, ext) = split_name_ext(input_path);
        let copy_path = scratch_dir.join("source.bin");
        fs::copy(input_path, &copy_path)?;
        Ok((copy_path, name, ext))
    }
}

fn split_name_ext(path: &Path) -> (String, String) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (file_name[..idx].to_string(), file_name[idx..].to_string()),
        _ => (file_name, String::new()),
    }
}

fn encrypt_step(
    plaintext_path: &Path,
    frame_path: &Path,
    password_bytes: &[u8],
    config: &Config,
) -> PipelineResult<(KdfParams, Vec<u8>, Vec<u8>)> {
    let plaintext = fs::read(plaintext_path)?;
    let salt = crypto::generate_salt()?;
    let params = KdfParams::new(config.scrypt_n, config.scrypt_r, config.scrypt_p);
    let key = crypto::derive_key(password_bytes, &salt, params)?;

    let (nonce, ciphertext) = crypto::encrypt(&key, &plaintext)?;

    fs::write(frame_path, &ciphertext)?;
    Ok((params, salt, nonce))
}

/// Outcome of a successful decode run.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub output_path: PathBuf,
}

/// Run the full decode pipeline: collect payloads, verify and assemble,
/// decrypt, write output.
pub fn decode(
    input_path: &Path,
    output_dir: &Path,
    passwords: &[Password],
    requested_file_id: Option<&str>,
    config: &Config,
) -> PipelineResult<DecodeOutcome> {
    // Step 1: collect payloads.
    let payloads = match collect_payloads(input_path, config) {
        Ok(p) if !p.is_empty() => {
            step_line(1, "collect payloads", true);
            p
        }
        Ok(_) => {
            step_line(1, "collect payloads", false);
            return Err(PipelineError::EmptySymbolSet);
        }
        Err(e) => {
            step_line(1, "collect payloads", false);
            return Err(e);
        }
    };

    let selected = select_session(payloads, requested_file_id)?;

    // Step 2: verify and assemble.
    let mut assembler = Assembler::new();
    for payload in selected {
        assembler.accept(payload)?;
    }
    let frame = match assembler.try_finish() {
        Ok(f) => {
            step_line(2, "verify and assemble", true);
            f
        }
        Err(e) => {
            step_line(2, "verify and assemble", false);
            return Err(e);
        }
    };

    let kdf_params = assembler
        .kdf_params()
        .ok_or(PipelineError::EmptySymbolSet)?;
    let salt = assembler.salt().ok_or(PipelineError::EmptySymbolSet)?;
    let nonce = assembler.nonce().ok_or(PipelineError::EmptySymbolSet)?;
    let name = assembler.name().unwrap_or("output").to_string();
    let ext = assembler.ext().unwrap_or("").to_string();

    // Step 3: decrypt.
    let password_bytes = crypto::concat_passwords(passwords);
    let plaintext = match decrypt_frame(&frame, &password_bytes, &salt, &nonce, kdf_params) {
        Ok(p) => {
            step_line(3, "decrypt", true);
            p
        }
        Err(e) => {
            step_line(3, "decrypt", false);
            return Err(e);
        }
    };

    // Step 4: write output.
    let output_path = write_output(&plaintext, output_dir, &name, &ext)?;
    step_line(4, "write output", true);
    log::info!("decoded {} into {}", input_path.display(), output_path.display());

    Ok(DecodeOutcome { output_path })
}

fn decrypt_frame(
    frame: &[u8],
    password_bytes: &[u8],
    salt: &[u8],
    nonce: &[u8],
    kdf_params: KdfParams,
) -> PipelineResult<Vec<u8>> {
    if frame.len() < 16 {
        return Err(PipelineError::CryptoFailure);
    }
    let key = crypto::derive_key(password_bytes, salt, kdf_params)?;
    crypto::decrypt(&key, nonce, frame).map_err(|_| PipelineError::CryptoFailure)
}

fn write_output(
    plaintext: &[u8],
    output_dir: &Path,
    name: &str,
    ext: &str,
) -> PipelineResult<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let resolved_ext = if ext.is_empty() {
        detect_extension(plaintext)
    } else {
        ext.to_string()
    };

    if resolved_ext == ".zip" {
        let zip_path = output_dir.join(format!("{name}.zip"));
        fs::write(&zip_path, plaintext)?;
        Ok(zip_path)
    } else {
        let out_path = output_dir.join(format!("{name}{resolved_ext}"));
        fs::write(&out_path, plaintext)?;
        Ok(out_path)
    }
}

/// Best-effort magic-number sniffing for files whose extension was not
/// recorded (`ext == ""`). Falls back to `.bin` when nothing matches.
fn detect_extension(bytes: &[u8]) -> String {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    const PDF: &[u8] = b"%PDF";
    const ZIP: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
    const GZIP: &[u8] = &[0x1F, 0x8B];

    if bytes.starts_with(PNG) {
        ".png".to_string()
    } else if bytes.starts_with(JPEG) {
        ".jpg".to_string()
    } else if bytes.starts_with(PDF) {
        ".pdf".to_string()
    } else if bytes.starts_with(ZIP) {
        ".zip".to_string()
    } else if bytes.starts_with(GZIP) {
        ".gz".to_string()
    } else {
        ".bin".to_string()
    }
}

/// Unpack a directory path into the QR image payload list, or fall back to
/// the legacy fragment/manifest acceptance mode.
///
/// A single-file `input_path` that is itself a legacy `manifest.json` or
/// `*.bin.json` fragment is accepted too: the rest of that session's files
/// are expected alongside it in the same directory, so the parent directory
/// is scanned instead of treating the lone path as the whole session.
fn collect_payloads(input_path: &Path, config: &Config) -> PipelineResult<Vec<ChunkPayload>> {
    if !input_path.exists() {
        return Err(PipelineError::MissingInput(
            input_path.display().to_string(),
        ));
    }

    let is_legacy_pointer =
        input_path.is_file() && (legacy::is_manifest(input_path) || legacy::is_fragment(input_path));

    let entries: Vec<PathBuf> = if input_path.is_dir() || is_legacy_pointer {
        let scan_dir = if is_legacy_pointer {
            input_path.parent().unwrap_or(input_path)
        } else {
            input_path
        };
        WalkDir::new(scan_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .collect()
    } else {
        vec![input_path.to_path_buf()]
    };

    if legacy::looks_like_legacy_session(&entries) {
        return collect_legacy_payloads(&entries);
    }

    let image_paths: Vec<PathBuf> = entries
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();

    let outcomes = decode_all(&image_paths, config);
    Ok(outcomes.into_iter().filter_map(|o| o.payload).collect())
}

fn collect_legacy_payloads(entries: &[PathBuf]) -> PipelineResult<Vec<ChunkPayload>> {
    let manifest_path = entries
        .iter()
        .find(|p| legacy::is_manifest(p))
        .ok_or(PipelineError::EmptySymbolSet)?;
    let manifest_json = fs::read_to_string(manifest_path)?;

    let fragment_jsons: Vec<String> = entries
        .iter()
        .filter(|p| legacy::is_fragment(p))
        .map(fs::read_to_string)
        .collect::<Result<_, _>>()?;

    legacy::parse_legacy_session(&manifest_json, &fragment_jsons)
        .map_err(PipelineError::MalformedPayload)
}

/// Group payloads by `fileId` and pick the requested one, or the first
/// complete-looking group when none was requested.
fn select_session(
    payloads: Vec<ChunkPayload>,
    requested_file_id: Option<&str>,
) -> PipelineResult<Vec<ChunkPayload>> {
    if let Some(id) = requested_file_id {
        let matching: Vec<ChunkPayload> = payloads
            .into_iter()
            .filter(|p| p.file_id == id)
            .collect();
        if matching.is_empty() {
            return Err(PipelineError::MissingInput(format!(
                "no payloads found for fileId {id}"
            )));
        }
        return Ok(matching);
    }

    if payloads.iter().all(|p| p.file_id.is_empty()) {
        // Legacy sessions never populate fileId.
        return Ok(payloads);
    }

    let mut by_id: std::collections::BTreeMap<String, Vec<ChunkPayload>> = Default::default();
    for payload in payloads {
        by_id.entry(payload.file_id.clone()).or_default().push(payload);
    }

    let mut groups = by_id.into_values();
    let mut fallback: Option<Vec<ChunkPayload>> = None;
    for group in groups.by_ref() {
        if group_is_complete(&group) {
            return Ok(group);
        }
        if fallback.is_none() {
            fallback = Some(group);
        }
    }

    fallback.ok_or(PipelineError::EmptySymbolSet)
}

/// Whether a `fileId` group carries every chunk index its own `total` field
/// claims, the same completeness condition `Assembler::try_finish` checks.
fn group_is_complete(group: &[ChunkPayload]) -> bool {
    let Some(total) = group.first().map(|p| p.total) else {
        return false;
    };
    if group.len() != total as usize {
        return false;
    }
    let mut seen = vec![false; total as usize];
    for payload in group {
        if payload.total != total {
            return false;
        }
        match seen.get_mut(payload.chunk as usize) {
            Some(slot) => *slot = true,
            None => return false,
        }
    }
    seen.into_iter().all(|present| present)
}

/// Extract a restored directory archive. Called by the CLI after `decode`
/// writes the `.zip` output when the caller wants the tree rather than the
/// archive file itself.
pub fn extract_restored_archive(zip_path: &Path, dest_dir: &Path) -> PipelineResult<()> {
    extract_zip(zip_path, dest_dir).map_err(PipelineError::from)
}
