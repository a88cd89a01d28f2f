use std::fs;
use std::path::Path;

use gitzipqr_lib::config::{Config, Ecl};
use gitzipqr_lib::crypto::Password;
use gitzipqr_lib::orchestrator::{decode, encode};
use tempfile::tempdir;

/// A fast config for tests: scrypt's real cost parameter makes every
/// derivation take a deliberate fraction of a second, which is the point in
/// production but just adds up here.
fn fast_config(ecl: Ecl) -> Config {
    Config {
        scrypt_n: 1 << 10,
        qr_ecl: ecl,
        ..Config::default()
    }
}

fn qr_pngs(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    paths.sort();
    paths
}

#[test]
fn s1_tiny_file_round_trips() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hello.txt");
    fs::write(&input, b"Hello World\n").unwrap();

    let qr_dir = dir.path().join("qr");
    let restore_dir = dir.path().join("restored");
    let passwords = vec![Password::new("correct horse battery".to_string())];
    let config = fast_config(Ecl::Q);

    let encoded = encode(&input, &qr_dir, &passwords, &config).unwrap();
    assert_eq!(encoded.total_chunks, 1);
    assert_eq!(qr_pngs(&qr_dir).len(), 1);
    assert!(qr_dir.join("qr-000000.png").exists());

    let decoded = decode(&qr_dir, &restore_dir, &passwords, None, &config).unwrap();
    assert_eq!(fs::read(&decoded.output_path).unwrap(), b"Hello World\n");
    assert_eq!(decoded.output_path.file_name().unwrap(), "hello.txt");
}

#[test]
fn s2_folder_round_trips_as_a_zip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("project");
    fs::create_dir_all(source.join("sub")).unwrap();
    fs::write(source.join("a.txt"), vec![b'a'; 100]).unwrap();
    fs::write(source.join("sub/b.bin"), vec![0x42u8; 4096]).unwrap();

    let qr_dir = dir.path().join("qr");
    let restore_dir = dir.path().join("restored");
    let passwords = vec![Password::new("correct horse battery".to_string())];
    let config = fast_config(Ecl::H);

    let encoded = encode(&source, &qr_dir, &passwords, &config).unwrap();
    assert!(encoded.total_chunks >= 5);

    let decoded = decode(&qr_dir, &restore_dir, &passwords, None, &config).unwrap();
    assert!(decoded.output_path.to_string_lossy().ends_with(".zip"));

    let extracted = restore_dir.join("extracted");
    gitzipqr_lib::archive::extract_zip(&decoded.output_path, &extracted).unwrap();
    assert_eq!(fs::read(extracted.join("a.txt")).unwrap(), vec![b'a'; 100]);
    assert_eq!(
        fs::read(extracted.join("sub/b.bin")).unwrap(),
        vec![0x42u8; 4096]
    );
}

#[test]
fn s3_wrong_password_aborts_without_writing_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hello.txt");
    fs::write(&input, b"Hello World\n").unwrap();

    let qr_dir = dir.path().join("qr");
    let restore_dir = dir.path().join("restored");
    let config = fast_config(Ecl::Q);

    encode(
        &input,
        &qr_dir,
        &[Password::new("correct horse battery".to_string())],
        &config,
    )
    .unwrap();

    let result = decode(
        &qr_dir,
        &restore_dir,
        &[Password::new("wrong horse".to_string())],
        None,
        &config,
    );
    assert!(result.is_err());
    assert!(!restore_dir.exists() || fs::read_dir(&restore_dir).unwrap().next().is_none());
}

#[test]
fn s4_corrupted_symbol_fails_the_hash_check() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    fs::write(&input, vec![0x11u8; 20_000]).unwrap();

    let qr_dir = dir.path().join("qr");
    let restore_dir = dir.path().join("restored");
    let passwords = vec![Password::new("correct horse battery".to_string())];
    let mut config = fast_config(Ecl::Q);
    config.chunk_size_override = Some(512);

    let encoded = encode(&input, &qr_dir, &passwords, &config).unwrap();
    assert!(encoded.total_chunks >= 3);

    corrupt_non_first_chunk_payload(&qr_dir);

    let result = decode(&qr_dir, &restore_dir, &passwords, None, &config);
    match result {
        Err(gitzipqr_lib::error::PipelineError::MissingChunks(missing)) => {
            assert!(!missing.is_empty());
        }
        other => panic!("expected MissingChunks, got {other:?}"),
    }
}

#[test]
fn s5_shuffled_file_names_still_decode() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("project");
    fs::create_dir_all(source.join("sub")).unwrap();
    fs::write(source.join("a.txt"), vec![b'a'; 100]).unwrap();
    fs::write(source.join("sub/b.bin"), vec![0x42u8; 4096]).unwrap();

    let qr_dir = dir.path().join("qr");
    let shuffled_dir = dir.path().join("shuffled");
    fs::create_dir_all(&shuffled_dir).unwrap();
    let restore_dir = dir.path().join("restored");
    let passwords = vec![Password::new("correct horse battery".to_string())];
    let config = fast_config(Ecl::H);

    encode(&source, &qr_dir, &passwords, &config).unwrap();

    for (i, png) in qr_pngs(&qr_dir).into_iter().enumerate() {
        let shuffled_name = format!("symbol-{:x}.png", 0xdead_beefu32.wrapping_add(i as u32 * 17));
        fs::rename(&png, shuffled_dir.join(shuffled_name)).unwrap();
    }

    let decoded = decode(&shuffled_dir, &restore_dir, &passwords, None, &config).unwrap();
    assert!(decoded.output_path.exists());
}

#[test]
fn s6_large_file_respects_the_chunk_size_floor() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("large.bin");
    fs::write(&input, vec![0x7eu8; 10 * 1024 * 1024]).unwrap();

    let qr_dir = dir.path().join("qr");
    let passwords = vec![Password::new("correct horse battery".to_string())];
    let config = fast_config(Ecl::H);

    let encoded = encode(&input, &qr_dir, &passwords, &config).unwrap();
    assert!(encoded.total_chunks > 0);

    let pngs = qr_pngs(&qr_dir);
    assert_eq!(pngs.len() as u32, encoded.total_chunks);

    let outcome = gitzipqr_lib::qr_decode::decode_all(&pngs, &config);
    for o in outcome {
        assert!(o.payload.is_some(), "{} did not decode", o.path.display());
    }
}

/// Flip a byte inside the base64 `dataB64` field of a non-first chunk's QR
/// payload, re-render it, and overwrite the PNG in place.
fn corrupt_non_first_chunk_payload(qr_dir: &Path) {
    let pngs = qr_pngs(qr_dir);
    let target = &pngs[1];

    let image = image::open(target).unwrap().to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(image);
    let grids = prepared.detect_grids();
    let (_meta, text) = grids[0].decode().unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let data_b64 = value["dataB64"].as_str().unwrap().to_string();
    let mut bytes = data_b64.into_bytes();
    bytes[0] ^= 0xff;
    value["dataB64"] = serde_json::Value::String(String::from_utf8(bytes).unwrap());
    let corrupted_text = serde_json::to_string(&value).unwrap();

    let config = Config::default();
    gitzipqr_lib::qr_encode::render_all(
        vec![gitzipqr_lib::qr_encode::EncodeJob {
            out_path: target.clone(),
            text: corrupted_text,
        }],
        &config,
    )
    .unwrap();
}
