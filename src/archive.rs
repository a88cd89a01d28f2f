// archive.rs - Deterministic directory archiver (C2)
//
// Serializes a directory tree into a single `.zip` container suitable for
// feeding into the encryption pipeline. Determinism matters because the
// archive's bytes become the plaintext that gets encrypted and chunked: two
// encode runs over the same tree must produce byte-identical archives so the
// pipeline's output is reproducible.
//
// - Entries are added in sorted path-byte order, not directory-enumeration
//   order, which is filesystem-dependent.
// - Every entry's timestamp is pinned to the earliest value the ZIP format
//   can represent. ZIP stores MS-DOS date/time fields, whose epoch is
//   1980-01-01; there is no way to express the Unix epoch (1970-01-01) in
//   that encoding, so 1980-01-01 00:00:00 is the deterministic floor used
//   here instead.
// - Maximum compression, no per-run nonce anywhere in the container.
// - Symlinks are rejected outright rather than silently dereferenced or
//   skipped, since either choice would make the archive depend on something
//   other than the tree's regular-file content.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{CryptoError, CryptoResult};

/// Maximum number of entries accepted in one archive, a defense-in-depth
/// bound against pathological directory trees rather than a realistic limit.
const MAX_ARCHIVE_ENTRIES: usize = 1_000_000;

/// Deterministically archive `dir_path` into a `.zip` file at `output_path`.
pub fn create_deterministic_zip(dir_path: &Path, output_path: &Path) -> CryptoResult<()> {
    if !dir_path.is_dir() {
        return Err(CryptoError::ArchiveError(format!(
            "not a directory: {}",
            dir_path.display()
        )));
    }

    let mut entries = collect_sorted_entries(dir_path)?;
    if entries.len() > MAX_ARCHIVE_ENTRIES {
        return Err(CryptoError::ArchiveError(format!(
            "too many entries to archive: {} (max {})",
            entries.len(),
            MAX_ARCHIVE_ENTRIES
        )));
    }
    entries.sort_by(|a, b| a.archive_name.as_bytes().cmp(b.archive_name.as_bytes()));

    let file = File::create(output_path).map_err(CryptoError::Io)?;
    let mut writer = ZipWriter::new(file);

    // MS-DOS date/time floor; see module comment.
    let epoch = DateTime::default();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .last_modified_time(epoch)
        .unix_permissions(0o644);

    for entry in &entries {
        if entry.is_dir {
            writer
                .add_directory(&entry.archive_name, options)
                .map_err(zip_err)?;
            continue;
        }

        writer
            .start_file(&entry.archive_name, options)
            .map_err(zip_err)?;
        let mut reader = BufReader::new(File::open(&entry.source_path).map_err(CryptoError::Io)?);
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf).map_err(CryptoError::Io)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).map_err(CryptoError::Io)?;
        }
    }

    writer.finish().map_err(zip_err)?;
    Ok(())
}

/// Extract `zip_path` into `dest_dir`, rejecting path traversal and symlink
/// entries exactly as the archiver refuses to produce them.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> CryptoResult<()> {
    let file = File::open(zip_path).map_err(CryptoError::Io)?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_err)?;

    fs::create_dir_all(dest_dir).map_err(CryptoError::Io)?;
    let dest_dir = fs::canonicalize(dest_dir).map_err(CryptoError::Io)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_err)?;
        let name = entry
            .enclosed_name()
            .ok_or_else(|| CryptoError::ArchiveError(format!("unsafe archive entry name at index {i}")))?;

        let out_path = compute_safe_output_path(&dest_dir, &name)?;

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(CryptoError::Io)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(CryptoError::Io)?;
        }

        let mut out_file = File::create(&out_path).map_err(CryptoError::Io)?;
        std::io::copy(&mut entry, &mut out_file).map_err(CryptoError::Io)?;
    }

    Ok(())
}

struct ArchiveEntry {
    source_path: PathBuf,
    archive_name: String,
    is_dir: bool,
}

fn collect_sorted_entries(dir_path: &Path) -> CryptoResult<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();

    for walk_entry in WalkDir::new(dir_path).min_depth(1).sort_by_file_name() {
        let walk_entry = walk_entry.map_err(|e| CryptoError::ArchiveError(e.to_string()))?;
        let path = walk_entry.path();

        if walk_entry.file_type().is_symlink() {
            return Err(CryptoError::InvalidPath(format!(
                "symlinks are not allowed in archived directories: {}",
                path.display()
            )));
        }

        let relative = path.strip_prefix(dir_path).map_err(|e| {
            CryptoError::ArchiveError(format!("failed to relativize {}: {e}", path.display()))
        })?;
        let archive_name = normalize_archive_name(relative);

        entries.push(ArchiveEntry {
            source_path: path.to_path_buf(),
            archive_name,
            is_dir: walk_entry.file_type().is_dir(),
        });
    }

    Ok(entries)
}

/// Convert a relative filesystem path into a forward-slash archive entry
/// name, independent of the host platform's path separator.
fn normalize_archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a validated archive entry name onto `dest_dir`, rejecting any entry
/// that would escape it.
fn compute_safe_output_path(dest_dir: &Path, entry_name: &Path) -> CryptoResult<PathBuf> {
    let joined = dest_dir.join(entry_name);
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                return Err(CryptoError::ArchiveError(
                    "archive entry contains a parent-directory component".to_string(),
                ));
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    if !normalized.starts_with(dest_dir) {
        return Err(CryptoError::ArchiveError(
            "archive entry escapes destination directory".to_string(),
        ));
    }
    Ok(normalized)
}

fn zip_err(e: zip::result::ZipError) -> CryptoError {
    CryptoError::ArchiveError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn round_trips_a_nested_directory() {
        let src = tempdir().unwrap();
        write_file(&src.path().join("a.txt"), b"hello");
        write_file(&src.path().join("sub/b.bin"), &[7u8; 4096]);

        let out_dir = tempdir().unwrap();
        let zip_path = out_dir.path().join("archive.zip");
        create_deterministic_zip(src.path(), &zip_path).unwrap();

        let extract_dir = tempdir().unwrap();
        extract_zip(&zip_path, extract_dir.path()).unwrap();

        assert_eq!(fs::read(extract_dir.path().join("a.txt")).unwrap(), b"hello");
        assert_eq!(
            fs::read(extract_dir.path().join("sub/b.bin")).unwrap(),
            vec![7u8; 4096]
        );
    }

    #[test]
    fn two_runs_over_the_same_tree_are_byte_identical() {
        let src = tempdir().unwrap();
        write_file(&src.path().join("a.txt"), b"hello");
        write_file(&src.path().join("z.txt"), b"world");

        let out1_dir = tempdir().unwrap();
        let out2_dir = tempdir().unwrap();
        let out1 = out1_dir.path().join("one.zip");
        let out2 = out2_dir.path().join("two.zip");

        create_deterministic_zip(src.path(), &out1).unwrap();
        create_deterministic_zip(src.path(), &out2).unwrap();

        assert_eq!(fs::read(&out1).unwrap(), fs::read(&out2).unwrap());
    }
}
