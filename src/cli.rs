// cli.rs - Argument parsing and interactive password entry
//
// A thin `clap`-derive front end over the orchestrator. Owns the only
// interactive I/O in the program (password prompts) and the mapping from a
// `PipelineResult` to a process exit code; the orchestrator itself never
// touches stdin/stdout or calls `std::process::exit`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Ecl;

#[derive(Debug, Parser)]
#[command(name = "gitzipqr", version, about = "Back up a file or directory as a set of encrypted QR-code images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// scrypt cost parameter N (must be a power of two).
    #[arg(long, global = true)]
    pub scrypt_n: Option<u64>,

    /// scrypt block size parameter r.
    #[arg(long, global = true)]
    pub scrypt_r: Option<u32>,

    /// scrypt parallelization parameter p.
    #[arg(long, global = true)]
    pub scrypt_p: Option<u32>,

    /// QR error-correction level: L, M, Q, or H.
    #[arg(long, global = true)]
    pub qr_ecl: Option<Ecl>,

    /// Number of worker threads used to render or scan QR images.
    #[arg(long, global = true)]
    pub qr_workers: Option<usize>,

    /// Override the calibrated per-symbol chunk size, in bytes.
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypt a file or directory into a folder of QR-code PNGs.
    Encode {
        /// File or directory to back up.
        input: PathBuf,

        /// Directory to write `qr-NNNNNN.png` images into (created if
        /// missing). Defaults to a `qrcodes/` subdirectory of the current
        /// directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Password. Repeat for multiple passwords (concatenated with a NUL
        /// separator). Falls back to `GITZIPQR_PASSWORD` env, then an
        /// interactive, confirmed prompt.
        #[arg(short, long, env = "GITZIPQR_PASSWORD")]
        password: Vec<String>,
    },

    /// Decode a folder of QR-code PNGs (or a legacy fragment/manifest
    /// session) back into the original file or directory.
    Decode {
        /// Directory containing QR-code images (or a legacy session).
        input: PathBuf,

        /// Directory to write the restored file or directory into. Defaults
        /// to the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Password. Repeat for multiple passwords.
        #[arg(short, long, env = "GITZIPQR_PASSWORD")]
        password: Vec<String>,

        /// Restrict assembly to chunks carrying this fileId, when a
        /// directory holds symbols from more than one session.
        #[arg(long)]
        file_id: Option<String>,
    },
}

/// Default output directory for `encode` when `--output` is absent: a
/// `qrcodes/` subdirectory of the current directory, per the command
/// surface documented in SPEC_FULL.md §6.
pub fn default_encode_output() -> PathBuf {
    PathBuf::from("qrcodes")
}

/// Default output directory for `decode` when `--output` is absent: the
/// current directory. Unlike `encode`, the command surface names no
/// specific subdirectory for restored output.
pub fn default_decode_output() -> PathBuf {
    PathBuf::from(".")
}

/// Resolve the password arguments for `encode`: use `--password`/env values
/// verbatim if any were given, otherwise prompt interactively with
/// confirmation (the two entries must match).
pub fn resolve_encode_passwords(cli_passwords: &[String]) -> std::io::Result<Vec<String>> {
    if !cli_passwords.is_empty() {
        return Ok(cli_passwords.to_vec());
    }

    loop {
        let first = rpassword::prompt_password("Password: ")?;
        let second = rpassword::prompt_password("Confirm password: ")?;
        if first == second {
            return Ok(vec![first]);
        }
        eprintln!("Passwords did not match, try again.");
    }
}

/// Resolve the password arguments for `decode`: use `--password`/env values
/// verbatim if any were given, otherwise prompt once (no confirmation needed
/// when decrypting).
pub fn resolve_decode_passwords(cli_passwords: &[String]) -> std::io::Result<Vec<String>> {
    if !cli_passwords.is_empty() {
        return Ok(cli_passwords.to_vec());
    }

    let password = rpassword::prompt_password("Password: ")?;
    Ok(vec![password])
}
