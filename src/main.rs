// main.rs - Thin entrypoint
//
// Builds the layered `Config` (defaults < env < CLI flags), parses
// arguments, resolves passwords, invokes the orchestrator, and translates
// the result into a process exit code. All cryptography, archiving, and QR
// work lives in the library; this file only wires it together and owns
// process exit.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use gitzipqr_lib::cli::{
    default_decode_output, default_encode_output, resolve_decode_passwords,
    resolve_encode_passwords, Cli, Command,
};
use gitzipqr_lib::config::Config;
use gitzipqr_lib::crypto::Password;
use gitzipqr_lib::error::PipelineError;
use gitzipqr_lib::orchestrator;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    let result = match &cli.command {
        Command::Encode {
            input,
            output,
            password,
        } => {
            let output = output.clone().unwrap_or_else(default_encode_output);
            run_encode(input, &output, password, &config)
        }
        Command::Decode {
            input,
            output,
            password,
            file_id,
        } => {
            let output = output.clone().unwrap_or_else(default_decode_output);
            run_decode(input, &output, password, file_id.as_deref(), &config)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gitzipqr: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Layer CLI flags on top of `Config::from_env()`, the final step in the
/// defaults < env < CLI precedence chain.
fn build_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();

    if let Some(n) = cli.scrypt_n {
        config.scrypt_n = n;
    }
    if let Some(r) = cli.scrypt_r {
        config.scrypt_r = r;
    }
    if let Some(p) = cli.scrypt_p {
        config.scrypt_p = p;
    }
    if let Some(ecl) = cli.qr_ecl {
        config.qr_ecl = ecl;
    }
    if let Some(workers) = cli.qr_workers {
        config.qr_workers = workers.max(1);
    }
    if let Some(size) = cli.chunk_size {
        config.chunk_size_override = Some(size);
    }

    config
}

/// An error surfaced to the user at the top level: either a failure reading
/// a password from the terminal, or a typed pipeline failure.
enum CliError {
    Io(std::io::Error),
    Pipeline(PipelineError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "could not read password: {e}"),
            CliError::Pipeline(e) => write!(f, "{}", e.step_cause()),
        }
    }
}

fn run_encode(
    input: &Path,
    output: &Path,
    cli_passwords: &[String],
    config: &Config,
) -> Result<(), CliError> {
    let passwords = resolve_encode_passwords(cli_passwords).map_err(CliError::Io)?;
    let passwords: Vec<Password> = passwords.into_iter().map(Password::new).collect();

    let outcome =
        orchestrator::encode(input, output, &passwords, config).map_err(CliError::Pipeline)?;
    println!(
        "wrote {} QR image(s) to {} (fileId {})",
        outcome.total_chunks,
        outcome.output_dir.display(),
        outcome.file_id
    );
    Ok(())
}

fn run_decode(
    input: &Path,
    output: &Path,
    cli_passwords: &[String],
    file_id: Option<&str>,
    config: &Config,
) -> Result<(), CliError> {
    let passwords = resolve_decode_passwords(cli_passwords).map_err(CliError::Io)?;
    let passwords: Vec<Password> = passwords.into_iter().map(Password::new).collect();

    let outcome = orchestrator::decode(input, output, &passwords, file_id, config)
        .map_err(CliError::Pipeline)?;
    println!("restored {}", outcome.output_path.display());
    Ok(())
}
