// config.rs - Explicit configuration value struct
//
// Built once at process start, in order of increasing precedence: built-in
// defaults, then environment variables, then CLI flags (applied by the
// caller via the `With*` setters). No component reads the environment or
// any other process-global state directly; `Config` is threaded by value or
// by reference into every component that needs it.

use qrcode::EcLevel;

/// Default scrypt CPU/memory cost parameter `N` (as a power of two: 2^15).
pub const DEFAULT_SCRYPT_LOG_N: u8 = 15;
pub const DEFAULT_SCRYPT_R: u32 = 8;
pub const DEFAULT_QR_MARGIN: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecl {
    L,
    M,
    Q,
    H,
}

impl Ecl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecl::L => "L",
            Ecl::M => "M",
            Ecl::Q => "Q",
            Ecl::H => "H",
        }
    }

    pub fn to_qrcode_level(self) -> EcLevel {
        match self {
            Ecl::L => EcLevel::L,
            Ecl::M => EcLevel::M,
            Ecl::Q => EcLevel::Q,
            Ecl::H => EcLevel::H,
        }
    }
}

impl std::str::FromStr for Ecl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" => Ok(Ecl::L),
            "M" => Ok(Ecl::M),
            "Q" => Ok(Ecl::Q),
            "H" => Ok(Ecl::H),
            other => Err(format!("unknown ECL `{other}`, expected one of L|M|Q|H")),
        }
    }
}

/// Threaded configuration for a single encode or decode run.
#[derive(Debug, Clone)]
pub struct Config {
    pub scrypt_n: u64,
    pub scrypt_r: u32,
    pub scrypt_p: u32,
    pub qr_ecl: Ecl,
    pub qr_margin: u32,
    pub qr_workers: usize,
    pub chunk_size_override: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scrypt_n: 1u64 << DEFAULT_SCRYPT_LOG_N,
            scrypt_r: DEFAULT_SCRYPT_R,
            scrypt_p: num_cpus::get() as u32,
            qr_ecl: Ecl::Q,
            qr_margin: DEFAULT_QR_MARGIN,
            qr_workers: num_cpus::get().max(1),
            chunk_size_override: None,
        }
    }
}

impl Config {
    /// Overlay environment variables onto the built-in defaults.
    ///
    /// CLI flags are applied afterwards by the caller (see `cli.rs`), so this
    /// function alone establishes the "defaults < env" half of the
    /// precedence chain; it never reads a CLI flag.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(n) = env_u64("SCRYPT_N") {
            cfg.scrypt_n = n;
        }
        if let Some(r) = env_u32("SCRYPT_r") {
            cfg.scrypt_r = r;
        }
        if let Some(p) = env_u32("SCRYPT_p") {
            cfg.scrypt_p = p;
        }
        if let Ok(ecl) = std::env::var("QR_ECL") {
            if let Ok(parsed) = ecl.parse() {
                cfg.qr_ecl = parsed;
            }
        }
        if let Some(margin) = env_u32("QR_MARGIN") {
            cfg.qr_margin = margin;
        }
        if let Some(workers) = env_usize("QR_WORKERS") {
            cfg.qr_workers = workers.max(1);
        }
        if let Some(size) = env_usize("CHUNK_SIZE") {
            cfg.chunk_size_override = Some(size);
        }

        cfg
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_expected_scrypt_n() {
        let cfg = Config::default();
        assert_eq!(cfg.scrypt_n, 1 << 15);
        assert_eq!(cfg.scrypt_r, 8);
        assert_eq!(cfg.qr_ecl, Ecl::Q);
    }

    #[test]
    fn ecl_parses_case_insensitively() {
        assert_eq!("q".parse::<Ecl>().unwrap(), Ecl::Q);
        assert_eq!("H".parse::<Ecl>().unwrap(), Ecl::H);
        assert!("Z".parse::<Ecl>().is_err());
    }
}
