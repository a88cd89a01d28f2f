// qr_encode.rs - QR Encoder Pool (C7)
//
// A fixed-size worker pool, implemented as a rayon parallel iterator rather
// than hand-rolled channels/threads: each job is a pure function over its
// inputs (text in, PNG file out) with no shared mutable state, so rayon's
// work-stealing scheduler is a direct fit. Ordering of completion does not
// matter — the output file name embeds the chunk index.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Luma};
use qrcode::QrCode;
use rayon::prelude::*;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};

pub struct EncodeJob {
    pub out_path: PathBuf,
    pub text: String,
}

/// Render `out_path`'s zero-padded chunk-index PNG name for `index`.
pub fn qr_file_name(index: u32) -> String {
    format!("qr-{index:06}.png")
}

/// Pixels per QR module in the rendered PNG. Large enough that a symbol
/// survives a print-scan-decode round trip at typical phone camera
/// resolutions.
const MODULE_PIXELS: u32 = 8;

/// Render one job's text to a PNG QR symbol using the configured ECL and
/// margin (quiet zone). The `qrcode` crate's renderer exposes the quiet
/// zone as present-or-absent rather than an arbitrary module count, so
/// `config.qr_margin == 0` disables it and any positive value enables the
/// crate's standard 4-module quiet zone.
fn render_one(job: &EncodeJob, config: &Config) -> PipelineResult<()> {
    let code = QrCode::with_error_correction_level(job.text.as_bytes(), config.qr_ecl.to_qrcode_level())
        .map_err(|e| PipelineError::QrCodec(e.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .quiet_zone(config.qr_margin > 0)
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    DynamicImage::ImageLuma8(image)
        .save(&job.out_path)
        .map_err(|e| PipelineError::QrCodec(e.to_string()))?;

    Ok(())
}

/// Render all jobs in parallel across `config.qr_workers` rayon threads.
///
/// Any per-job failure is collected; if any job failed, the whole encode is
/// reported as fatal via the first error encountered (per-job index order),
/// but every job is still attempted so the caller sees the full failure
/// count in logs.
pub fn render_all(jobs: Vec<EncodeJob>, config: &Config) -> PipelineResult<usize> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.qr_workers)
        .build()
        .map_err(|e| PipelineError::QrCodec(e.to_string()))?;

    let results: Vec<PipelineResult<()>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| render_one(job, config))
            .collect()
    });

    let completed = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - completed;

    if failed > 0 {
        log::error!("{failed} of {} QR render jobs failed", results.len());
        let first_err = results.into_iter().find(|r| r.is_err()).unwrap().unwrap_err();
        return Err(first_err);
    }

    Ok(completed)
}

pub fn out_path_for(dir: &Path, index: u32) -> PathBuf {
    dir.join(qr_file_name(index))
}
