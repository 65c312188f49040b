//! Content fingerprints for duplicate detection.
//!
//! The primary fingerprint is a SHA-256 over the Chromaprint vector of the
//! first two minutes of audio, which survives re-tagging and re-encoding
//! of the same recording. When the audio cannot be decoded the fallback is
//! a SHA-256 over the rounded duration and normalized title. The two kinds
//! carry different prefixes so they never collide.

use anyhow::{Context, Result};
use rusty_chromaprint::{Configuration, Fingerprinter};
use sha2::{Digest, Sha256};
use std::path::Path;

use super::decoder::decode_mono;

pub const CHROMAPRINT_PREFIX: &str = "cp:";
pub const METADATA_PREFIX: &str = "meta:";

/// Seconds of audio fed to Chromaprint.
const FINGERPRINT_SECS: u32 = 120;

/// Compute the raw Chromaprint vector and the stream duration.
pub fn chromaprint(path: &Path) -> Result<(Vec<u32>, f64)> {
    let audio = decode_mono(path, FINGERPRINT_SECS)
        .with_context(|| format!("Failed to decode audio: {}", path.display()))?;

    let config = Configuration::preset_test2();
    let mut fpr = Fingerprinter::new(&config);
    fpr.start(audio.sample_rate, 1)
        .context("Failed to start fingerprinter")?;
    fpr.consume(&audio.samples);
    fpr.finish();

    Ok((fpr.fingerprint().to_vec(), audio.duration_secs))
}

/// The catalog fingerprint for a file.
///
/// Never fails: undecodable audio falls back to the metadata hash using
/// `duration_hint` and `title`.
pub fn content_fingerprint(path: &Path, duration_hint: Option<f64>, title: &str) -> String {
    match chromaprint(path) {
        Ok((vector, _)) if !vector.is_empty() => {
            let mut hasher = Sha256::new();
            for value in &vector {
                hasher.update(value.to_le_bytes());
            }
            format!("{CHROMAPRINT_PREFIX}{}", hex::encode(hasher.finalize()))
        }
        Ok((_, duration)) => {
            log::warn!(
                "Audio in {} too short to fingerprint; using metadata hash",
                path.display()
            );
            metadata_fingerprint(Some(duration).filter(|d| *d > 0.0).or(duration_hint), title)
        }
        Err(e) => {
            log::warn!("Cannot fingerprint {}: {:#}; using metadata hash", path.display(), e);
            metadata_fingerprint(duration_hint, title)
        }
    }
}

/// Hash of rounded duration and normalized title.
pub fn metadata_fingerprint(duration_secs: Option<f64>, title: &str) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let seconds = duration_secs.map_or(0, |d| d.round() as i64);
    let normalized: String = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(format!("{seconds}|{normalized}").as_bytes());
    format!("{METADATA_PREFIX}{}", hex::encode(hasher.finalize()))
}
