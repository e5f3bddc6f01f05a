// ============================================================
// Layer 4 — Audio Feature Loader
// ============================================================
// Turns one .wav file into the (1, L) feature matrix the
// speech encoder consumes. The pipeline is deliberately thin:
//
//   decode PCM → validate 16 kHz → mono f32 in [-1, 1]
//      → optional layer norm → reshape to (1, L)
//
// Why no resampling?
//   The corpora are denoised and resampled to 16 kHz upstream,
//   once, as a batch job. A file with any other rate means the
//   wrong file is being read (bad manifest join), and silently
//   resampling would hide exactly the corruption this crate is
//   supposed to surface. So: hard failure.
//
// Why layer norm over the WHOLE signal?
//   wav2vec2-style encoders expect per-utterance zero-mean /
//   unit-variance input when trained that way. The window is
//   the signal's own length — this is normalization, not
//   feature extraction.
//
// No caching: every call re-decodes from disk. Repeated access
// to one index is rare during training (one epoch touches each
// index once), so a cache would only add memory pressure.
//
// Reference: hound crate documentation
//            Baevski et al. (2020) - wav2vec 2.0

use anyhow::{bail, ensure, Context, Result};
use hound::{SampleFormat, WavReader};
use ndarray::Array2;
use std::path::Path;

/// The single sample rate the whole pipeline assumes
pub const SAMPLE_RATE: u32 = 16_000;

/// Epsilon inside the variance square root (matches the common
/// layer-norm default, 1e-5)
const LAYER_NORM_EPS: f32 = 1e-5;

/// Decode one wav file to mono f32 samples in [-1, 1].
///
/// Integer PCM is scaled by the i16 maximum; stereo is averaged
/// down to one channel. Any sample rate other than 16 kHz is a
/// fatal error — see the module header for why.
fn read_audio(path: &Path) -> Result<Vec<f32>> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("cannot open audio file '{}'", path.display()))?;
    let spec = reader.spec();

    ensure!(
        spec.sample_rate == SAMPLE_RATE,
        "file={}, sr={} (expected {})",
        path.display(),
        spec.sample_rate,
        SAMPLE_RATE
    );

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<hound::Result<_>>()
            .with_context(|| format!("corrupt float samples in '{}'", path.display()))?,
        SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / i16::MAX as f32))
            .collect::<hound::Result<_>>()
            .with_context(|| format!("corrupt int samples in '{}'", path.display()))?,
    };

    let samples = match spec.channels {
        1 => samples,
        // Interleaved stereo → average each L/R pair
        2 => samples.chunks(2).map(|c| (c[0] + c[1]) / 2.0).collect(),
        n => bail!("unsupported channel count {} in '{}'", n, path.display()),
    };

    Ok(samples)
}

/// In-place per-utterance layer normalization: zero mean and
/// unit variance over the whole 1-D signal.
fn layer_norm(signal: &mut [f32]) {
    if signal.is_empty() {
        return;
    }
    let n = signal.len() as f32;
    let mean = signal.iter().sum::<f32>() / n;
    let var = signal.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / n;
    let denom = (var + LAYER_NORM_EPS).sqrt();
    for x in signal.iter_mut() {
        *x = (*x - mean) / denom;
    }
}

/// Load one audio file as a (1, L) feature matrix.
///
/// Pure function of its inputs — no caching, no side effects
/// beyond the decode I/O.
pub fn audio_feats(path: &Path, normalize_audio: bool) -> Result<Array2<f32>> {
    let mut samples = read_audio(path)?;

    // Normalization happens on the 1-D signal, before the
    // matrix gains its leading channel axis
    if normalize_audio {
        layer_norm(&mut samples);
    }

    let len = samples.len();
    Array2::from_shape_vec((1, len), samples)
        .with_context(|| format!("cannot shape features from '{}'", path.display()))
}
