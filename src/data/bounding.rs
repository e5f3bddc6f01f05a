// ============================================================
// Layer 4 — Length Bounding
// ============================================================
// Hard-caps a feature sequence at a configured bound by keeping
// the PREFIX and dropping the suffix. One shared implementation
// serves every call site (waveform features in three datasets,
// token rows in the quantized reader) so the truncation point
// can never drift between them — an off-by-one here would feed
// different datasets differently-cut audio.
//
// Truncation is a policy decision, not an error: utterances
// longer than the bound lose their tail silently. The only
// visibility is a diagnostic counter, logged periodically:
//   - waveform sites log every 100th cut
//   - the quantized-token site counts but never logs (the cuts
//     there happen once at load, where a final count in the
//     load summary is more useful than periodic lines)
//
// The counter is atomic because dataloader workers call the
// waveform sites concurrently. Relaxed ordering is fine: the
// count is diagnostic, a lost increment under contention is
// acceptable, and nothing synchronizes through it.
//
// Reference: Rust atomics documentation (Ordering::Relaxed)

use ndarray::{s, Array2};
use std::sync::atomic::{AtomicUsize, Ordering};

/// How often the waveform call sites report truncations
pub const CUT_LOG_EVERY: usize = 100;

/// Shared truncation diagnostics: a running count with an
/// optional periodic log cadence.
#[derive(Debug)]
pub struct TruncationCounter {
    /// Total truncations recorded so far
    cut_samples: AtomicUsize,

    /// Log every Nth truncation; None = count silently
    log_every: Option<usize>,
}

impl TruncationCounter {
    pub fn new(log_every: Option<usize>) -> Self {
        Self {
            cut_samples: AtomicUsize::new(0),
            log_every,
        }
    }

    /// Record one truncation, logging if the cadence is hit.
    fn record(&self) {
        let n = self.cut_samples.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(every) = self.log_every {
            if n % every == 0 {
                tracing::info!("cut_samples {}", n);
            }
        }
    }

    /// Total truncations recorded so far.
    pub fn count(&self) -> usize {
        self.cut_samples.load(Ordering::Relaxed)
    }
}

/// Cap a (1, L) feature matrix at `max_features_sz` samples.
/// Keeps the first `max_features_sz` columns, drops the rest.
pub fn bound_features(
    feats: Array2<f32>,
    max_features_sz: usize,
    counter: &TruncationCounter,
) -> Array2<f32> {
    if feats.ncols() <= max_features_sz {
        return feats;
    }
    counter.record();
    feats.slice(s![.., 0..max_features_sz]).to_owned()
}

/// Cap a token row at `max_audio_len` tokens.
/// Keeps the first `max_audio_len` tokens, drops the rest.
pub fn bound_tokens(
    mut tokens: Vec<String>,
    max_audio_len: usize,
    counter: &TruncationCounter,
) -> Vec<String> {
    if tokens.len() <= max_audio_len {
        return tokens;
    }
    counter.record();
    tokens.truncate(max_audio_len);
    tokens
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_long_features_keep_exact_prefix() {
        let counter = TruncationCounter::new(Some(CUT_LOG_EVERY));
        // Worked example: 8 samples capped at 5
        let feats = array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]];

        let bounded = bound_features(feats, 5, &counter);
        assert_eq!(bounded, array![[1.0, 2.0, 3.0, 4.0, 5.0]]);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_short_features_pass_untouched() {
        let counter = TruncationCounter::new(Some(CUT_LOG_EVERY));
        let feats = array![[1.0, 2.0, 3.0]];

        let bounded = bound_features(feats.clone(), 5, &counter);
        assert_eq!(bounded, feats);
        // No truncation happened, so no count
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_exact_length_is_not_a_truncation() {
        let counter = TruncationCounter::new(None);
        let feats = array![[1.0, 2.0, 3.0, 4.0, 5.0]];
        let bounded = bound_features(feats, 5, &counter);
        assert_eq!(bounded.ncols(), 5);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_token_rows_keep_prefix() {
        let counter = TruncationCounter::new(None);
        let tokens: Vec<String> =
            ["1", "2", "3", "4"].iter().map(|s| s.to_string()).collect();

        let bounded = bound_tokens(tokens, 2, &counter);
        assert_eq!(bounded, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_counter_accumulates_across_calls() {
        let counter = TruncationCounter::new(None);
        for _ in 0..3 {
            bound_features(array![[1.0, 2.0]], 1, &counter);
        }
        assert_eq!(counter.count(), 3);
    }
}
