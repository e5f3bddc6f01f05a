// ============================================================
// Layer 4 — Wav + JSON Bi-Encoder Dataset
// ============================================================
// Joins a JSON array of QA records with a positional TSV audio
// manifest. Per index, the sample is:
//
//   query     = the spoken question's (1, L) waveform features
//   passages  = the record's positive / negative / hard-negative
//               contexts as Passage values
//
// The join has NO shared key. Record order and manifest ids are
// coupled by convention: record index i carries audio id i + 1.
// That convention is this dataset's weakest invariant — if the
// JSON is ever re-sorted without regenerating the manifest, the
// join silently pairs questions with the wrong audio. The
// coupling is therefore an injected mapping function
// (sample_id_of), so tests can exercise alternate orderings and
// a future explicit-key manifest only has to swap the closure.
//
// Lifecycle: call load_data() once, then the burn Dataset impl
// (get/len) serves the dataloader. get() on corrupt data (a
// missing mapping, an unreadable wav, a wrong sample rate)
// panics with the error chain — continuing would train on
// misaligned pairs, which is strictly worse than dying.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Karpukhin et al. (2020) - Dense Passage Retrieval

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use std::{collections::HashMap, path::PathBuf};

use crate::data::audio::audio_feats;
use crate::data::bounding::{bound_features, TruncationCounter, CUT_LOG_EVERY};
use crate::data::manifest::id_to_audio_file_map;
use crate::data::text::{read_json_records, retain_with_positives, slice_records};
use crate::domain::passage::Passage;
use crate::domain::record::QaRecord;
use crate::domain::sample::{AudioQuery, BiEncoderMixedSample};

/// Default filename prefix of the denoised audio corpus
pub const DEFAULT_AUDIO_FILE_PREFIX: &str = "aud_dn_";

/// Default waveform length cap (~6.25 s at 16 kHz)
pub const DEFAULT_MAX_FEATURES_SZ: usize = 100_000;

/// Maps a 0-based record index to its manifest id.
pub type SampleIdFn = Box<dyn Fn(usize) -> usize + Send + Sync>;

/// Bi-encoder training dataset over JSON QA records with spoken
/// questions resolved through a positional TSV manifest.
pub struct WavJsonTextDataset {
    json_file: PathBuf,
    wav_tsv_file: PathBuf,
    audio_file_prefix: String,
    normalize_text: bool,
    normalize_audio: bool,
    max_features_sz: usize,

    /// Record index → manifest id (default: index + 1)
    sample_id_of: SampleIdFn,

    /// Populated by load_data(); read-only afterwards
    data: Vec<QaRecord>,
    id_to_audio_file_map: HashMap<usize, PathBuf>,
    cut_samples: TruncationCounter,
}

impl WavJsonTextDataset {
    pub fn new(json_file: impl Into<PathBuf>, wav_tsv_file: impl Into<PathBuf>) -> Self {
        Self {
            json_file: json_file.into(),
            wav_tsv_file: wav_tsv_file.into(),
            audio_file_prefix: DEFAULT_AUDIO_FILE_PREFIX.to_string(),
            normalize_text: false,
            normalize_audio: false,
            max_features_sz: DEFAULT_MAX_FEATURES_SZ,
            sample_id_of: Box::new(|index| index + 1),
            data: Vec::new(),
            id_to_audio_file_map: HashMap::new(),
            cut_samples: TruncationCounter::new(Some(CUT_LOG_EVERY)),
        }
    }

    /// Normalize passage text (see domain::passage::normalize_passage)
    pub fn with_normalize_text(mut self, normalize_text: bool) -> Self {
        self.normalize_text = normalize_text;
        self
    }

    /// Layer-normalize each waveform to zero mean / unit variance
    pub fn with_normalize_audio(mut self, normalize_audio: bool) -> Self {
        self.normalize_audio = normalize_audio;
        self
    }

    pub fn with_audio_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.audio_file_prefix = prefix.into();
        self
    }

    pub fn with_max_features_sz(mut self, max_features_sz: usize) -> Self {
        self.max_features_sz = max_features_sz;
        self
    }

    /// Override the record-index → manifest-id convention.
    /// Mostly for tests and for corpora with re-sorted records.
    pub fn with_sample_id_fn(mut self, sample_id_of: SampleIdFn) -> Self {
        self.sample_id_of = sample_id_of;
        self
    }

    /// Load records and build the audio index. Must be called
    /// before get()/len(); single-threaded by contract.
    pub fn load_data(&mut self, start_pos: Option<usize>, end_pos: Option<usize>) -> Result<()> {
        let records = read_json_records(&self.json_file)?;
        let records = retain_with_positives(records);
        self.data = slice_records(records, start_pos, end_pos);

        self.id_to_audio_file_map =
            id_to_audio_file_map(&self.audio_file_prefix, &self.wav_tsv_file)?;
        tracing::info!(
            "id_to_audio_file_map size: {}",
            self.id_to_audio_file_map.len()
        );
        Ok(())
    }

    /// Truncations recorded so far (diagnostic only).
    pub fn cut_samples(&self) -> usize {
        self.cut_samples.count()
    }

    /// Fallible per-index assembly. The Dataset impl wraps this;
    /// callers who want Result-based handling use it directly.
    pub fn fetch(&self, index: usize) -> Result<Option<BiEncoderMixedSample>> {
        let Some(record) = self.data.get(index) else {
            return Ok(None);
        };

        let sample_id = (self.sample_id_of)(index);
        let audio_file = self
            .id_to_audio_file_map
            .get(&sample_id)
            .with_context(|| format!("no audio file mapped for sample id {sample_id}"))?;

        let feats = audio_feats(audio_file, self.normalize_audio)?;
        let feats = bound_features(feats, self.max_features_sz, &self.cut_samples);

        Ok(Some(assemble_mixed_sample(
            AudioQuery::Waveform(feats),
            record,
            self.normalize_text,
        )))
    }
}

impl Dataset<BiEncoderMixedSample> for WavJsonTextDataset {
    fn get(&self, index: usize) -> Option<BiEncoderMixedSample> {
        self.fetch(index)
            .unwrap_or_else(|e| panic!("corrupt training data at index {index}: {e:#}"))
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Shared assembly step: pair one query with a record's passage
/// groups. Used by every bi-encoder dataset variant.
pub(crate) fn assemble_mixed_sample(
    query: AudioQuery,
    record: &QaRecord,
    normalize_text: bool,
) -> BiEncoderMixedSample {
    BiEncoderMixedSample {
        query,
        positive_passages: Passage::from_contexts(&record.positive_ctxs, normalize_text),
        negative_passages: Passage::from_contexts(&record.negative_ctxs, normalize_text),
        hard_negative_passages: Passage::from_contexts(&record.hard_negative_ctxs, normalize_text),
    }
}
