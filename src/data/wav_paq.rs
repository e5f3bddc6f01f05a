// ============================================================
// Layer 4 — Wav + PAQ Bi-Encoder Dataset
// ============================================================
// Joins JSONL QA records with the PAQ audio corpus. Unlike the
// positional TSV join, PAQ audio is keyed by QUESTION TEXT —
// the `|`-delimited manifest names which question each utterance
// speaks, and only a subset of the records have audio at all.
//
// Partial coverage drives the error posture:
//   - a question with no audio mapping yields None from get(),
//     with a warning — the collate step downstream filters
//     these out, by contract
//   - an audio file missing on disk is warned about at index
//     build time but kept in the map; the decode error at
//     fetch time names the exact file, which is the diagnostic
//     that actually helps
//
// Everything else (feature loading, bounding, passage assembly)
// is identical to the wav_json variant and shared with it.
//
// Reference: Lewis et al. (2021) - PAQ: 65 Million
//            Probably-Asked Questions
//            Burn Book §4 (Datasets and Dataloaders)

use anyhow::Result;
use burn::data::dataset::Dataset;
use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
};

use crate::data::audio::audio_feats;
use crate::data::bounding::{bound_features, TruncationCounter, CUT_LOG_EVERY};
use crate::data::manifest::question_to_audio_file_map;
use crate::data::text::{read_jsonl_records, retain_with_positives, slice_records};
use crate::data::wav_json::{
    assemble_mixed_sample, DEFAULT_AUDIO_FILE_PREFIX, DEFAULT_MAX_FEATURES_SZ,
};
use crate::domain::record::QaRecord;
use crate::domain::sample::{AudioQuery, BiEncoderMixedSample};

/// Bi-encoder training dataset over JSONL QA records with PAQ
/// audio resolved by question text. Coverage is partial: get()
/// returns None for questions without audio.
pub struct WavPaqTextDataset {
    jsonl_file: PathBuf,
    manifest_txt_file: PathBuf,
    wav_root_dir: PathBuf,
    audio_file_prefix: String,
    normalize_text: bool,
    normalize_audio: bool,
    max_features_sz: usize,
    total_data_size: Option<usize>,

    /// Populated by load_data(); read-only afterwards
    data: Vec<QaRecord>,
    q_to_audio_file_map: HashMap<String, PathBuf>,
    cut_samples: TruncationCounter,
}

impl WavPaqTextDataset {
    pub fn new(
        jsonl_file: impl Into<PathBuf>,
        manifest_txt_file: impl Into<PathBuf>,
        wav_root_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            jsonl_file: jsonl_file.into(),
            manifest_txt_file: manifest_txt_file.into(),
            wav_root_dir: wav_root_dir.into(),
            audio_file_prefix: DEFAULT_AUDIO_FILE_PREFIX.to_string(),
            normalize_text: false,
            normalize_audio: false,
            max_features_sz: DEFAULT_MAX_FEATURES_SZ,
            total_data_size: None,
            data: Vec::new(),
            q_to_audio_file_map: HashMap::new(),
            cut_samples: TruncationCounter::new(Some(CUT_LOG_EVERY)),
        }
    }

    pub fn with_normalize_text(mut self, normalize_text: bool) -> Self {
        self.normalize_text = normalize_text;
        self
    }

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

    /// Cap on how many JSONL records to read at all
    pub fn with_total_data_size(mut self, total_data_size: usize) -> Self {
        self.total_data_size = Some(total_data_size);
        self
    }

    /// Load records and build the question → wav index.
    pub fn load_data(&mut self, start_pos: Option<usize>, end_pos: Option<usize>) -> Result<()> {
        let records = read_jsonl_records(&self.jsonl_file, self.total_data_size)?;
        let records = retain_with_positives(records);
        self.data = slice_records(records, start_pos, end_pos);

        // The manifest covers far more questions than this data
        // slice — hand the index builder our question set so it
        // only keeps relevant lines
        let questions: HashSet<String> =
            self.data.iter().map(|r| r.question.clone()).collect();
        tracing::info!("dataset questions num {}", questions.len());

        self.q_to_audio_file_map = question_to_audio_file_map(
            &questions,
            &self.wav_root_dir,
            &self.audio_file_prefix,
            &self.manifest_txt_file,
        )?;
        tracing::info!("q_to_audio_file_map {}", self.q_to_audio_file_map.len());
        Ok(())
    }

    /// Truncations recorded so far (diagnostic only).
    pub fn cut_samples(&self) -> usize {
        self.cut_samples.count()
    }

    /// Fallible per-index assembly. Ok(None) covers BOTH an
    /// out-of-range index and an unmapped question — callers
    /// filter None either way.
    pub fn fetch(&self, index: usize) -> Result<Option<BiEncoderMixedSample>> {
        let Some(record) = self.data.get(index) else {
            return Ok(None);
        };

        let Some(audio_file) = self.q_to_audio_file_map.get(&record.question) else {
            tracing::warn!(
                "sample with question={} not in audio files dict",
                record.question
            );
            return Ok(None);
        };

        let feats = audio_feats(audio_file, self.normalize_audio)?;
        let feats = bound_features(feats, self.max_features_sz, &self.cut_samples);

        Ok(Some(assemble_mixed_sample(
            AudioQuery::Waveform(feats),
            record,
            self.normalize_text,
        )))
    }
}

impl Dataset<BiEncoderMixedSample> for WavPaqTextDataset {
    fn get(&self, index: usize) -> Option<BiEncoderMixedSample> {
        self.fetch(index)
            .unwrap_or_else(|e| panic!("corrupt training data at index {index}: {e:#}"))
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    /// Fixture: two records, audio only for the first question.
    fn fixture(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut w = WavWriter::create(dir.join("aud_dn_7.wav"), spec).unwrap();
        for _ in 0..5 {
            w.write_sample(1000i16).unwrap();
        }
        w.finalize().unwrap();

        let manifest = dir.join("paq.txt");
        fs::File::create(&manifest)
            .unwrap()
            .write_all(b"7|covered question\n8|unrelated question\n")
            .unwrap();

        let jsonl = dir.join("data.jsonl");
        fs::File::create(&jsonl)
            .unwrap()
            .write_all(
                concat!(
                    "{\"question\": \"covered question\", \"positive_ctxs\": [{\"text\": \"p\"}]}\n",
                    "{\"question\": \"uncovered question\", \"positive_ctxs\": [{\"text\": \"p\"}]}\n",
                )
                .as_bytes(),
            )
            .unwrap();

        (jsonl, manifest, dir.to_path_buf())
    }

    #[test]
    fn test_covered_question_yields_sample() {
        let dir = tempfile::tempdir().unwrap();
        let (jsonl, manifest, root) = fixture(dir.path());

        let mut ds = WavPaqTextDataset::new(jsonl, manifest, root);
        ds.load_data(None, None).unwrap();
        assert_eq!(ds.len(), 2);

        let sample = ds.get(0).unwrap();
        match &sample.query {
            AudioQuery::Waveform(feats) => assert_eq!(feats.shape(), &[1, 5]),
            other => panic!("expected waveform query, got {other:?}"),
        }
    }

    #[test]
    fn test_uncovered_question_yields_none_without_panic() {
        let dir = tempfile::tempdir().unwrap();
        let (jsonl, manifest, root) = fixture(dir.path());

        let mut ds = WavPaqTextDataset::new(jsonl, manifest, root);
        ds.load_data(None, None).unwrap();

        // No audio mapping for record 1 → None, not a panic
        assert!(ds.get(1).is_none());
        // And the record still counts toward the length
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_mapped_but_missing_file_fails_at_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let (jsonl, manifest, root) = fixture(dir.path());

        // Remove the wav AFTER the index is built: load succeeds
        // (warning only), the fetch carries the error
        let mut ds = WavPaqTextDataset::new(jsonl, manifest, root);
        ds.load_data(None, None).unwrap();
        fs::remove_file(dir.path().join("aud_dn_7.wav")).unwrap();

        assert!(ds.fetch(0).is_err());
    }
}
