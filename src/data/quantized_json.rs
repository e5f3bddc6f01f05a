// ============================================================
// Layer 4 — Quantized-Query Bi-Encoder Dataset
// ============================================================
// The discrete-token sibling of wav_json: instead of loading a
// waveform per access, the ENTIRE audio side is folded into the
// records once, at load time. After load, every record's
// question field holds a bracketed token string:
//
//   "[w2v17] [w2v17] [w2v102] ..."
//
// and get() is pure text assembly — no file I/O, no bounding
// (token rows were already capped when the token file was read).
//
// Load-time ordering is strict and worth restating:
//   1. build the orig→manifest re-index from the TSV
//   2. read ALL records (no slicing — see below)
//   3. read + cap the token rows
//   4. inject quantized queries over the FULL record list
//   5. only then drop records without positives
// Steps 4 and 5 must not swap: injection aligns by position in
// the full file, and filtering first would shift every id.
//
// Range slicing is NOT supported here for the same reason — a
// slice taken before injection breaks alignment, and one taken
// after would make shard boundaries depend on filter results.
// load_data() warns and ignores the bounds if given.
//
// Reference: Lakhotia et al. (2021) - Generative Spoken LM
//            Burn Book §4 (Datasets and Dataloaders)

use anyhow::Result;
use burn::data::dataset::Dataset;
use std::path::PathBuf;

use crate::data::bounding::TruncationCounter;
use crate::data::manifest::orig_to_manifest_id_map;
use crate::data::quantized::{inject_quantized_queries, read_quantized_rows};
use crate::data::text::{read_json_records, retain_with_positives};
use crate::data::wav_json::{assemble_mixed_sample, DEFAULT_AUDIO_FILE_PREFIX};
use crate::domain::record::QaRecord;
use crate::domain::sample::{AudioQuery, BiEncoderMixedSample};

/// Default prefix for bracketed audio tokens: "[w2v17]"
pub const DEFAULT_QUANTIZED_TOKEN_PREFIX: &str = "w2v";

/// Bi-encoder training dataset whose queries are quantized audio
/// token strings, injected into the records at load time.
pub struct QuantizedJsonTextDataset {
    json_file: PathBuf,
    wav_tsv_file: PathBuf,
    km_file: PathBuf,
    max_audio_len: usize,
    audio_file_prefix: String,
    quantized_token_prefix: String,
    normalize_text: bool,

    /// Populated by load_data(); read-only afterwards
    data: Vec<QaRecord>,

    /// Counts token-row truncations. No periodic logging at this
    /// site — cuts happen once at load, and the final count is
    /// reported in the load summary instead.
    cut_samples: TruncationCounter,
}

impl QuantizedJsonTextDataset {
    pub fn new(
        json_file: impl Into<PathBuf>,
        wav_tsv_file: impl Into<PathBuf>,
        km_file: impl Into<PathBuf>,
        max_audio_len: usize,
    ) -> Self {
        Self {
            json_file: json_file.into(),
            wav_tsv_file: wav_tsv_file.into(),
            km_file: km_file.into(),
            max_audio_len,
            audio_file_prefix: DEFAULT_AUDIO_FILE_PREFIX.to_string(),
            quantized_token_prefix: DEFAULT_QUANTIZED_TOKEN_PREFIX.to_string(),
            normalize_text: false,
            data: Vec::new(),
            cut_samples: TruncationCounter::new(None),
        }
    }

    pub fn with_normalize_text(mut self, normalize_text: bool) -> Self {
        self.normalize_text = normalize_text;
        self
    }

    pub fn with_audio_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.audio_file_prefix = prefix.into();
        self
    }

    pub fn with_quantized_token_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.quantized_token_prefix = prefix.into();
        self
    }

    /// Load records, align token rows through the manifest, and
    /// bake the quantized queries in. Slicing bounds are ignored
    /// (alignment is positional over the full file).
    pub fn load_data(&mut self, start_pos: Option<usize>, end_pos: Option<usize>) -> Result<()> {
        if start_pos.is_some() || end_pos.is_some() {
            tracing::warn!(
                "quantized dataset ignores range bounds ({:?}, {:?}): \
                 token alignment is positional over the full file",
                start_pos,
                end_pos
            );
        }

        let orig_to_manifest =
            orig_to_manifest_id_map(&self.audio_file_prefix, &self.wav_tsv_file)?;
        tracing::info!("orig_to_manifest_id_map {}", orig_to_manifest.len());

        let records = read_json_records(&self.json_file)?;
        let rows = read_quantized_rows(&self.km_file, self.max_audio_len, &self.cut_samples)?;
        tracing::info!(
            "quantized rows {} (cut {})",
            rows.len(),
            self.cut_samples.count()
        );

        // Inject over the FULL list, filter after — see header
        let records = inject_quantized_queries(
            records,
            &rows,
            &orig_to_manifest,
            &self.quantized_token_prefix,
        )?;
        self.data = retain_with_positives(records);
        Ok(())
    }

    /// Token-row truncations recorded at load (diagnostic only).
    pub fn cut_samples(&self) -> usize {
        self.cut_samples.count()
    }

    /// Per-index assembly. Infallible after a successful load —
    /// the query is already a string on the record.
    pub fn fetch(&self, index: usize) -> Option<BiEncoderMixedSample> {
        let record = self.data.get(index)?;
        Some(assemble_mixed_sample(
            AudioQuery::Quantized(record.question.clone()),
            record,
            self.normalize_text,
        ))
    }
}

impl Dataset<BiEncoderMixedSample> for QuantizedJsonTextDataset {
    fn get(&self, index: usize) -> Option<BiEncoderMixedSample> {
        self.fetch(index)
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        path
    }

    /// Three records; manifest lists utterances out of id order
    /// so record order and token-row order differ; the middle
    /// record has no positives and must disappear after load.
    fn fixture(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        let json = write_file(
            dir,
            "data.json",
            r#"[{"question": "first q",  "positive_ctxs": [{"text": "p1"}]},
                {"question": "second q"},
                {"question": "third q",  "positive_ctxs": [{"text": "p3"}]}]"#,
        );
        // Manifest line order: utterance 2, 1, 3
        let tsv = write_file(
            dir,
            "wav.tsv",
            "/root\naud_dn_2.wav\t1\naud_dn_1.wav\t1\naud_dn_3.wav\t1\n",
        );
        // Token rows in manifest order: row 0 = utt 2, row 1 = utt 1, row 2 = utt 3
        let km = write_file(dir, "km.tsv", "20 21\n10\n30 31 32\n");
        (json, tsv, km)
    }

    #[test]
    fn test_load_injects_in_manifest_order_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let (json, tsv, km) = fixture(dir.path());

        let mut ds = QuantizedJsonTextDataset::new(json, tsv, km, 10);
        ds.load_data(None, None).unwrap();

        // Record "second q" had no positives → dropped AFTER injection
        assert_eq!(ds.len(), 2);

        // Record 0 (orig id 1) sits at manifest row 1 → tokens "10"
        let s0 = ds.get(0).unwrap();
        match &s0.query {
            AudioQuery::Quantized(q) => assert_eq!(q, "[w2v10]"),
            other => panic!("expected quantized query, got {other:?}"),
        }

        // Record "third q" (orig id 3) sits at manifest row 2
        let s1 = ds.get(1).unwrap();
        match &s1.query {
            AudioQuery::Quantized(q) => assert_eq!(q, "[w2v30] [w2v31] [w2v32]"),
            other => panic!("expected quantized query, got {other:?}"),
        }
        assert_eq!(s1.positive_passages[0].text, "p3");
    }

    #[test]
    fn test_orig_question_survives_injection() {
        let dir = tempfile::tempdir().unwrap();
        let (json, tsv, km) = fixture(dir.path());

        let mut ds = QuantizedJsonTextDataset::new(json, tsv, km, 10);
        ds.load_data(None, None).unwrap();

        assert_eq!(ds.data[0].orig_question.as_deref(), Some("first q"));
        assert_eq!(ds.data[1].orig_question.as_deref(), Some("third q"));
    }

    #[test]
    fn test_row_count_mismatch_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let (json, tsv, _) = fixture(dir.path());
        // Only two rows for three records
        let km = write_file(dir.path(), "short.tsv", "1\n2\n");

        let mut ds = QuantizedJsonTextDataset::new(json, tsv, km, 10);
        assert!(ds.load_data(None, None).is_err());
    }

    #[test]
    fn test_token_cap_applies_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let (json, tsv, km) = fixture(dir.path());

        let mut ds = QuantizedJsonTextDataset::new(json, tsv, km, 2);
        ds.load_data(None, None).unwrap();

        // "third q" row had 3 tokens → capped at 2
        let s1 = ds.get(1).unwrap();
        match &s1.query {
            AudioQuery::Quantized(q) => assert_eq!(q, "[w2v30] [w2v31]"),
            other => panic!("expected quantized query, got {other:?}"),
        }
        assert_eq!(ds.cut_samples(), 1);
    }
}
