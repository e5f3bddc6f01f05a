// ============================================================
// Layer 2 — Inspection Use Cases
// ============================================================
// The debugging workflows behind the CLI. Misaligned joins are
// the failure mode this crate exists to prevent, and the only
// reliable way to CHECK a join is to look at it: load the
// dataset exactly as training would, resolve one index, and
// print what came back (query length, passage counts, the
// first positive).
//
// Three workflows:
//   validate  — parse a positional manifest and report its id
//               range and any gaps, without touching audio
//   show      — load one dataset variant, fetch one index,
//               print the sample summary
//   (show also reports truncation counts after the fetch, so a
//    too-small max_features_sz is visible immediately)
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;

use crate::data::manifest::id_to_audio_file_map;
use crate::data::quantized_json::QuantizedJsonTextDataset;
use crate::data::wav_json::WavJsonTextDataset;
use crate::data::wav_paq::WavPaqTextDataset;
use crate::data::wav_text::WavTextQaDataset;
use crate::domain::sample::{AudioQuery, BiEncoderMixedSample};

use std::path::PathBuf;

// ─── Validate ─────────────────────────────────────────────────────────────────
/// Configuration for manifest validation.
pub struct ValidateConfig {
    pub wav_tsv_file: PathBuf,
    pub audio_file_prefix: String,
}

/// Summary of one positional manifest.
pub struct ManifestReport {
    pub entries: usize,
    pub min_id: usize,
    pub max_id: usize,
    /// Ids absent from [min_id, max_id] — a non-empty list means
    /// the index+1 convention will fail for some record
    pub gaps: Vec<usize>,
}

/// Parse a positional manifest and report its id coverage.
pub fn validate_manifest(config: &ValidateConfig) -> Result<ManifestReport> {
    let map = id_to_audio_file_map(&config.audio_file_prefix, &config.wav_tsv_file)?;
    let min_id = *map.keys().min().context("manifest has no entries")?;
    let max_id = *map.keys().max().context("manifest has no entries")?;
    let gaps: Vec<usize> = (min_id..=max_id).filter(|id| !map.contains_key(id)).collect();

    Ok(ManifestReport {
        entries: map.len(),
        min_id,
        max_id,
        gaps,
    })
}

// ─── Show ─────────────────────────────────────────────────────────────────────
/// Which dataset variant to load for inspection.
pub enum ShowVariant {
    /// JSON records + positional TSV manifest
    WavJson {
        json_file: PathBuf,
        wav_tsv_file: PathBuf,
        normalize_audio: bool,
    },
    /// JSONL records + PAQ manifest + audio root
    WavPaq {
        jsonl_file: PathBuf,
        manifest_txt_file: PathBuf,
        wav_root_dir: PathBuf,
        normalize_audio: bool,
    },
    /// JSON records + TSV manifest + quantized token file
    Quantized {
        json_file: PathBuf,
        wav_tsv_file: PathBuf,
        km_file: PathBuf,
        max_audio_len: usize,
    },
    /// Delimited QA file + positional TSV manifest
    WavText {
        qa_file: PathBuf,
        wav_tsv_file: PathBuf,
        normalize_audio: bool,
    },
}

/// Configuration for single-index inspection.
pub struct ShowConfig {
    pub variant: ShowVariant,
    pub index: usize,
    pub audio_file_prefix: String,
    pub max_features_sz: usize,
    pub normalize_text: bool,
}

/// Load the configured variant, fetch one index, and return a
/// printable multi-line summary.
pub fn show_sample(config: &ShowConfig) -> Result<String> {
    match &config.variant {
        ShowVariant::WavJson {
            json_file,
            wav_tsv_file,
            normalize_audio,
        } => {
            let mut ds = WavJsonTextDataset::new(json_file, wav_tsv_file)
                .with_audio_file_prefix(&config.audio_file_prefix)
                .with_max_features_sz(config.max_features_sz)
                .with_normalize_text(config.normalize_text)
                .with_normalize_audio(*normalize_audio);
            ds.load_data(None, None)?;
            let sample = ds.fetch(config.index)?;
            Ok(describe_mixed(ds.len(), config.index, sample, ds.cut_samples()))
        }
        ShowVariant::WavPaq {
            jsonl_file,
            manifest_txt_file,
            wav_root_dir,
            normalize_audio,
        } => {
            let mut ds = WavPaqTextDataset::new(jsonl_file, manifest_txt_file, wav_root_dir)
                .with_audio_file_prefix(&config.audio_file_prefix)
                .with_max_features_sz(config.max_features_sz)
                .with_normalize_text(config.normalize_text)
                .with_normalize_audio(*normalize_audio);
            ds.load_data(None, None)?;
            let sample = ds.fetch(config.index)?;
            Ok(describe_mixed(ds.len(), config.index, sample, ds.cut_samples()))
        }
        ShowVariant::Quantized {
            json_file,
            wav_tsv_file,
            km_file,
            max_audio_len,
        } => {
            let mut ds =
                QuantizedJsonTextDataset::new(json_file, wav_tsv_file, km_file, *max_audio_len)
                    .with_audio_file_prefix(&config.audio_file_prefix)
                    .with_normalize_text(config.normalize_text);
            ds.load_data(None, None)?;
            let sample = ds.fetch(config.index);
            Ok(describe_mixed(ds.len(), config.index, sample, ds.cut_samples()))
        }
        ShowVariant::WavText {
            qa_file,
            wav_tsv_file,
            normalize_audio,
        } => {
            let mut ds = WavTextQaDataset::new(qa_file, wav_tsv_file)
                .with_audio_file_prefix(&config.audio_file_prefix)
                .with_max_features_sz(config.max_features_sz)
                .with_normalize_audio(*normalize_audio);
            ds.load_data()?;
            let sample = ds.fetch(config.index)?;

            let mut out = format!("dataset: {} records\n", ds.len());
            match sample {
                Some(s) => {
                    out.push_str(&format!(
                        "index {}: query ({}, {}) samples\n  question: {}\n  answers: {:?}\n",
                        config.index,
                        s.query.nrows(),
                        s.query.ncols(),
                        s.query_text,
                        s.answers,
                    ));
                }
                None => out.push_str(&format!("index {}: no sample\n", config.index)),
            }
            out.push_str(&format!("cut_samples: {}\n", ds.cut_samples()));
            Ok(out)
        }
    }
}

/// Render one mixed sample (or its absence) as a summary block.
fn describe_mixed(
    len: usize,
    index: usize,
    sample: Option<BiEncoderMixedSample>,
    cut_samples: usize,
) -> String {
    let mut out = format!("dataset: {len} records\n");
    match sample {
        Some(s) => {
            match &s.query {
                AudioQuery::Waveform(feats) => out.push_str(&format!(
                    "index {index}: waveform query ({}, {})\n",
                    feats.nrows(),
                    feats.ncols()
                )),
                AudioQuery::Quantized(tokens) => {
                    // A full token string can run to thousands of
                    // characters; the head is enough to eyeball
                    let head: String = tokens.chars().take(60).collect();
                    out.push_str(&format!(
                        "index {index}: quantized query, {} tokens: {head}...\n",
                        s.query.len()
                    ));
                }
            }
            out.push_str(&format!(
                "  passages: {} positive, {} negative, {} hard negative\n",
                s.positive_passages.len(),
                s.negative_passages.len(),
                s.hard_negative_passages.len()
            ));
            if let Some(p) = s.positive_passages.first() {
                let head: String = p.text.chars().take(80).collect();
                out.push_str(&format!(
                    "  first positive [{}]: {head}\n",
                    p.title.as_deref().unwrap_or("-")
                ));
            }
        }
        None => out.push_str(&format!("index {index}: no sample (unmapped or out of range)\n")),
    }
    out.push_str(&format!("cut_samples: {cut_samples}\n"));
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_validate_reports_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = dir.path().join("wav.tsv");
        // ids 1, 2, 5 → gaps at 3 and 4
        fs::File::create(&tsv)
            .unwrap()
            .write_all(b"/root\naud_dn_1.wav\t1\naud_dn_2.wav\t1\naud_dn_5.wav\t1\n")
            .unwrap();

        let report = validate_manifest(&ValidateConfig {
            wav_tsv_file: tsv,
            audio_file_prefix: "aud_dn_".to_string(),
        })
        .unwrap();

        assert_eq!(report.entries, 3);
        assert_eq!(report.min_id, 1);
        assert_eq!(report.max_id, 5);
        assert_eq!(report.gaps, vec![3, 4]);
    }

    #[test]
    fn test_validate_empty_manifest_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = dir.path().join("wav.tsv");
        fs::File::create(&tsv).unwrap().write_all(b"/root\n").unwrap();

        assert!(validate_manifest(&ValidateConfig {
            wav_tsv_file: tsv,
            audio_file_prefix: "aud_dn_".to_string(),
        })
        .is_err());
    }
}
