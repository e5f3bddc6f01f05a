// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the inspection subcommands and their flags. Each
// subcommand maps to one dataset variant (or, for `validate`,
// to the manifest alone).
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, bool, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::inspect_use_case::{ShowConfig, ShowVariant, ValidateConfig};

/// The subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a positional TSV manifest for duplicates and id gaps
    Validate(ValidateArgs),

    /// Show one sample from a wav + JSON bi-encoder dataset
    Show(ShowArgs),

    /// Show one sample from a wav + PAQ (JSONL) dataset
    ShowPaq(ShowPaqArgs),

    /// Show one sample from a quantized-query dataset
    ShowQuantized(ShowQuantizedArgs),

    /// Show one sample from a wav + text QA evaluation dataset
    ShowQa(ShowQaArgs),
}

/// Flags every show-style subcommand shares.
#[derive(Args, Debug)]
pub struct CommonShowArgs {
    /// 0-based record index to fetch
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Filename prefix of the audio corpus
    #[arg(long, default_value = "aud_dn_")]
    pub audio_file_prefix: String,

    /// Hard cap on waveform length, in samples (prefix kept)
    #[arg(long, default_value_t = 100_000)]
    pub max_features_sz: usize,

    /// Normalize passage text (quotes, newlines, apostrophes)
    #[arg(long)]
    pub normalize_text: bool,
}

/// Arguments for the `validate` subcommand
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Positional TSV manifest (line 0 = audio root dir)
    #[arg(long)]
    pub wav_tsv_file: PathBuf,

    /// Filename prefix of the audio corpus
    #[arg(long, default_value = "aud_dn_")]
    pub audio_file_prefix: String,
}

impl From<ValidateArgs> for ValidateConfig {
    fn from(a: ValidateArgs) -> Self {
        ValidateConfig {
            wav_tsv_file: a.wav_tsv_file,
            audio_file_prefix: a.audio_file_prefix,
        }
    }
}

/// Arguments for the `show` subcommand
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// JSON file with QA records
    #[arg(long)]
    pub json_file: PathBuf,

    /// Positional TSV manifest
    #[arg(long)]
    pub wav_tsv_file: PathBuf,

    /// Layer-normalize the waveform query
    #[arg(long)]
    pub normalize_audio: bool,

    #[command(flatten)]
    pub common: CommonShowArgs,
}

impl From<ShowArgs> for ShowConfig {
    fn from(a: ShowArgs) -> Self {
        ShowConfig {
            variant: ShowVariant::WavJson {
                json_file: a.json_file,
                wav_tsv_file: a.wav_tsv_file,
                normalize_audio: a.normalize_audio,
            },
            index: a.common.index,
            audio_file_prefix: a.common.audio_file_prefix,
            max_features_sz: a.common.max_features_sz,
            normalize_text: a.common.normalize_text,
        }
    }
}

/// Arguments for the `show-paq` subcommand
#[derive(Args, Debug)]
pub struct ShowPaqArgs {
    /// JSONL file with QA records (one JSON object per line)
    #[arg(long)]
    pub jsonl_file: PathBuf,

    /// PAQ manifest with `id|question` lines
    #[arg(long)]
    pub manifest_txt_file: PathBuf,

    /// Directory holding the PAQ wav files
    #[arg(long)]
    pub wav_root_dir: PathBuf,

    /// Layer-normalize the waveform query
    #[arg(long)]
    pub normalize_audio: bool,

    #[command(flatten)]
    pub common: CommonShowArgs,
}

impl From<ShowPaqArgs> for ShowConfig {
    fn from(a: ShowPaqArgs) -> Self {
        ShowConfig {
            variant: ShowVariant::WavPaq {
                jsonl_file: a.jsonl_file,
                manifest_txt_file: a.manifest_txt_file,
                wav_root_dir: a.wav_root_dir,
                normalize_audio: a.normalize_audio,
            },
            index: a.common.index,
            audio_file_prefix: a.common.audio_file_prefix,
            max_features_sz: a.common.max_features_sz,
            normalize_text: a.common.normalize_text,
        }
    }
}

/// Arguments for the `show-quantized` subcommand
#[derive(Args, Debug)]
pub struct ShowQuantizedArgs {
    /// JSON file with QA records
    #[arg(long)]
    pub json_file: PathBuf,

    /// Positional TSV manifest (orders the token rows)
    #[arg(long)]
    pub wav_tsv_file: PathBuf,

    /// Quantized-token file (one whitespace-separated row per utterance)
    #[arg(long)]
    pub km_file: PathBuf,

    /// Hard cap on tokens per query (prefix kept)
    #[arg(long, default_value_t = 512)]
    pub max_audio_len: usize,

    #[command(flatten)]
    pub common: CommonShowArgs,
}

impl From<ShowQuantizedArgs> for ShowConfig {
    fn from(a: ShowQuantizedArgs) -> Self {
        ShowConfig {
            variant: ShowVariant::Quantized {
                json_file: a.json_file,
                wav_tsv_file: a.wav_tsv_file,
                km_file: a.km_file,
                max_audio_len: a.max_audio_len,
            },
            index: a.common.index,
            audio_file_prefix: a.common.audio_file_prefix,
            max_features_sz: a.common.max_features_sz,
            normalize_text: a.common.normalize_text,
        }
    }
}

/// Arguments for the `show-qa` subcommand
#[derive(Args, Debug)]
pub struct ShowQaArgs {
    /// Delimited QA file: question<TAB>["answer", ...]
    #[arg(long)]
    pub qa_file: PathBuf,

    /// Positional TSV manifest
    #[arg(long)]
    pub wav_tsv_file: PathBuf,

    /// Layer-normalize the waveform query
    #[arg(long)]
    pub normalize_audio: bool,

    #[command(flatten)]
    pub common: CommonShowArgs,
}

impl From<ShowQaArgs> for ShowConfig {
    fn from(a: ShowQaArgs) -> Self {
        ShowConfig {
            variant: ShowVariant::WavText {
                qa_file: a.qa_file,
                wav_tsv_file: a.wav_tsv_file,
                normalize_audio: a.normalize_audio,
            },
            index: a.common.index,
            audio_file_prefix: a.common.audio_file_prefix,
            max_features_sz: a.common.max_features_sz,
            normalize_text: a.common.normalize_text,
        }
    }
}
