// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer joins three independently-indexed sources into
// per-index training samples:
//
//   QA records (JSON/JSONL)      audio manifest (TSV / PAQ)
//        │                              │
//        ▼                              ▼
//   text.rs                        manifest.rs
//   load + filter + slice          id → wav path index
//        │                              │
//        ├──────────────┬───────────────┤
//        ▼              ▼               ▼
//   quantized.rs    audio.rs       bounding.rs
//   token rows +    wav → (1, L)   shared length cap
//   query inject    feature matrix + truncation counter
//        │              │               │
//        └──────┬───────┴───────┬───────┘
//               ▼               ▼
//   wav_json / wav_paq / quantized_json / wav_text
//   per-index sample assembly (burn Dataset impls)
//
// The joins are the dangerous part: the three sources share NO
// explicit key. The positional manifest is aligned to record
// order by a numeric filename suffix; the quantized-token file
// is aligned to MANIFEST order, not record order. Each module
// below documents which ordering it assumes.
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Karpukhin et al. (2020) - Dense Passage Retrieval

/// Manifest parsing: record identifier → audio file path
pub mod manifest;

/// WAV decoding into (1, L) feature matrices
pub mod audio;

/// Shared length bounding with truncation diagnostics
pub mod bounding;

/// Base JSON/JSONL QA record sources
pub mod text;

/// Quantized audio token rows and query injection
pub mod quantized;

/// Bi-encoder dataset over JSON records + positional manifest
pub mod wav_json;

/// Bi-encoder dataset over JSONL records + PAQ manifest
pub mod wav_paq;

/// Bi-encoder dataset with quantized token queries
pub mod quantized_json;

/// Retriever-evaluation dataset over a delimited QA file
pub mod wav_text;
