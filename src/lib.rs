// ============================================================
// speech-qa-data — dataset adapters for speech retrieval
// ============================================================
// Joins textual QA records with spoken-question audio (and,
// optionally, quantized audio token sequences) into the samples
// a bi-encoder retrieval trainer consumes.
//
// The library surface flows bottom-up:
//
//   domain   → what a passage / record / sample IS
//   data     → how sources are parsed, joined, and served
//              (burn Dataset impls at the top)
//   application / cli → inspection tooling for the joins
//
// A training pipeline typically only touches Layer 4:
//
//   use speech_qa_data::data::wav_json::WavJsonTextDataset;
//   use burn::data::dataset::Dataset;
//
//   let mut ds = WavJsonTextDataset::new(json, tsv)
//       .with_normalize_audio(true);
//   ds.load_data(None, None)?;
//   let sample = ds.get(0);
//
// Reference: Karpukhin et al. (2020) - Dense Passage Retrieval
//            Burn Book §4 (Datasets and Dataloaders)

/// Layer 1 — CLI argument parsing and dispatch
pub mod cli;

/// Layer 2 — inspection use cases
pub mod application;

/// Layer 3 — passages, records, samples
pub mod domain;

/// Layer 4 — manifests, audio, bounding, dataset assembly
pub mod data;
