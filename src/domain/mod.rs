// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// This is the heart of the crate — plain Rust structs that
// define the core concepts of speech-based passage retrieval.
//
// Rules for this layer:
//   - NO file I/O or manifest parsing here (that's Layer 4)
//   - NO audio decoding here
//   - Only plain structs, enums, and pure string functions
//
// Why keep this layer pure?
//   - Easy to unit test (no fixture files needed)
//   - Easy to understand (no framework noise)
//   - The training pipeline consumes these types directly
//
// Think of this layer as the "dictionary" of the system —
// it defines what things ARE, not how they are loaded.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

// A retrieval passage (text + optional title) and text normalization
pub mod passage;

// A raw question-answering record as read from JSON/JSONL
pub mod record;

// Composite per-index samples handed to the training pipeline
pub mod sample;
