// ============================================================
// Layer 3 — Raw QA Record
// ============================================================
// Represents one question-answering record exactly as it sits
// in the source JSON/JSONL files, e.g.:
//
//   {
//     "question": "who wrote the iliad",
//     "positive_ctxs":      [{"text": "...", "title": "Iliad"}],
//     "negative_ctxs":      [{"text": "..."}],
//     "hard_negative_ctxs": [{"text": "...", "title": "Odyssey"}]
//   }
//
// Two deliberate serde choices:
//   - Every context group defaults to an empty Vec, because
//     many records ship with only positives.
//   - `title` is Option<String> with a default of None, so a
//     context lacking the field deserializes to title = None.
//     The "missing title becomes null" rule therefore lives in
//     the TYPE, not in per-dataset fixup loops.
//
// `orig_question` only appears after quantized-query injection
// (see Layer 4, quantized.rs): the question field is replaced
// by an audio token string and the human-readable question is
// preserved here for debugging and evaluation.
//
// Reference: serde documentation (field attributes)
//            Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// One raw retrieval context as found in the source JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawContext {
    /// The passage body text
    pub text: String,

    /// Optional source title — None when the JSON omits the field
    #[serde(default)]
    pub title: Option<String>,
}

/// One question with its positive / negative / hard-negative contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRecord {
    /// The query. Plain text after JSON load; replaced by a
    /// quantized audio token string for the quantized variant.
    pub question: String,

    /// The pre-substitution question text. None until the
    /// quantized aligner has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_question: Option<String>,

    /// Passages that answer the question
    #[serde(default)]
    pub positive_ctxs: Vec<RawContext>,

    /// Random non-answering passages
    #[serde(default)]
    pub negative_ctxs: Vec<RawContext>,

    /// Plausible-but-wrong passages (the hard cases)
    #[serde(default)]
    pub hard_negative_ctxs: Vec<RawContext>,
}

impl QaRecord {
    /// A record is only trainable if it has at least one positive
    /// passage — there is nothing to contrast against otherwise.
    pub fn has_positive(&self) -> bool {
        !self.positive_ctxs.is_empty()
    }
}
