// ============================================================
// Layer 3 — Training Samples
// ============================================================
// The composite per-index items that the dataset adapters hand
// to the training pipeline's dataloader.
//
// Two sample shapes exist because two training setups exist:
//
//   BiEncoderMixedSample — bi-encoder retrieval training.
//     "Mixed" because the query side is audio-derived while the
//     passage side stays textual. The query is either:
//       - a raw waveform feature matrix of shape (1, L), or
//       - a quantized audio token string like
//         "[w2v17] [w2v102] [w2v3]" that a text tokenizer can
//         consume directly.
//
//   SpeechQaSample — retriever evaluation. Pairs the waveform
//     query with the gold answer strings instead of passages.
//
// Why ndarray and not a GPU tensor here?
//   Samples are produced on dataloader worker threads; the
//   batcher downstream owns device placement. Keeping the
//   feature matrix as a plain Array2<f32> keeps this layer free
//   of any backend choice.
//
// Reference: ndarray crate documentation
//            Karpukhin et al. (2020) - Dense Passage Retrieval

use ndarray::Array2;

use crate::domain::passage::Passage;

// ─── AudioQuery ───────────────────────────────────────────────────────────────
/// The query side of a mixed sample — one of two representations.
#[derive(Debug, Clone)]
pub enum AudioQuery {
    /// Raw waveform features, shape (1, L), 16 kHz mono
    Waveform(Array2<f32>),

    /// Bracket-delimited quantized audio tokens, e.g. "[w2v42] [w2v7]"
    Quantized(String),
}

impl AudioQuery {
    /// Length of the query: waveform sample count, or token count
    /// for the quantized form.
    pub fn len(&self) -> usize {
        match self {
            AudioQuery::Waveform(feats) => feats.ncols(),
            AudioQuery::Quantized(tokens) => tokens.split_whitespace().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── BiEncoderMixedSample ─────────────────────────────────────────────────────
/// One bi-encoder training item: an audio-derived query plus its
/// positive / negative / hard-negative passages.
#[derive(Debug, Clone)]
pub struct BiEncoderMixedSample {
    /// Audio-derived query representation
    pub query: AudioQuery,

    /// Passages that answer the question
    pub positive_passages: Vec<Passage>,

    /// Random non-answering passages
    pub negative_passages: Vec<Passage>,

    /// Plausible-but-wrong passages
    pub hard_negative_passages: Vec<Passage>,
}

// ─── SpeechQaSample ───────────────────────────────────────────────────────────
/// One retriever-evaluation item: waveform query, gold answers,
/// and the processed question text for logging/debugging.
#[derive(Debug, Clone)]
pub struct SpeechQaSample {
    /// Waveform features, shape (1, L)
    pub query: Array2<f32>,

    /// Processed (lowercased, trimmed) question text
    pub query_text: String,

    /// Gold answer strings for this question
    pub answers: Vec<String>,
}
