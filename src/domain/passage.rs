// ============================================================
// Layer 3 — Retrieval Passage
// ============================================================
// A passage is a span of text (with an optional title) used as
// retrieval context for a question. Every question comes with
// three groups of passages:
//   - positive:      passages that DO answer the question
//   - negative:      random passages that do not
//   - hard negative: passages that LOOK relevant but are wrong
//                    (e.g. retrieved by BM25 but not containing
//                    the answer) — the most informative kind
//
// Passage text in the source JSON is noisy: Wikipedia dumps
// carry embedded newlines, curly apostrophes from copy-editing,
// and sometimes a stray layer of surrounding double quotes.
// `normalize_passage` cleans exactly those three things and
// nothing else — the tokenizer downstream handles the rest.
//
// Reference: Karpukhin et al. (2020) - Dense Passage Retrieval
//            Rust Book §8 (Strings in Rust)

use crate::domain::record::RawContext;

/// One retrieval passage, ready for the bi-encoder's context tower.
///
/// The title is optional on purpose: many corpora (e.g. PAQ) ship
/// passages without titles, and the source JSON simply omits the
/// field. A missing title is represented as None, never as "".
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// The passage body text
    pub text: String,

    /// The source document title, if the corpus provides one
    pub title: Option<String>,
}

impl Passage {
    /// Build one passage from a raw JSON context.
    /// When `normalize` is set the text is cleaned first.
    pub fn from_context(ctx: &RawContext, normalize: bool) -> Self {
        let text = if normalize {
            normalize_passage(&ctx.text)
        } else {
            ctx.text.clone()
        };
        Self {
            text,
            title: ctx.title.clone(),
        }
    }

    /// Build the passage list for one group of raw contexts.
    pub fn from_contexts(ctxs: &[RawContext], normalize: bool) -> Vec<Self> {
        ctxs.iter().map(|c| Self::from_context(c, normalize)).collect()
    }
}

/// Clean one passage text string.
///
/// Three fixes, applied in order:
///   1. Embedded newlines → spaces (passages are single logical lines)
///   2. Curly apostrophe (U+2019) → ASCII apostrophe
///   3. Strip ONE layer of surrounding double quotes, if present
pub fn normalize_passage(ctx_text: &str) -> String {
    let text = ctx_text.replace('\n', " ").replace('\u{2019}', "'");

    // Strip a leading and/or trailing double quote independently —
    // some passages only carry one side of the pair
    let text = text.strip_prefix('"').unwrap_or(&text);
    let text = text.strip_suffix('"').unwrap_or(text);
    text.to_string()
}
