// ============================================================
// Layer 4 — Quantized Audio Token Alignment
// ============================================================
// Some training setups replace the raw waveform query with a
// sequence of DISCRETE audio tokens (k-means cluster ids over
// wav2vec2 features, computed offline). The token file has one
// row per utterance:
//
//   17 17 102 3 3 3 41 ...        ← whitespace-separated ids
//
// The catch, and the reason this module exists: the token file
// is ordered by MANIFEST line position, while the records are
// ordered by their original 1-based id. Joining the two takes
// the orig→manifest re-index from manifest.rs:
//
//   record i  →  orig id i+1  →  manifest row  →  token row
//
// Injection rewrites each record's question as a bracketed
// token string a text tokenizer can consume:
//
//   "[w2v17] [w2v17] [w2v102] ..."
//
// and stashes the human-readable question in orig_question.
// This is a pure transformation — it consumes the record list
// and returns a new one, so a dataset can never observe a
// half-injected state.
//
// A row-count mismatch with the record list means the token
// file was produced from a different data version; training on
// that join would be silently wrong, so the load aborts.
//
// Reference: Lakhotia et al. (2021) - Generative Spoken LM
//            Rust Book §13 (Iterators)

use anyhow::{ensure, Context, Result};
use std::{collections::HashMap, fs, path::Path};

use crate::data::bounding::{bound_tokens, TruncationCounter};
use crate::domain::record::QaRecord;

/// Read the quantized-token file: one row per utterance, exactly
/// one tab-delimited column, column = whitespace-separated ids.
/// Each row is capped at `max_audio_len` tokens (counted on the
/// shared counter, no periodic logging at this site).
pub fn read_quantized_rows(
    km_file: &Path,
    max_audio_len: usize,
    counter: &TruncationCounter,
) -> Result<Vec<Vec<String>>> {
    tracing::info!("Reading quantized audio file: {}", km_file.display());
    let content = fs::read_to_string(km_file)
        .with_context(|| format!("cannot read quantized file '{}'", km_file.display()))?;

    let mut rows = Vec::new();
    for (lineno, line) in content.split('\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        // A second tab-delimited column means this is not the
        // single-column format we expect
        ensure!(
            !line.contains('\t'),
            "quantized file {}:{} has more than one column",
            km_file.display(),
            lineno + 1
        );
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        rows.push(bound_tokens(tokens, max_audio_len, counter));
    }

    tracing::info!("Loaded quantized samples {}", rows.len());
    Ok(rows)
}

/// Replace every record's question with its quantized token
/// string, preserving the original text in `orig_question`.
///
/// Record `i` (0-based) carries original id `i + 1`; its token
/// row is `rows[orig_to_manifest[i + 1]]`. Runs over the FULL
/// record list — positive filtering must happen after this, or
/// the original ids stop lining up with the token file.
pub fn inject_quantized_queries(
    records: Vec<QaRecord>,
    rows: &[Vec<String>],
    orig_to_manifest: &HashMap<usize, usize>,
    quantized_token_prefix: &str,
) -> Result<Vec<QaRecord>> {
    ensure!(
        records.len() == rows.len(),
        "record count {} != quantized row count {}",
        records.len(),
        rows.len()
    );

    records
        .into_iter()
        .enumerate()
        .map(|(orig_id, mut record)| {
            let manifest_id = *orig_to_manifest
                .get(&(orig_id + 1))
                .with_context(|| format!("original id {} missing from manifest", orig_id + 1))?;
            tracing::debug!("orig_id={} manifest_id={}", orig_id, manifest_id);

            let row = rows
                .get(manifest_id)
                .with_context(|| format!("manifest id {manifest_id} beyond quantized rows"))?;
            let quantized_q = row
                .iter()
                .map(|t| format!("[{quantized_token_prefix}{t}]"))
                .collect::<Vec<_>>()
                .join(" ");

            record.orig_question = Some(std::mem::replace(&mut record.question, quantized_q));
            Ok(record)
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn record(question: &str) -> QaRecord {
        serde_json::from_str(&format!(
            r#"{{"question": "{question}", "positive_ctxs": [{{"text": "t"}}]}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_reads_rows_and_caps_length() {
        let dir = tempfile::tempdir().unwrap();
        let km = write_file(dir.path(), "km.tsv", "1 2 3 4 5\n6 7\n");
        let counter = TruncationCounter::new(None);

        let rows = read_quantized_rows(&km, 3, &counter).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "2", "3"]);
        assert_eq!(rows[1], vec!["6", "7"]);
        // Only the first row was over the cap
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_rejects_multi_column_rows() {
        let dir = tempfile::tempdir().unwrap();
        let km = write_file(dir.path(), "km.tsv", "1 2\textra\n");
        let counter = TruncationCounter::new(None);
        assert!(read_quantized_rows(&km, 10, &counter).is_err());
    }

    #[test]
    fn test_injection_follows_manifest_order() {
        // Two records; the manifest lists utterance 2 FIRST, so
        // record 0 (orig id 1) must take token row 1
        let records = vec![record("first question"), record("second question")];
        let rows = vec![
            vec!["9".to_string()],                   // manifest row 0 → orig id 2
            vec!["5".to_string(), "6".to_string()],  // manifest row 1 → orig id 1
        ];
        let orig_to_manifest: HashMap<usize, usize> = [(2, 0), (1, 1)].into_iter().collect();

        let injected =
            inject_quantized_queries(records, &rows, &orig_to_manifest, "w2v").unwrap();

        assert_eq!(injected[0].question, "[w2v5] [w2v6]");
        assert_eq!(injected[0].orig_question.as_deref(), Some("first question"));
        assert_eq!(injected[1].question, "[w2v9]");
        assert_eq!(injected[1].orig_question.as_deref(), Some("second question"));
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let records = vec![record("only one")];
        let rows = vec![vec!["1".to_string()], vec!["2".to_string()]];
        let map: HashMap<usize, usize> = [(1, 0), (2, 1)].into_iter().collect();

        let err = inject_quantized_queries(records, &rows, &map, "w2v").unwrap_err();
        assert!(err.to_string().contains("record count 1"));
    }

    #[test]
    fn test_missing_orig_id_is_fatal() {
        let records = vec![record("q")];
        let rows = vec![vec!["1".to_string()]];
        // Map knows nothing about orig id 1
        let map: HashMap<usize, usize> = HashMap::new();
        assert!(inject_quantized_queries(records, &rows, &map, "w2v").is_err());
    }
}
