// ============================================================
// Layer 4 — Base QA Record Sources
// ============================================================
// Reads the textual half of every dataset: QA records from a
// JSON array file or a JSONL file (one record per line).
//
// Two cleanup rules applied at load time, shared by every
// dataset built on top:
//
//   1. Positive filtering — a record with no positive passage
//      cannot contribute a contrastive training pair, so it is
//      dropped here, BEFORE any slicing. Important consequence:
//      slice positions refer to positions among the CLEANED
//      records, so the same (start, end) pair always selects
//      the same records regardless of how much noise the raw
//      file carries.
//
//   2. Range slicing — distributed training shards the record
//      list by (start, end); an unbounded end means "to the
//      end of the data".
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling), §13 (Iterators)

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::domain::record::QaRecord;

/// Read a whole-file JSON array of QA records.
pub fn read_json_records(file: &Path) -> Result<Vec<QaRecord>> {
    tracing::info!("Reading data file: {}", file.display());
    let content = fs::read_to_string(file)
        .with_context(|| format!("cannot read data file '{}'", file.display()))?;
    let records: Vec<QaRecord> = serde_json::from_str(&content)
        .with_context(|| format!("malformed JSON in '{}'", file.display()))?;
    tracing::info!("Aggregated data size: {}", records.len());
    Ok(records)
}

/// Read JSONL records (one JSON object per line), stopping after
/// `total_data_size` records when a cap is given.
///
/// Blank lines are skipped; a malformed line is a fatal error
/// carrying its 1-based line number.
pub fn read_jsonl_records(file: &Path, total_data_size: Option<usize>) -> Result<Vec<QaRecord>> {
    tracing::info!("Reading data file: {}", file.display());
    let f = fs::File::open(file)
        .with_context(|| format!("cannot open data file '{}'", file.display()))?;

    let mut records = Vec::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("read error in '{}'", file.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: QaRecord = serde_json::from_str(&line).with_context(|| {
            format!("malformed JSONL at {}:{}", file.display(), lineno + 1)
        })?;
        records.push(record);

        if let Some(cap) = total_data_size {
            if records.len() >= cap {
                break;
            }
        }
    }
    tracing::info!("Aggregated data size: {}", records.len());
    Ok(records)
}

/// Drop records without a positive passage, logging the cleaned size.
pub fn retain_with_positives(records: Vec<QaRecord>) -> Vec<QaRecord> {
    let records: Vec<QaRecord> = records.into_iter().filter(QaRecord::has_positive).collect();
    tracing::info!("Total cleaned data size: {}", records.len());
    records
}

/// Select the [start, end) shard of the record list.
/// `None` bounds mean "from the beginning" / "to the end";
/// out-of-range bounds clamp instead of panicking.
pub fn slice_records(
    records: Vec<QaRecord>,
    start_pos: Option<usize>,
    end_pos: Option<usize>,
) -> Vec<QaRecord> {
    let start = start_pos.unwrap_or(0).min(records.len());
    let end = end_pos.unwrap_or(records.len()).min(records.len());
    if start_pos.is_some() || end_pos.is_some() {
        tracing::info!("Selecting subset range from {} to {}", start, end);
    }
    if start >= end {
        return Vec::new();
    }
    records[start..end].to_vec()
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

    fn record(question: &str, positives: usize) -> QaRecord {
        serde_json::from_str(&format!(
            r#"{{"question": "{question}", "positive_ctxs": [{}]}}"#,
            vec![r#"{"text": "t"}"#; positives].join(",")
        ))
        .unwrap()
    }

    #[test]
    fn test_reads_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(
            dir.path(),
            "d.json",
            r#"[{"question": "q1", "positive_ctxs": [{"text": "t"}]},
                {"question": "q2"}]"#,
        );

        let records = read_json_records(&file).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "q1");
    }

    #[test]
    fn test_reads_jsonl_with_cap() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(
            dir.path(),
            "d.jsonl",
            "{\"question\": \"q1\"}\n\n{\"question\": \"q2\"}\n{\"question\": \"q3\"}\n",
        );

        let all = read_jsonl_records(&file, None).unwrap();
        assert_eq!(all.len(), 3);

        let capped = read_jsonl_records(&file, Some(2)).unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[1].question, "q2");
    }

    #[test]
    fn test_malformed_jsonl_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "d.jsonl", "{\"question\": \"q1\"}\nnot json\n");

        let err = read_jsonl_records(&file, None).unwrap_err();
        assert!(err.to_string().contains(":2"));
    }

    #[test]
    fn test_positive_filter_drops_empty_records() {
        let records = vec![record("a", 1), record("b", 0), record("c", 2)];
        let cleaned = retain_with_positives(records);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[1].question, "c");
    }

    #[test]
    fn test_slice_bounds_clamp() {
        let records = vec![record("a", 1), record("b", 1), record("c", 1)];
        let sliced = slice_records(records.clone(), Some(1), Some(10));
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced[0].question, "b");

        // Inverted/empty ranges give nothing rather than panicking
        assert!(slice_records(records, Some(3), Some(1)).is_empty());
    }

    #[test]
    fn test_slice_none_means_everything() {
        let records = vec![record("a", 1), record("b", 1)];
        assert_eq!(slice_records(records, None, None).len(), 2);
    }
}
