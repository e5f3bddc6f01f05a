// ============================================================
// Layer 4 — Wav + Text Retriever-Evaluation Dataset
// ============================================================
// Serves retriever evaluation: each item pairs the SPOKEN
// question (as a waveform feature matrix) with the gold answer
// strings, read from a delimited QA file:
//
//   who wrote the iliad	["Homer"]
//   when was rust 1.0 released	['May 2015', '2015']
//
// Field 0 is the question; field 1 is a bracketed answer list.
// The answer field appears in the wild with both double- and
// single-quoted items (different export scripts), so the parser
// here accepts both quote styles with backslash escapes.
//
// Audio resolution reuses the positional TSV manifest and the
// same index + 1 convention as wav_json, including the injected
// mapping function. Query length is capped by the shared
// bounder, and a coarse length histogram (bucket = L / 10000
// samples) is kept as a load diagnostic — it answers "how much
// audio are we actually cutting?" without logging every item.
//
// Reference: Rust Book §8 (Strings), §16 (Shared-State
//            Concurrency — Mutex)

use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use std::{collections::HashMap, fs, path::PathBuf, sync::Mutex};

use crate::data::audio::audio_feats;
use crate::data::bounding::{bound_features, TruncationCounter, CUT_LOG_EVERY};
use crate::data::manifest::id_to_audio_file_map;
use crate::data::wav_json::{
    SampleIdFn, DEFAULT_AUDIO_FILE_PREFIX, DEFAULT_MAX_FEATURES_SZ,
};
use crate::domain::sample::SpeechQaSample;

/// Width of one length-histogram bucket, in samples
const LENGTH_BUCKET_SZ: usize = 10_000;

/// One question with its gold answers, before audio resolution.
#[derive(Debug, Clone)]
struct QaEntry {
    query_text: String,
    answers: Vec<String>,
}

/// Retriever-evaluation dataset: spoken questions from a
/// positional manifest, answers from a delimited QA file.
pub struct WavTextQaDataset {
    file: PathBuf,
    wav_tsv_file: PathBuf,
    audio_file_prefix: String,
    max_features_sz: usize,
    normalize_audio: bool,
    delim: char,

    /// Record index → manifest id (default: index + 1)
    sample_id_of: SampleIdFn,

    /// Populated by load_data(); read-only afterwards
    data: Vec<QaEntry>,
    id_to_audio_file_map: HashMap<usize, PathBuf>,
    cut_samples: TruncationCounter,

    /// Histogram of query lengths by LENGTH_BUCKET_SZ bucket.
    /// Mutex-guarded because dataloader workers update it
    /// concurrently; it is diagnostic state, never a sample input.
    length_buckets: Mutex<HashMap<usize, usize>>,
}

impl WavTextQaDataset {
    pub fn new(file: impl Into<PathBuf>, wav_tsv_file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            wav_tsv_file: wav_tsv_file.into(),
            audio_file_prefix: DEFAULT_AUDIO_FILE_PREFIX.to_string(),
            max_features_sz: DEFAULT_MAX_FEATURES_SZ,
            normalize_audio: false,
            delim: '\t',
            sample_id_of: Box::new(|index| index + 1),
            data: Vec::new(),
            id_to_audio_file_map: HashMap::new(),
            cut_samples: TruncationCounter::new(Some(CUT_LOG_EVERY)),
            length_buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_audio_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.audio_file_prefix = prefix.into();
        self
    }

    pub fn with_max_features_sz(mut self, max_features_sz: usize) -> Self {
        self.max_features_sz = max_features_sz;
        self
    }

    pub fn with_normalize_audio(mut self, normalize_audio: bool) -> Self {
        self.normalize_audio = normalize_audio;
        self
    }

    /// Field delimiter of the QA file (default: tab)
    pub fn with_delim(mut self, delim: char) -> Self {
        self.delim = delim;
        self
    }

    pub fn with_sample_id_fn(mut self, sample_id_of: SampleIdFn) -> Self {
        self.sample_id_of = sample_id_of;
        self
    }

    /// Read the QA file and build the audio index.
    pub fn load_data(&mut self) -> Result<()> {
        let content = fs::read_to_string(&self.file)
            .with_context(|| format!("cannot read QA file '{}'", self.file.display()))?;

        let mut data = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (question, answers) = line.split_once(self.delim).with_context(|| {
                format!("QA line {}:{} has no answer field", self.file.display(), lineno + 1)
            })?;
            let answers = parse_answer_list(answers).with_context(|| {
                format!("bad answer list at {}:{}", self.file.display(), lineno + 1)
            })?;
            data.push(QaEntry {
                query_text: process_question(question),
                answers,
            });
        }
        self.data = data;

        self.id_to_audio_file_map =
            id_to_audio_file_map(&self.audio_file_prefix, &self.wav_tsv_file)?;
        tracing::info!(
            "id_to_audio_file_map size: {}",
            self.id_to_audio_file_map.len()
        );
        Ok(())
    }

    /// Truncations recorded so far (diagnostic only).
    pub fn cut_samples(&self) -> usize {
        self.cut_samples.count()
    }

    /// Snapshot of the query-length histogram
    /// (bucket index → count; bucket = sample count / 10000).
    pub fn length_buckets(&self) -> HashMap<usize, usize> {
        self.length_buckets.lock().expect("length bucket lock").clone()
    }

    /// Fallible per-index assembly; the Dataset impl wraps this.
    pub fn fetch(&self, index: usize) -> Result<Option<SpeechQaSample>> {
        let Some(entry) = self.data.get(index) else {
            return Ok(None);
        };

        let sample_id = (self.sample_id_of)(index);
        let audio_file = self
            .id_to_audio_file_map
            .get(&sample_id)
            .with_context(|| format!("no audio file mapped for sample id {sample_id}"))?;

        let feats = audio_feats(audio_file, self.normalize_audio)?;

        // Histogram sees the PRE-truncation length — that is the
        // distribution the cap is tuned against
        {
            let bucket = feats.ncols() / LENGTH_BUCKET_SZ;
            let mut buckets = self.length_buckets.lock().expect("length bucket lock");
            *buckets.entry(bucket).or_insert(0) += 1;
        }

        let feats = bound_features(feats, self.max_features_sz, &self.cut_samples);

        Ok(Some(SpeechQaSample {
            query: feats,
            query_text: entry.query_text.clone(),
            answers: entry.answers.clone(),
        }))
    }
}

impl Dataset<SpeechQaSample> for WavTextQaDataset {
    fn get(&self, index: usize) -> Option<SpeechQaSample> {
        self.fetch(index)
            .unwrap_or_else(|e| panic!("corrupt evaluation data at index {index}: {e:#}"))
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Normalize a question for matching: lowercase and trimmed.
fn process_question(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Parse a bracketed answer list: ["a", "b"] or ['a', 'b'].
///
/// Hand-rolled because the single-quoted form is not JSON. Rules:
/// items are quoted with ' or ", backslash escapes the next
/// character inside an item, commas separate items outside
/// quotes. Anything unquoted between items must be whitespace.
fn parse_answer_list(raw: &str) -> Result<Vec<String>> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .with_context(|| format!("answer field '{raw}' is not a bracketed list"))?;

    let mut answers = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        // Skip whitespace and at most one separating comma
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let Some(&c) = chars.peek() else { break };
        if c == ',' {
            chars.next();
            continue;
        }

        let quote = match c {
            '\'' | '"' => {
                chars.next();
                c
            }
            other => bail!("unquoted content '{other}' in answer list '{raw}'"),
        };

        let mut item = String::new();
        loop {
            match chars.next() {
                Some('\\') => {
                    let escaped = chars
                        .next()
                        .with_context(|| format!("dangling escape in '{raw}'"))?;
                    item.push(escaped);
                }
                Some(c) if c == quote => break,
                Some(c) => item.push(c),
                None => bail!("unterminated quote in answer list '{raw}'"),
            }
        }
        answers.push(item);
    }

    Ok(answers)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn test_parses_double_quoted_answers() {
        let answers = parse_answer_list(r#"["Homer", "the poet Homer"]"#).unwrap();
        assert_eq!(answers, vec!["Homer", "the poet Homer"]);
    }

    #[test]
    fn test_parses_single_quoted_answers() {
        let answers = parse_answer_list("['May 2015', '2015']").unwrap();
        assert_eq!(answers, vec!["May 2015", "2015"]);
    }

    #[test]
    fn test_parses_escapes_and_embedded_quotes() {
        // Python-style repr: ['it\'s here']
        let answers = parse_answer_list(r"['it\'s here']").unwrap();
        assert_eq!(answers, vec!["it's here"]);
        // Single-quoted item may hold bare double quotes
        let answers = parse_answer_list(r#"['say "hi"']"#).unwrap();
        assert_eq!(answers, vec![r#"say "hi""#]);
    }

    #[test]
    fn test_rejects_unbracketed_field() {
        assert!(parse_answer_list("Homer").is_err());
        assert!(parse_answer_list("['unterminated").is_err());
    }

    #[test]
    fn test_empty_list_is_ok() {
        assert!(parse_answer_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_process_question_lowercases_and_trims() {
        assert_eq!(process_question("  Who Wrote The Iliad "), "who wrote the iliad");
    }

    /// Fixture: QA file with two questions + matching wavs.
    fn fixture(dir: &Path) -> (PathBuf, PathBuf) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        for (i, n_samples) in [(1usize, 4usize), (2, 9)] {
            let mut w =
                WavWriter::create(dir.join(format!("aud_dn_{i}.wav")), spec).unwrap();
            for _ in 0..n_samples {
                w.write_sample(500i16).unwrap();
            }
            w.finalize().unwrap();
        }

        let tsv = dir.join("wav.tsv");
        fs::File::create(&tsv)
            .unwrap()
            .write_all(
                format!("{}\naud_dn_1.wav\t4\naud_dn_2.wav\t9\n", dir.display()).as_bytes(),
            )
            .unwrap();

        let qa = dir.join("qa.tsv");
        fs::File::create(&qa)
            .unwrap()
            .write_all(b"Who Wrote It\t[\"Homer\"]\nsecond question\t['a', 'b']\n")
            .unwrap();

        (qa, tsv)
    }

    #[test]
    fn test_end_to_end_sample_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let (qa, tsv) = fixture(dir.path());

        let mut ds = WavTextQaDataset::new(qa, tsv);
        ds.load_data().unwrap();
        assert_eq!(ds.len(), 2);

        let sample = ds.get(0).unwrap();
        assert_eq!(sample.query.shape(), &[1, 4]);
        assert_eq!(sample.query_text, "who wrote it");
        assert_eq!(sample.answers, vec!["Homer"]);

        let sample = ds.get(1).unwrap();
        assert_eq!(sample.query.shape(), &[1, 9]);
        assert_eq!(sample.answers, vec!["a", "b"]);
    }

    #[test]
    fn test_truncation_and_length_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let (qa, tsv) = fixture(dir.path());

        let mut ds = WavTextQaDataset::new(qa, tsv).with_max_features_sz(5);
        ds.load_data().unwrap();

        // 4 samples → untouched; 9 samples → cut to 5
        assert_eq!(ds.get(0).unwrap().query.ncols(), 4);
        assert_eq!(ds.get(1).unwrap().query.ncols(), 5);
        assert_eq!(ds.cut_samples(), 1);

        // Both queries land in bucket 0 (lengths < 10000)
        assert_eq!(ds.length_buckets()[&0], 2);
    }
}
