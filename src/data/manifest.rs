// ============================================================
// Layer 4 — Audio Manifest Index
// ============================================================
// Builds the mapping from a record identifier to the audio file
// holding that record's spoken question. Three constructions
// exist because the corpora ship three manifest shapes:
//
// 1. Positional TSV manifest (id_to_audio_file_map):
//      /data/audio/denoised          ← line 0: the root dir
//      aud_dn_1.wav	160000
//      aud_dn_2.wav	118400
//    The id is the number encoded in the filename between the
//    prefix ("aud_dn_") and the ".wav" suffix. Record index i
//    is looked up as id = i + 1 by the sequential assemblers.
//
// 2. PAQ manifest (question_to_audio_file_map):
//      17|who wrote the iliad
//    Keyed by the QUESTION TEXT, because PAQ audio covers only
//    a subset of the records. The wav path is synthesized from
//    a separately-supplied root dir as root/<prefix><id>.wav.
//
// 3. Orig→manifest re-index (orig_to_manifest_id_map):
//    Same TSV as (1), but mapping the encoded number to the
//    LINE POSITION instead of the path. The quantized-token
//    file is ordered by line position, so this is the bridge
//    the aligner needs. Kept as a separate parse on purpose:
//    merging it with (1) would silently change id semantics.
//
// A duplicate encoded id means the manifest is corrupt, and a
// corrupt manifest means misaligned training data — so both
// TSV parses fail hard instead of keeping the last entry.
//
// Reference: Rust Book §8 (HashMaps), §9 (Error Handling)

use anyhow::{bail, ensure, Context, Result};
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

/// Filename extension every manifest entry must carry
const WAV_SUFFIX: &str = ".wav";

/// Extract the numeric id encoded between `prefix` and ".wav".
/// e.g. numeric_suffix("aud_dn_42.wav", "aud_dn_") == 42
fn numeric_suffix(file: &str, prefix: &str) -> Result<usize> {
    let stem = file
        .strip_prefix(prefix)
        .with_context(|| format!("manifest entry '{file}' does not start with '{prefix}'"))?;
    let digits = stem
        .strip_suffix(WAV_SUFFIX)
        .with_context(|| format!("manifest entry '{file}' does not end with '{WAV_SUFFIX}'"))?;
    digits
        .parse::<usize>()
        .with_context(|| format!("manifest entry '{file}' has a non-numeric id '{digits}'"))
}

// ─── Positional TSV manifest ──────────────────────────────────────────────────
/// Parse a positional TSV manifest into id → absolute wav path.
///
/// Line 0 is the audio root directory; every following non-empty
/// line contributes one entry keyed by its encoded numeric id.
/// Duplicate ids abort the load.
pub fn id_to_audio_file_map(
    audio_file_prefix: &str,
    wav_tsv_file: &Path,
) -> Result<HashMap<usize, PathBuf>> {
    let content = fs::read_to_string(wav_tsv_file)
        .with_context(|| format!("cannot read manifest '{}'", wav_tsv_file.display()))?;

    let mut lines = content.split('\n');

    // Line 0 is not an entry — it names the directory all the
    // relative filenames below live in
    let root = lines
        .next()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .with_context(|| format!("manifest '{}' is empty", wav_tsv_file.display()))?;
    let root = PathBuf::from(root);

    let mut id_to_file_map = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        // Only field 0 matters; later fields (frame counts etc.)
        // are ignored
        let file = line.split('\t').next().unwrap_or(line);
        let id = numeric_suffix(file, audio_file_prefix)?;

        let previous = id_to_file_map.insert(id, root.join(file));
        if let Some(previous) = previous {
            bail!(
                "duplicate id {} in manifest '{}' (already mapped to '{}')",
                id,
                wav_tsv_file.display(),
                previous.display()
            );
        }
    }

    Ok(id_to_file_map)
}

// ─── PAQ manifest ─────────────────────────────────────────────────────────────
/// Parse a `|`-delimited PAQ manifest into question → wav path,
/// keeping only questions present in `questions`.
///
/// A mapped file that is missing on disk is logged but still
/// recorded — the read failure (if the file is ever fetched)
/// carries better diagnostics than silently dropping the entry.
pub fn question_to_audio_file_map(
    questions: &HashSet<String>,
    root: &Path,
    audio_file_prefix: &str,
    manifest_txt_file: &Path,
) -> Result<HashMap<String, PathBuf>> {
    let content = fs::read_to_string(manifest_txt_file)
        .with_context(|| format!("cannot read manifest '{}'", manifest_txt_file.display()))?;

    let mut q_to_file_map = HashMap::new();
    for line in content.split('\n') {
        if line.is_empty() {
            continue;
        }
        let (id, question) = line
            .split_once('|')
            .with_context(|| format!("malformed PAQ manifest line '{line}'"))?;

        // Most manifest lines cover questions outside this
        // dataset slice — skip them without further parsing
        if !questions.contains(question) {
            continue;
        }

        // The id must be numeric even though the path keeps it
        // as a string — a non-numeric id means a corrupt line
        id.parse::<usize>()
            .with_context(|| format!("non-numeric id '{id}' in PAQ manifest line '{line}'"))?;

        let file_path = root.join(format!("{audio_file_prefix}{id}{WAV_SUFFIX}"));
        if !file_path.is_file() {
            tracing::warn!("missing audio file {}", file_path.display());
        }
        q_to_file_map.insert(question.to_string(), file_path);
    }

    Ok(q_to_file_map)
}

// ─── Orig→manifest re-index ───────────────────────────────────────────────────
/// Map each entry's encoded numeric id (the "original" 1-based
/// record id) to its 0-based line position in the manifest.
///
/// The quantized-token file is written in manifest line order,
/// so this map is how a record finds its token row.
pub fn orig_to_manifest_id_map(
    audio_file_prefix: &str,
    wav_tsv_file: &Path,
) -> Result<HashMap<usize, usize>> {
    tracing::info!("Reading audio manifest file: {}", wav_tsv_file.display());
    let content = fs::read_to_string(wav_tsv_file)
        .with_context(|| format!("cannot read manifest '{}'", wav_tsv_file.display()))?;

    let mut lines = content.split('\n');
    // The root-dir header is irrelevant here, but it still must
    // not be counted as a manifest position
    ensure!(
        lines.next().is_some(),
        "manifest '{}' is empty",
        wav_tsv_file.display()
    );

    let mut orig_to_manifest = HashMap::new();
    let mut manifest_id = 0usize;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let file = line.split('\t').next().unwrap_or(line);
        let orig_id = numeric_suffix(file, audio_file_prefix)?;

        ensure!(
            !orig_to_manifest.contains_key(&orig_id),
            "duplicate id {} in manifest '{}'",
            orig_id,
            wav_tsv_file.display()
        );
        orig_to_manifest.insert(orig_id, manifest_id);
        manifest_id += 1;
    }
    tracing::info!("last manifest_id {}", manifest_id);

    Ok(orig_to_manifest)
}
