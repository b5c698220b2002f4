//! The `<subtitle>_<sha256>.<ext>` filename convention.
//!
//! Frames carry no metadata besides their filename: the subtitle is everything
//! before the last `_`, and the final segment holds the content digest plus the
//! image extension.

use std::fs;
use std::path::Path;

use tracing::info;

use super::hasher::{file_digest, DIGEST_HEX_LEN};
use super::{FrameError, FrameResult};

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// True when `ext` (without the dot) is one a canonical frame may carry.
pub fn is_frame_extension(ext: &str) -> bool {
    FRAME_EXTENSIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// True when the text after the last `.` of `filename` is a frame extension.
pub fn has_frame_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| is_frame_extension(ext))
        .unwrap_or(false)
}

pub fn is_canonical(filename: &str) -> bool {
    let Some((_, hash_part)) = filename.rsplit_once('_') else {
        return false;
    };
    let mut pieces = hash_part.split('.');
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(hash), Some(ext), None) => hash.len() == DIGEST_HEX_LEN && is_frame_extension(ext),
        _ => false,
    }
}

/// Subtitle encoded in `filename`.
///
/// A name without any `_` is returned whole, extension included.
pub fn extract_subtitle(filename: &str) -> String {
    match filename.rsplit_once('_') {
        Some((subtitle, _)) => subtitle.to_string(),
        None => filename.to_string(),
    }
}

/// Splits at the last `.`; the extension keeps its dot and may be empty.
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) => filename.split_at(idx),
        None => (filename, ""),
    }
}

/// Inserts `_<digest>` in front of the extension of `filename`.
pub fn canonical_name(filename: &str, digest: &str) -> String {
    let (stem, ext) = split_extension(filename);
    format!("{stem}_{digest}{ext}")
}

/// Hashes `dir/filename` and renames it to its canonical name.
pub fn canonicalize(dir: &Path, filename: &str) -> FrameResult<String> {
    let path = dir.join(filename);
    let digest = file_digest(&path)?;
    let renamed = canonical_name(filename, &digest);
    let target = dir.join(&renamed);
    fs::rename(&path, &target).map_err(|err| FrameError::io(err, &path))?;
    info!(
        target: "frame.index",
        from = %filename,
        to = %renamed,
        "renamed frame to canonical name"
    );
    Ok(renamed)
}

/// Returns the canonical name for `dir/filename`, renaming the file first if it
/// does not already follow the convention. Canonical names are returned without
/// touching the filesystem.
pub fn ensure_canonical(dir: &Path, filename: &str) -> FrameResult<String> {
    if is_canonical(filename) {
        return Ok(filename.to_string());
    }
    canonicalize(dir, filename)
}
