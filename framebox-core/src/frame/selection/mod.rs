//! Frame selection: uniform random sampling, fuzzy ranking and exact matching.
//!
//! Every selector validates `count` against the full frame list first, so an
//! out-of-range request fails the same way regardless of the algorithm.

use rand::seq::SliceRandom;
use rand::Rng;

use super::models::FrameDistance;
use super::{Frame, FrameError, FrameResult};

fn checked_count(frames: &[Frame], count: i64) -> FrameResult<usize> {
    match usize::try_from(count) {
        Ok(value) if value <= frames.len() => Ok(value),
        _ => Err(FrameError::InvalidCount { count }),
    }
}

/// Draws `count` distinct frames uniformly at random, in draw order.
///
/// The function is deterministic as long as the RNG is seeded with a
/// reproducible seed.
pub fn random_frames<R>(frames: &[Frame], count: i64, rng: &mut R) -> FrameResult<Vec<Frame>>
where
    R: Rng + ?Sized,
{
    let count = checked_count(frames, count)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut indices: Vec<usize> = (0..frames.len()).collect();
    let (picked, _) = indices.partial_shuffle(rng, count);
    Ok(picked.iter().map(|&idx| frames[idx].clone()).collect())
}

/// Ranks frames by edit distance between `query` and their subtitle.
///
/// A frame qualifies only when the distance is strictly below the subtitle's
/// length in chars. Ties keep their input order. Fewer than `count` frames are
/// returned when not enough qualify.
pub fn fuzzy_frames(frames: &[Frame], query: &str, count: i64) -> FrameResult<Vec<Frame>> {
    let count = checked_count(frames, count)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<FrameDistance<'_>> = frames
        .iter()
        .filter_map(|frame| {
            let distance = levenshtein(query, &frame.subtitle);
            (distance < frame.subtitle.chars().count()).then_some(FrameDistance { frame, distance })
        })
        .collect();
    candidates.sort_by_key(|candidate| candidate.distance);

    Ok(candidates
        .into_iter()
        .take(count)
        .map(|candidate| candidate.frame.clone())
        .collect())
}

/// Frames whose subtitle equals `query` ignoring case.
///
/// When at least `count` frames match, `count` of them are sampled at random;
/// otherwise every match is returned.
pub fn exact_frames<R>(
    frames: &[Frame],
    query: &str,
    count: i64,
    rng: &mut R,
) -> FrameResult<Vec<Frame>>
where
    R: Rng + ?Sized,
{
    let wanted = checked_count(frames, count)?;
    if wanted == 0 {
        return Ok(Vec::new());
    }

    let matches: Vec<Frame> = frames
        .iter()
        .filter(|frame| fold_eq(&frame.subtitle, query))
        .cloned()
        .collect();

    if matches.len() < wanted {
        return Ok(matches);
    }
    random_frames(&matches, count, rng)
}

/// Char-by-char case-insensitive equality. Two chars match when either their
/// lowercase or uppercase mappings agree, so `ς`, `σ` and `Σ` are equal while
/// `ß` and `SS` are not.
pub fn fold_eq(a: &str, b: &str) -> bool {
    a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            x == y
                || x.to_lowercase().eq(y.to_lowercase())
                || x.to_uppercase().eq(y.to_uppercase())
        })
}

/// Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
