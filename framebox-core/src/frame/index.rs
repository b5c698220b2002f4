use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::naming::{ensure_canonical, has_frame_extension};
use super::{Frame, FrameError, FrameResult};

/// Scans `dir` and returns one [`Frame`] per image file, in file-name order.
///
/// Files that do not follow the canonical naming convention are hashed and
/// renamed in place before being listed. A rename that lands on a name already
/// listed (same subtitle, same content) is listed once. A missing or unreadable
/// directory is an error; an empty one yields an empty index.
pub fn build_index(dir: &Path) -> FrameResult<Vec<Frame>> {
    let metadata = fs::metadata(dir).map_err(|err| FrameError::io(err, dir))?;
    if !metadata.is_dir() {
        return Err(FrameError::io(
            io::Error::new(io::ErrorKind::Other, "not a directory"),
            dir,
        ));
    }

    let mut frames = Vec::new();
    let mut seen = HashSet::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf());
            FrameError::io(io::Error::from(err), path)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!(
                target: "frame.index",
                path = %entry.path().display(),
                "skipping file with non utf-8 name"
            );
            continue;
        };
        if !has_frame_extension(name) {
            debug!(target: "frame.index", file = %name, "skipping non-frame file");
            continue;
        }

        let name = match ensure_canonical(dir, name) {
            Ok(name) => name,
            // Renamed by a concurrent scan after the listing was taken.
            Err(FrameError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(target: "frame.index", file = %name, "frame vanished during scan");
                continue;
            }
            Err(err) => return Err(err),
        };
        if seen.insert(name.clone()) {
            frames.push(Frame::from_filename(name));
        }
    }

    debug!(target: "frame.index", dir = %dir.display(), frames = frames.len(), "index built");
    Ok(frames)
}
