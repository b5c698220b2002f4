//! Validation and storage of uploaded frames.
//!
//! The content type is sniffed from the leading bytes; client supplied MIME
//! types and extensions are never consulted.

mod error;

use std::io::{Read, Write};
use std::path::Path;

use image::ImageFormat;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::frame::{canonical_name, content_digest};

pub use error::{UploadError, UploadResult};

/// Number of leading bytes inspected when sniffing content.
pub const SNIFF_LEN: u64 = 512;

/// True when the first bytes of `content` carry a JPEG, PNG or GIF signature.
/// A failed or empty read counts as "not an image".
pub fn is_image<R: Read>(content: R) -> bool {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    match content.take(SNIFF_LEN).read_to_end(&mut head) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(
            image::guess_format(&head),
            Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif)
        ),
    }
}

/// Name an upload is stored under: the basename of the client filename with
/// the content digest inserted before the extension.
pub fn stored_filename(original: &str, content: &[u8]) -> UploadResult<String> {
    let basename = Path::new(original)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| UploadError::InvalidFilename(original.to_string()))?;
    Ok(canonical_name(basename, &content_digest(content)))
}

/// Validates `content` and writes it to `dir` under its stored filename.
///
/// The bytes go to a temporary file in `dir` first and are moved into place
/// once fully written, so a failed upload never leaves a partial frame behind.
/// An existing file with the same name holds the same content and is replaced.
pub fn store_upload(dir: &Path, original: &str, content: &[u8]) -> UploadResult<String> {
    if !is_image(content) {
        debug!(target: "frame.upload", file = %original, "rejected non-image upload");
        return Err(UploadError::NotAnImage);
    }
    let filename = stored_filename(original, content)?;
    let target = dir.join(&filename);

    let write_err = |source: std::io::Error| UploadError::Write {
        path: target.clone(),
        source,
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
    staged.write_all(content).map_err(write_err)?;
    staged.as_file().sync_all().map_err(write_err)?;
    staged
        .persist(&target)
        .map_err(|err| write_err(err.error))?;

    info!(target: "frame.upload", file = %filename, bytes = content.len(), "stored frame");
    Ok(filename)
}
