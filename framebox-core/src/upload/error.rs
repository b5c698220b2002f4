use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file is not an image")]
    NotAnImage,
    #[error("invalid upload filename {0:?}")]
    InvalidFilename(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type UploadResult<T> = std::result::Result<T, UploadError>;
