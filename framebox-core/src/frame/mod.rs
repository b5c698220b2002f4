mod error;
pub mod hasher;
pub mod index;
mod models;
pub mod naming;
pub mod selection;

pub use error::{FrameError, FrameResult};
pub use hasher::{content_digest, file_digest};
pub use index::build_index;
pub use models::Frame;
pub use naming::{canonical_name, canonicalize, ensure_canonical, extract_subtitle, is_canonical};
pub use selection::{exact_frames, fold_eq, fuzzy_frames, levenshtein, random_frames};
