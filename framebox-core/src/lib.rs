pub mod config;
pub mod error;
pub mod frame;
pub mod upload;

pub use config::{load_framebox_config, FrameboxConfig};
pub use error::{ConfigError, Result};
pub use frame::{
    build_index, canonical_name, canonicalize, content_digest, ensure_canonical, exact_frames,
    extract_subtitle, file_digest, fuzzy_frames, is_canonical, levenshtein, random_frames, Frame,
    FrameError, FrameResult,
};
pub use upload::{is_image, store_upload, stored_filename, UploadError, UploadResult};
