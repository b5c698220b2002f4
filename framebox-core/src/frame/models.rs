use serde::{Deserialize, Serialize};

/// One servable image and the subtitle encoded in its filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "name")]
    pub filename: String,
    pub subtitle: String,
}

impl Frame {
    pub fn from_filename(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let subtitle = super::naming::extract_subtitle(&filename);
        Self { filename, subtitle }
    }
}

/// Ranking tuple for the fuzzy matcher.
#[derive(Debug, Clone)]
pub(crate) struct FrameDistance<'a> {
    pub frame: &'a Frame,
    pub distance: usize,
}
