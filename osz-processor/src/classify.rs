//! Classify archive members by file extension

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "m4a"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["avi", "flv", "mpg", "wmv", "mp4", "m4v"];
const STORYBOARD_EXTENSIONS: &[&str] = &["osb", "txt"];

/// What a file inside an archive is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Chart,
    Audio,
    Image,
    Video,
    Storyboard,
    Other,
}

impl MemberRole {
    /// Classify by extension only (case-insensitive). Content is never sniffed.
    pub fn from_path(path: &str) -> Self {
        let Some(ext) = extension(path) else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();

        if ext == "osu" {
            Self::Chart
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if STORYBOARD_EXTENSIONS.contains(&ext) {
            Self::Storyboard
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Video => "video",
            Self::Storyboard => "storyboard",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of the last path component, without the dot.
pub(crate) fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit(|c| c == '/' || c == '\\').next()?;
    Path::new(name).extension()?.to_str()
}

/// Backslashes to forward slashes
pub(crate) fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Normalize path separators and case for comparison
pub(crate) fn normalize_path(path: &str) -> String {
    normalize_separators(path).to_lowercase()
}
