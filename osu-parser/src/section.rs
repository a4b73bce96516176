//! Section headers of the `.osu` format

use std::fmt;

/// Which part of the file the parser is currently reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Before the first header
    None,
    General,
    Editor,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    Colours,
    HitObjects,
    /// Any header this parser does not understand; its lines are dropped
    Unknown,
}

impl Section {
    /// Parse a `[Name]` header line. Returns `None` if the line is not a header.
    pub fn from_header(line: &str) -> Option<Self> {
        let name = line.strip_prefix('[')?.strip_suffix(']')?;
        Some(Self::from_name(name.trim()))
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "General" => Self::General,
            "Editor" => Self::Editor,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "Events" => Self::Events,
            "TimingPoints" => Self::TimingPoints,
            "Colours" => Self::Colours,
            "HitObjects" => Self::HitObjects,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "no section",
            Self::General => "General",
            Self::Editor => "Editor",
            Self::Metadata => "Metadata",
            Self::Difficulty => "Difficulty",
            Self::Events => "Events",
            Self::TimingPoints => "TimingPoints",
            Self::Colours => "Colours",
            Self::HitObjects => "HitObjects",
            Self::Unknown => "unknown section",
        };
        f.write_str(name)
    }
}
