//! Records produced by processing one archive

use osu_parser::ChartRecord;
use serde::{Deserialize, Serialize};

use crate::classify::{extension, normalize_path, MemberRole};
use crate::hash::{content_hash, sharded_key};

/// One file extracted from an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMember {
    /// Path inside the archive, always with forward slashes
    pub relative_path: String,
    pub size_bytes: u64,
    pub content_hash: String,
    /// Raw bytes, handed to object storage rather than the record store
    #[serde(skip)]
    pub raw_content: Vec<u8>,
    pub role: MemberRole,
}

impl ArchiveMember {
    /// Hash and classify `raw_content`.
    pub fn new(relative_path: impl Into<String>, raw_content: Vec<u8>) -> Self {
        let relative_path = relative_path.into().replace('\\', "/");
        Self {
            size_bytes: raw_content.len() as u64,
            content_hash: content_hash(&raw_content),
            role: MemberRole::from_path(&relative_path),
            relative_path,
            raw_content,
        }
    }

    /// Object-storage key, e.g. `audio/3f/3f…9a.mp3`.
    pub fn storage_key(&self) -> String {
        let ext = extension(&self.relative_path).map(str::to_ascii_lowercase);
        sharded_key(self.role.as_str(), &self.content_hash, ext.as_deref())
    }

    /// Case-insensitive, separator-agnostic path comparison
    pub fn matches_path(&self, path: &str) -> bool {
        normalize_path(&self.relative_path) == normalize_path(path)
    }
}

/// Everything learned from one archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapsetRecord {
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub source: String,
    pub tags: String,
    pub description: String,
    // Archive identity
    pub archive_filename: String,
    pub archive_hash: String,
    pub archive_size: u64,
    /// Parsed charts, in archive member order
    pub charts: Vec<ChartRecord>,
    /// Every readable file, in archive member order
    pub members: Vec<ArchiveMember>,
}

impl MapsetRecord {
    /// Fill unset shared metadata from the first chart.
    pub fn fill_from_first_chart(&mut self) {
        let Some(first) = self.charts.first() else {
            return;
        };

        fill(&mut self.title, first.display_title());
        fill(&mut self.artist, first.display_artist());
        fill(&mut self.creator, &first.creator);
        fill(&mut self.source, &first.source);
        fill(&mut self.tags, &first.tags);
    }

    /// Object-storage key of the archive itself, e.g. `osz/3f/3f…9a.osz`.
    pub fn archive_storage_key(&self) -> String {
        sharded_key("osz", &self.archive_hash, Some("osz"))
    }

    pub fn members_with_role(&self, role: MemberRole) -> impl Iterator<Item = &ArchiveMember> {
        self.members.iter().filter(move |m| m.role == role)
    }

    pub fn find_member(&self, path: &str) -> Option<&ArchiveMember> {
        self.members.iter().find(|m| m.matches_path(path))
    }

    /// The chart member a parsed chart came from.
    pub fn chart_member(&self, chart: &ChartRecord) -> Option<&ArchiveMember> {
        self.members_with_role(MemberRole::Chart)
            .find(|m| m.content_hash == chart.content_hash)
    }
}

fn fill(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}
