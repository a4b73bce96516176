//! The archive pipeline: extract, hash, classify, parse, aggregate, validate

use std::fs;
use std::path::Path;

use osu_parser::ChartRecord;
use rayon::prelude::*;

use crate::archive::extract_members;
use crate::classify::MemberRole;
use crate::error::{ProcessError, Result};
use crate::hash::content_hash;
use crate::types::{ArchiveMember, MapsetRecord};
use crate::validate::validate;

/// Knobs for [`OszProcessor`]
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Parse chart members on the rayon pool. Chart order is unaffected.
    pub parallel_charts: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            parallel_charts: true,
        }
    }
}

/// Result of processing one archive
#[derive(Debug, Clone)]
pub struct ProcessedMapset {
    pub mapset: MapsetRecord,
    /// Skipped members and skipped chart lines, prefixed with the member path
    pub diagnostics: Vec<String>,
    /// Validation problems; see [`validate`]
    pub problems: Vec<String>,
}

impl ProcessedMapset {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Turns `.osz` bytes into a [`MapsetRecord`]
#[derive(Debug, Clone, Default)]
pub struct OszProcessor {
    options: ProcessOptions,
}

impl OszProcessor {
    pub fn new(options: ProcessOptions) -> Self {
        Self { options }
    }

    /// Process an archive held in memory.
    ///
    /// Fails only if the bytes are not a readable zip container
    /// ([`ProcessError::InvalidArchive`]) or contain no `.osu` file
    /// ([`ProcessError::NoValidCharts`]). Every other defect ends up in the
    /// returned diagnostics or validation problems.
    pub fn process(&self, archive: &[u8], filename: &str) -> Result<ProcessedMapset> {
        let archive_hash = content_hash(archive);

        // Removed on drop, so every early return cleans up too
        let workdir = tempfile::Builder::new().prefix("osz-").tempdir()?;

        let mut diagnostics = Vec::new();
        let files = extract_members(archive, workdir.path(), &mut diagnostics)?;

        if let Err(e) = workdir.close() {
            log::warn!("Failed to remove working directory for {}: {}", filename, e);
        }

        let members: Vec<ArchiveMember> = files
            .into_iter()
            .map(|(path, data)| ArchiveMember::new(path, data))
            .collect();

        let charts = self.parse_charts(&members, &mut diagnostics);
        if charts.is_empty() {
            return Err(ProcessError::NoValidCharts);
        }

        let mut mapset = MapsetRecord {
            archive_filename: filename.to_string(),
            archive_hash,
            archive_size: archive.len() as u64,
            charts,
            members,
            ..Default::default()
        };
        mapset.fill_from_first_chart();

        let problems = validate(&mapset);

        log::info!(
            "Processed {}: {} charts, {} files, {} diagnostics, {} problems",
            filename,
            mapset.charts.len(),
            mapset.members.len(),
            diagnostics.len(),
            problems.len()
        );

        Ok(ProcessedMapset {
            mapset,
            diagnostics,
            problems,
        })
    }

    /// Read an archive from disk and process it under its own file name.
    pub fn process_file(&self, path: &Path) -> Result<ProcessedMapset> {
        let data = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.process(&data, &filename)
    }

    fn parse_charts(
        &self,
        members: &[ArchiveMember],
        diagnostics: &mut Vec<String>,
    ) -> Vec<ChartRecord> {
        let chart_members: Vec<&ArchiveMember> = members
            .iter()
            .filter(|m| m.role == MemberRole::Chart)
            .collect();

        // Indexed collect keeps archive member order
        let parsed: Vec<(ChartRecord, Vec<String>)> = if self.options.parallel_charts {
            chart_members.par_iter().map(|m| parse_chart(m)).collect()
        } else {
            chart_members.iter().map(|m| parse_chart(m)).collect()
        };

        parsed
            .into_iter()
            .map(|(chart, chart_diagnostics)| {
                diagnostics.extend(chart_diagnostics);
                chart
            })
            .collect()
    }
}

fn parse_chart(member: &ArchiveMember) -> (ChartRecord, Vec<String>) {
    let content = String::from_utf8_lossy(&member.raw_content);
    let (mut chart, diagnostics) = osu_parser::parse_with_diagnostics(&content);

    chart.source_filename = member.relative_path.clone();
    chart.content_hash = member.content_hash.clone();

    let diagnostics = diagnostics
        .into_iter()
        .map(|d| format!("{}: {}", member.relative_path, d))
        .collect();
    (chart, diagnostics)
}
