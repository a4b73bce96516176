//! Structural checks over a processed mapset

use std::collections::HashSet;

use crate::classify::MemberRole;
use crate::types::MapsetRecord;

/// Collect every structural problem with `mapset`. An empty list means valid.
///
/// Never stops at the first problem, except when there are no charts at all.
pub fn validate(mapset: &MapsetRecord) -> Vec<String> {
    let mut problems = Vec::new();

    if mapset.title.trim().is_empty() {
        problems.push("Mapset title is required".to_string());
    }
    if mapset.artist.trim().is_empty() {
        problems.push("Artist name is required".to_string());
    }
    if mapset.creator.trim().is_empty() {
        problems.push("Creator name is required".to_string());
    }

    if mapset.charts.is_empty() {
        problems.push("At least one beatmap is required".to_string());
        return problems;
    }

    let mut seen_versions = HashSet::new();
    for chart in &mapset.charts {
        if !seen_versions.insert((chart.mode, chart.version.as_str())) {
            problems.push(format!(
                "Duplicate difficulty version: {} (mode {})",
                chart.version, chart.mode
            ));
        }

        if chart.version.trim().is_empty() {
            problems.push(format!(
                "Beatmap version/difficulty name is required ({})",
                chart.source_filename
            ));
        }
        if chart.creator.trim().is_empty() {
            problems.push(format!("Beatmap creator is required ({})", chart.source_filename));
        }
        if chart.hit_objects.is_empty() {
            problems.push(format!("No hit objects found in difficulty: {}", chart.version));
        }

        if !chart.audio_filename.is_empty() {
            let audio_found = mapset
                .members_with_role(MemberRole::Audio)
                .any(|m| m.matches_path(&chart.audio_filename));
            if !audio_found {
                problems.push(format!("Audio file not found: {}", chart.audio_filename));
            }
        }
    }

    if mapset.members_with_role(MemberRole::Audio).next().is_none() {
        problems.push("At least one audio file is required".to_string());
    }

    problems
}
