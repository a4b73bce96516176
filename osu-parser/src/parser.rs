//! Line-oriented `.osu` decoder
//!
//! The format has gone through many versions and is often edited by hand, so
//! the parser never fails: a line it cannot make sense of is dropped and
//! reported as a [`Diagnostic`], and parsing carries on with the next one.

use std::fmt;
use std::str::FromStr;

use crate::section::Section;
use crate::types::*;

/// A non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub section: Section,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} ({}): {}", self.line, self.section, self.message)
    }
}

/// Handles one trimmed, non-empty line of a section. Returns a message when
/// the line (or part of it) had to be ignored.
type LineHandler = fn(&mut ChartRecord, &str) -> Option<String>;

fn handler_for(section: Section) -> LineHandler {
    match section {
        Section::None => orphan_line,
        Section::General => parse_general,
        Section::Editor => parse_editor,
        Section::Metadata => parse_metadata,
        Section::Difficulty => parse_difficulty,
        Section::Events => parse_event,
        Section::TimingPoints => parse_timing_point,
        Section::Colours => parse_colour,
        Section::HitObjects => parse_hit_object,
        Section::Unknown => ignore_line,
    }
}

fn orphan_line(_: &mut ChartRecord, _: &str) -> Option<String> {
    Some("line before the first section header ignored".to_string())
}

fn ignore_line(_: &mut ChartRecord, _: &str) -> Option<String> {
    None
}

/// Incremental parser. Feed it lines, then call [`ChartParser::finish`].
#[derive(Debug)]
pub struct ChartParser {
    chart: ChartRecord,
    section: Section,
    line_no: usize,
    seen_content: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Default for ChartParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartParser {
    pub fn new() -> Self {
        Self {
            chart: ChartRecord::default(),
            section: Section::None,
            line_no: 0,
            seen_content: false,
            diagnostics: Vec::new(),
        }
    }

    /// Consume one raw line of input.
    pub fn feed(&mut self, raw: &str) {
        self.line_no += 1;

        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            return;
        }

        // Only the very first meaningful line may carry the version marker
        if !self.seen_content {
            self.seen_content = true;
            match version_marker(line) {
                Some(Ok(version)) => {
                    self.chart.osu_file_format = version;
                    return;
                }
                Some(Err(message)) => {
                    self.report(message);
                    return;
                }
                None => {}
            }
        }

        if let Some(section) = Section::from_header(line) {
            self.section = section;
            return;
        }

        if let Some(message) = handler_for(self.section)(&mut self.chart, line) {
            self.report(message);
        }
    }

    /// Compute the derived fields and hand back the chart.
    pub fn finish(mut self) -> (ChartRecord, Vec<Diagnostic>) {
        self.chart.compute_derived();
        log::debug!(
            "Parsed chart '{}': {} hit objects, {} timing points, {} diagnostics",
            self.chart.version,
            self.chart.hit_objects.len(),
            self.chart.timing_points.len(),
            self.diagnostics.len()
        );
        (self.chart, self.diagnostics)
    }

    fn report(&mut self, message: String) {
        let diagnostic = Diagnostic {
            line: self.line_no,
            section: self.section,
            message,
        };
        log::debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Parse a whole `.osu` file.
pub fn parse(content: &str) -> ChartRecord {
    parse_with_diagnostics(content).0
}

/// Parse a whole `.osu` file, also returning every line that was skipped.
pub fn parse_with_diagnostics(content: &str) -> (ChartRecord, Vec<Diagnostic>) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut parser = ChartParser::new();
    for line in content.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Recognise `<token> v<integer>`, e.g. `osu file format v14`.
/// `None` means the line is not a version marker at all.
fn version_marker(line: &str) -> Option<Result<i32, String>> {
    if line.starts_with('[') {
        return None;
    }
    let (_, version) = line.rsplit_once(" v")?;
    Some(version.trim().parse().map_err(|_| {
        format!(
            "unreadable format version `{}`, assuming v{}",
            version, LATEST_FORMAT_VERSION
        )
    }))
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Parse `value` into `field`, leaving the field untouched on failure.
fn set<T: FromStr>(field: &mut T, key: &str, value: &str) -> Option<String> {
    match value.parse() {
        Ok(parsed) => {
            *field = parsed;
            None
        }
        Err(_) => Some(format!("invalid value `{}` for {}", value, key)),
    }
}

fn set_flag(field: &mut bool, value: &str) -> Option<String> {
    *field = value == "1";
    None
}

fn missing_separator(line: &str) -> Option<String> {
    Some(format!("expected `Key: Value`, got `{}`", line))
}

fn parse_general(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let Some((key, value)) = split_key_value(line) else {
        return missing_separator(line);
    };

    match key {
        "AudioFilename" => chart.audio_filename = value.to_string(),
        "AudioLeadIn" => return set(&mut chart.audio_lead_in, key, value),
        "AudioHash" => chart.audio_hash = value.to_string(),
        "PreviewTime" => return set(&mut chart.preview_time_ms, key, value),
        "Countdown" => return set(&mut chart.countdown, key, value),
        "SampleSet" => chart.sample_set = value.to_string(),
        "StackLeniency" => return set(&mut chart.stack_leniency, key, value),
        "Mode" => return set(&mut chart.mode, key, value),
        "LetterboxInBreaks" => return set_flag(&mut chart.letterbox_in_breaks, value),
        "StoryFireInFront" => return set_flag(&mut chart.story_fire_in_front, value),
        "UseSkinSprites" => return set_flag(&mut chart.use_skin_sprites, value),
        "AlwaysShowPlayfield" => return set_flag(&mut chart.always_show_playfield, value),
        "OverlayPosition" => chart.overlay_position = value.to_string(),
        "SkinPreference" => chart.skin_preference = value.to_string(),
        "EpilepsyWarning" => return set_flag(&mut chart.epilepsy_warning, value),
        "CountdownOffset" => return set(&mut chart.countdown_offset, key, value),
        "SpecialStyle" => return set_flag(&mut chart.special_style, value),
        "WidescreenStoryboard" => return set_flag(&mut chart.widescreen_storyboard, value),
        "SamplesMatchPlaybackRate" => {
            return set_flag(&mut chart.samples_match_playback_rate, value)
        }
        _ => {}
    }
    None
}

fn parse_editor(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let Some((key, value)) = split_key_value(line) else {
        return missing_separator(line);
    };

    match key {
        "Bookmarks" if !value.is_empty() => {
            match value.split(',').map(|b| b.trim().parse()).collect::<Result<Vec<i32>, _>>() {
                Ok(bookmarks) => chart.bookmarks = bookmarks,
                Err(_) => return Some(format!("invalid bookmark list `{}`", value)),
            }
        }
        "DistanceSpacing" => return set(&mut chart.distance_spacing, key, value),
        "BeatDivisor" => return set(&mut chart.beat_divisor, key, value),
        "GridSize" => return set(&mut chart.grid_size, key, value),
        "TimelineZoom" => return set(&mut chart.timeline_zoom, key, value),
        _ => {}
    }
    None
}

fn parse_metadata(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let Some((key, value)) = split_key_value(line) else {
        return missing_separator(line);
    };

    let field = match key {
        "Title" => &mut chart.title,
        "TitleUnicode" => &mut chart.title_unicode,
        "Artist" => &mut chart.artist,
        "ArtistUnicode" => &mut chart.artist_unicode,
        "Creator" => &mut chart.creator,
        "Version" => &mut chart.version,
        "Source" => &mut chart.source,
        "Tags" => &mut chart.tags,
        "BeatmapID" => return set(&mut chart.beatmap_id, key, value),
        "BeatmapSetID" => return set(&mut chart.beatmapset_id, key, value),
        _ => return None,
    };
    *field = value.to_string();
    None
}

fn parse_difficulty(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let Some((key, value)) = split_key_value(line) else {
        return missing_separator(line);
    };

    match key {
        "HPDrainRate" => set(&mut chart.hp_drain_rate, key, value),
        "CircleSize" => set(&mut chart.circle_size, key, value),
        "OverallDifficulty" => set(&mut chart.overall_difficulty, key, value),
        "ApproachRate" => set(&mut chart.approach_rate, key, value),
        "SliderMultiplier" => set(&mut chart.slider_multiplier, key, value),
        "SliderTickRate" => set(&mut chart.slider_tick_rate, key, value),
        _ => None,
    }
}

/// Only the background (`0,0,"file"`) and break (`2,start,end`) lines matter
/// here; storyboard commands are left to whoever renders them.
fn parse_event(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let fields: Vec<&str> = line.split(',').collect();

    if line.starts_with("0,0,") {
        chart.background_filename = fields[2].trim().trim_matches('"').to_string();
    } else if line.starts_with("2,") {
        if fields.len() < 3 {
            return Some(format!("break needs a start and an end, got `{}`", line));
        }
        match (fields[1].trim().parse(), fields[2].trim().parse()) {
            (Ok(start_ms), Ok(end_ms)) => {
                chart.break_periods.push(BreakPeriod { start_ms, end_ms })
            }
            _ => return Some(format!("invalid break period `{}`", line)),
        }
    }
    None
}

fn parse_timing_point(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 2 {
        return Some(format!("timing point needs at least 2 fields, got `{}`", line));
    }

    // Some files carry fractional offsets
    let offset = match fields[0].parse::<f64>() {
        Ok(offset) if offset.is_finite() => offset as i32,
        _ => return Some(format!("invalid timing point offset `{}`", fields[0])),
    };
    let Ok(beat_length) = fields[1].parse::<f64>() else {
        return Some(format!("invalid beat length `{}`", fields[1]));
    };

    let mut point = TimingPoint::new(offset, beat_length);
    let mut rejected = Vec::new();

    let mut optional = |index: usize, name: &str, field: &mut i32| {
        if let Some(raw) = fields.get(index) {
            match raw.parse() {
                Ok(value) => *field = value,
                Err(_) => rejected.push(format!("{} `{}`", name, raw)),
            }
        }
    };
    optional(2, "meter", &mut point.meter);
    optional(3, "sample set", &mut point.sample_set);
    optional(4, "sample index", &mut point.sample_index);
    optional(5, "volume", &mut point.volume);
    let mut uninherited = i32::from(TimingPoint::DEFAULT_UNINHERITED);
    optional(6, "uninherited flag", &mut uninherited);
    optional(7, "effects", &mut point.effects);
    point.is_uninherited = uninherited == 1;

    chart.timing_points.push(point);

    if rejected.is_empty() {
        None
    } else {
        Some(format!("invalid {}; default used", rejected.join(", ")))
    }
}

fn parse_colour(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let Some((key, value)) = split_key_value(line) else {
        return missing_separator(line);
    };
    if !key.starts_with("Combo") || value.is_empty() {
        return None;
    }

    let channels: Result<Vec<i32>, _> = value.split(',').map(|c| c.trim().parse()).collect();
    match channels.as_deref() {
        Ok(&[r, g, b]) => {
            chart.combo_colours.push(Rgb { r, g, b });
            None
        }
        _ => Some(format!("{} is not an RGB triple: `{}`", key, value)),
    }
}

fn parse_hit_object(chart: &mut ChartRecord, line: &str) -> Option<String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 5 {
        return Some(format!("hit object needs at least 5 fields, got `{}`", line));
    }

    let mut values = [0i32; 5];
    for (i, (value, name)) in values
        .iter_mut()
        .zip(["x", "y", "offset", "type", "hit sound"])
        .enumerate()
    {
        match fields[i].trim().parse() {
            Ok(parsed) => *value = parsed,
            Err(_) => return Some(format!("invalid hit object {} `{}`", name, fields[i])),
        }
    }
    let [x, y, offset_ms, object_type, hit_sound] = values;

    let last = fields.len() - 1;
    let extra_params = if fields.len() > 6 {
        fields[5..last].join(",")
    } else {
        String::new()
    };
    let hit_sample = if fields.len() > 5 {
        fields[last].to_string()
    } else {
        String::new()
    };

    chart.hit_objects.push(HitObject {
        x,
        y,
        offset_ms,
        object_type,
        hit_sound,
        extra_params,
        hit_sample,
    });
    None
}
