//! Core types for a parsed chart

use serde::{Deserialize, Serialize};

/// Newest `osu file format` version this parser knows about.
pub const LATEST_FORMAT_VERSION: i32 = 14;

/// A control point on the chart's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    pub offset_ms: i32,
    /// Milliseconds per beat when uninherited, negative inverse slider
    /// velocity percentage when inherited.
    pub beat_length_ms: f64,
    pub meter: i32,
    pub sample_set: i32,
    pub sample_index: i32,
    pub volume: i32,
    pub is_uninherited: bool,
    pub effects: i32,
}

impl TimingPoint {
    pub const DEFAULT_METER: i32 = 4;
    pub const DEFAULT_SAMPLE_SET: i32 = 0;
    pub const DEFAULT_SAMPLE_INDEX: i32 = 0;
    pub const DEFAULT_VOLUME: i32 = 100;
    pub const DEFAULT_UNINHERITED: bool = true;
    pub const DEFAULT_EFFECTS: i32 = 0;

    /// Timing point with every optional field at its default.
    pub fn new(offset_ms: i32, beat_length_ms: f64) -> Self {
        Self {
            offset_ms,
            beat_length_ms,
            meter: Self::DEFAULT_METER,
            sample_set: Self::DEFAULT_SAMPLE_SET,
            sample_index: Self::DEFAULT_SAMPLE_INDEX,
            volume: Self::DEFAULT_VOLUME,
            is_uninherited: Self::DEFAULT_UNINHERITED,
            effects: Self::DEFAULT_EFFECTS,
        }
    }

    /// Tempo set by this point, if it defines one.
    pub fn bpm(&self) -> Option<f64> {
        (self.is_uninherited && self.beat_length_ms > 0.0).then(|| 60_000.0 / self.beat_length_ms)
    }

    /// Slider velocity multiplier of an inherited point (`-100 / beat_length`).
    pub fn slider_velocity(&self) -> Option<f64> {
        (!self.is_uninherited && self.beat_length_ms < 0.0).then(|| -100.0 / self.beat_length_ms)
    }

    pub fn is_kiai(&self) -> bool {
        self.effects & 1 != 0
    }

    pub fn omits_first_barline(&self) -> bool {
        self.effects & 8 != 0
    }
}

/// Object kind selected by the low bits of [`HitObject::object_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitObjectKind {
    Circle,
    Slider,
    Spinner,
    /// osu!mania hold note
    Hold,
    Unknown,
}

/// One interactive gameplay element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitObject {
    pub x: i32,
    pub y: i32,
    pub offset_ms: i32,
    /// Kind bits (0 circle, 1 slider, 3 spinner, 7 hold) plus modifier flags.
    #[serde(rename = "type")]
    pub object_type: i32,
    pub hit_sound: i32,
    /// Kind-specific parameters, kept verbatim (e.g. slider curve).
    pub extra_params: String,
    pub hit_sample: String,
}

impl HitObject {
    const CIRCLE: i32 = 1;
    const SLIDER: i32 = 1 << 1;
    const NEW_COMBO: i32 = 1 << 2;
    const SPINNER: i32 = 1 << 3;
    const HOLD: i32 = 1 << 7;
    const COMBO_MASK: i32 = Self::CIRCLE | Self::SLIDER | Self::SPINNER;

    pub fn kind(&self) -> HitObjectKind {
        let t = self.object_type;
        if t & Self::CIRCLE != 0 {
            HitObjectKind::Circle
        } else if t & Self::SLIDER != 0 {
            HitObjectKind::Slider
        } else if t & Self::SPINNER != 0 {
            HitObjectKind::Spinner
        } else if t & Self::HOLD != 0 {
            HitObjectKind::Hold
        } else {
            HitObjectKind::Unknown
        }
    }

    pub fn new_combo(&self) -> bool {
        self.object_type & Self::NEW_COMBO != 0
    }

    /// How many combo colours to skip when this object starts a new combo.
    pub fn combo_offset(&self) -> i32 {
        (self.object_type >> 4) & 0b111
    }

    /// Circles, sliders and spinners add exactly one to the max combo.
    /// Slider ticks and hold duration are not counted.
    pub fn counts_towards_combo(&self) -> bool {
        self.object_type & Self::COMBO_MASK != 0
    }
}

/// A break period from the `[Events]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start_ms: i32,
    pub end_ms: i32,
}

/// A combo colour from the `[Colours]` section.
///
/// Channels are stored as written; values outside 0-255 are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

/// One parsed chart (difficulty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub osu_file_format: i32,
    // Identity, filled in by whoever owns the source bytes
    pub source_filename: String,
    pub content_hash: String,
    // General section
    pub audio_filename: String,
    pub audio_lead_in: i32,
    pub audio_hash: String,
    pub preview_time_ms: i32,
    pub countdown: i32,
    pub sample_set: String,
    pub stack_leniency: f32,
    pub mode: i32,
    pub letterbox_in_breaks: bool,
    pub story_fire_in_front: bool,
    pub use_skin_sprites: bool,
    pub always_show_playfield: bool,
    pub overlay_position: String,
    pub skin_preference: String,
    pub epilepsy_warning: bool,
    pub countdown_offset: i32,
    pub special_style: bool,
    pub widescreen_storyboard: bool,
    pub samples_match_playback_rate: bool,
    // Editor section
    pub bookmarks: Vec<i32>,
    pub distance_spacing: f64,
    pub beat_divisor: i32,
    pub grid_size: i32,
    pub timeline_zoom: f64,
    // Metadata section
    pub title: String,
    pub title_unicode: String,
    pub artist: String,
    pub artist_unicode: String,
    pub creator: String,
    pub version: String,
    pub source: String,
    pub tags: String,
    pub beatmap_id: i32,
    pub beatmapset_id: i32,
    // Difficulty section
    pub hp_drain_rate: f32,
    pub circle_size: f32,
    pub overall_difficulty: f32,
    pub approach_rate: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
    // Events section
    pub background_filename: String,
    pub break_periods: Vec<BreakPeriod>,
    // Remaining sections, in file order
    pub timing_points: Vec<TimingPoint>,
    pub combo_colours: Vec<Rgb>,
    pub hit_objects: Vec<HitObject>,
    // Derived once after the whole file is read
    pub total_length_ms: i32,
    pub hit_length_ms: i32,
    pub max_combo: u32,
    pub bpm: f64,
}

impl Default for ChartRecord {
    fn default() -> Self {
        Self {
            osu_file_format: LATEST_FORMAT_VERSION,
            source_filename: String::new(),
            content_hash: String::new(),
            audio_filename: String::new(),
            audio_lead_in: 0,
            audio_hash: String::new(),
            preview_time_ms: -1,
            countdown: 1,
            sample_set: "Normal".to_string(),
            stack_leniency: 0.7,
            mode: 0,
            letterbox_in_breaks: false,
            story_fire_in_front: true,
            use_skin_sprites: false,
            always_show_playfield: false,
            overlay_position: "NoChange".to_string(),
            skin_preference: String::new(),
            epilepsy_warning: false,
            countdown_offset: 0,
            special_style: false,
            widescreen_storyboard: false,
            samples_match_playback_rate: false,
            bookmarks: Vec::new(),
            distance_spacing: 1.0,
            beat_divisor: 4,
            grid_size: 4,
            timeline_zoom: 1.0,
            title: String::new(),
            title_unicode: String::new(),
            artist: String::new(),
            artist_unicode: String::new(),
            creator: String::new(),
            version: String::new(),
            source: String::new(),
            tags: String::new(),
            beatmap_id: 0,
            beatmapset_id: 0,
            hp_drain_rate: 5.0,
            circle_size: 5.0,
            overall_difficulty: 5.0,
            approach_rate: 5.0,
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
            background_filename: String::new(),
            break_periods: Vec::new(),
            timing_points: Vec::new(),
            combo_colours: Vec::new(),
            hit_objects: Vec::new(),
            total_length_ms: 0,
            hit_length_ms: 0,
            max_combo: 0,
            bpm: 0.0,
        }
    }
}

impl ChartRecord {
    /// Romanised title, falling back to the unicode one.
    pub fn display_title(&self) -> &str {
        non_empty_or(&self.title, &self.title_unicode)
    }

    /// Romanised artist, falling back to the unicode one.
    pub fn display_artist(&self) -> &str {
        non_empty_or(&self.artist, &self.artist_unicode)
    }

    /// Fill the derived fields. Leaves them at zero when there are no hit objects.
    pub(crate) fn compute_derived(&mut self) {
        let (Some(first), Some(last)) = (
            self.hit_objects.iter().map(|o| o.offset_ms).min(),
            self.hit_objects.iter().map(|o| o.offset_ms).max(),
        ) else {
            return;
        };

        self.hit_length_ms = last.saturating_sub(first);

        let tail = last.saturating_add(2_000);
        self.total_length_ms = if self.preview_time_ms > 0 {
            tail.max(self.preview_time_ms.saturating_add(30_000))
        } else {
            tail
        };

        self.max_combo = self
            .hit_objects
            .iter()
            .filter(|o| o.counts_towards_combo())
            .count() as u32;

        self.bpm = self.timing_points.iter().find_map(TimingPoint::bpm).unwrap_or(0.0);
    }
}

fn non_empty_or<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(offset_ms: i32, object_type: i32) -> HitObject {
        HitObject {
            x: 256,
            y: 192,
            offset_ms,
            object_type,
            hit_sound: 0,
            extra_params: String::new(),
            hit_sample: String::new(),
        }
    }

    #[test]
    fn kind_follows_low_bits() {
        assert_eq!(object(0, 1).kind(), HitObjectKind::Circle);
        assert_eq!(object(0, 2 | 4).kind(), HitObjectKind::Slider);
        assert_eq!(object(0, 8).kind(), HitObjectKind::Spinner);
        assert_eq!(object(0, 128).kind(), HitObjectKind::Hold);
        assert_eq!(object(0, 4).kind(), HitObjectKind::Unknown);
    }

    #[test]
    fn modifier_bits() {
        let o = object(0, 1 | 4 | (3 << 4));
        assert!(o.new_combo());
        assert_eq!(o.combo_offset(), 3);
        assert!(!object(0, 1).new_combo());
    }

    #[test]
    fn inherited_point_has_velocity_but_no_bpm() {
        let mut tp = TimingPoint::new(0, -50.0);
        tp.is_uninherited = false;
        assert_eq!(tp.bpm(), None);
        assert_eq!(tp.slider_velocity(), Some(2.0));
    }

    #[test]
    fn effects_flags() {
        let mut tp = TimingPoint::new(0, 500.0);
        tp.effects = 9;
        assert!(tp.is_kiai());
        assert!(tp.omits_first_barline());
    }

    #[test]
    fn derived_fields_skip_empty_charts() {
        let mut chart = ChartRecord::default();
        chart.timing_points.push(TimingPoint::new(0, 500.0));
        chart.compute_derived();
        assert_eq!(chart.total_length_ms, 0);
        assert_eq!(chart.bpm, 0.0);
    }

    #[test]
    fn preview_time_extends_total_length() {
        let mut chart = ChartRecord {
            preview_time_ms: 10_000,
            hit_objects: vec![object(1_000, 1), object(5_000, 1)],
            ..Default::default()
        };
        chart.compute_derived();
        assert_eq!(chart.hit_length_ms, 4_000);
        assert_eq!(chart.total_length_ms, 40_000);
    }

    #[test]
    fn display_fallbacks() {
        let chart = ChartRecord {
            title_unicode: "ユニコード".to_string(),
            artist: "Artist".to_string(),
            artist_unicode: "アーティスト".to_string(),
            ..Default::default()
        };
        assert_eq!(chart.display_title(), "ユニコード");
        assert_eq!(chart.display_artist(), "Artist");
    }
}
