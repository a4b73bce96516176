use osu_parser::{parse, parse_with_diagnostics, BreakPeriod, HitObjectKind, Rgb};

const NORMAL: &str = include_str!("fixtures/normal.osu");

#[test]
fn fixture_parses_cleanly() {
    let (chart, diagnostics) = parse_with_diagnostics(NORMAL);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);

    assert_eq!(chart.osu_file_format, 14);
    assert_eq!(chart.audio_filename, "audio.mp3");
    assert_eq!(chart.preview_time_ms, 45000);
    assert_eq!(chart.countdown, 0);
    assert!(chart.widescreen_storyboard);
    assert_eq!(chart.bookmarks, vec![1000, 16000]);
    assert_eq!(chart.grid_size, 32);

    assert_eq!(chart.title, "Sample Song");
    assert_eq!(chart.title_unicode, "サンプル");
    assert_eq!(chart.creator, "Mapper");
    assert_eq!(chart.version, "Normal");
    assert_eq!(chart.source, "");
    assert_eq!(chart.beatmap_id, 1001);
    assert_eq!(chart.beatmapset_id, 500);

    assert_eq!(chart.circle_size, 3.5);
    assert_eq!(chart.slider_multiplier, 1.6);

    assert_eq!(chart.background_filename, "background.jpg");
    assert_eq!(chart.break_periods, vec![BreakPeriod { start_ms: 8000, end_ms: 12000 }]);
    assert_eq!(chart.timing_points.len(), 3);
    assert_eq!(
        chart.combo_colours,
        vec![Rgb { r: 255, g: 192, b: 0 }, Rgb { r: 0, g: 202, b: 0 }]
    );
}

#[test]
fn fixture_derived_metrics() {
    let chart = parse(NORMAL);

    let kinds: Vec<_> = chart.hit_objects.iter().map(|o| o.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            HitObjectKind::Circle,
            HitObjectKind::Circle,
            HitObjectKind::Slider,
            HitObjectKind::Spinner,
            HitObjectKind::Hold,
        ]
    );

    assert_eq!(chart.hit_length_ms, 12000);
    // preview time + 30s is later than the last object + 2s
    assert_eq!(chart.total_length_ms, 75000);
    assert_eq!(chart.max_combo, 4);
    assert_eq!(chart.bpm, 120.0);
}

#[test]
fn timing_points_keep_file_order() {
    let chart = parse(NORMAL);
    let offsets: Vec<_> = chart.timing_points.iter().map(|tp| tp.offset_ms).collect();
    assert_eq!(offsets, vec![1000, 5000, 9000]);
    assert!(chart.timing_points[1].is_kiai());
    assert_eq!(chart.timing_points[2].slider_velocity(), Some(2.0));
}

#[test]
fn single_object_lengths() {
    let chart = parse("osu file format v14\n[HitObjects]\n256,192,7340,1,0,0:0:0:0:\n");
    assert_eq!(chart.hit_length_ms, 0);
    assert_eq!(chart.total_length_ms, 9340);
}

#[test]
fn bpm_uses_first_positive_uninherited_point() {
    let chart = parse(
        "[TimingPoints]\n0,-100,4,0,0,100,0,0\n100,0,4,0,0,100,1,0\n200,500\n300,250\n\
         [HitObjects]\n0,0,300,1,0\n",
    );
    assert_eq!(chart.bpm, 120.0);
}

#[test]
fn bpm_stays_zero_without_tempo() {
    let chart = parse("[TimingPoints]\n0,-100,4,0,0,100,0,0\n[HitObjects]\n0,0,300,1,0\n");
    assert_eq!(chart.bpm, 0.0);
}

#[test]
fn combo_ignores_non_combo_bits() {
    let chart = parse("[HitObjects]\n0,0,100,4,0\n0,0,200,1,0\n0,0,300,2,0\n0,0,400,8,0\n");
    assert_eq!(chart.hit_objects.len(), 4);
    assert_eq!(chart.max_combo, 3);
}

#[test]
fn reparsing_is_deterministic() {
    assert_eq!(parse(NORMAL), parse(NORMAL));
}

#[test]
fn garbage_does_not_panic() {
    let (chart, diagnostics) =
        parse_with_diagnostics("\0\0[[[]]]\n:::\n[HitObjects]\n,,,,,,\n[General\nMode:");
    assert!(chart.hit_objects.is_empty());
    assert!(!diagnostics.is_empty());
}

#[test]
fn serializes_to_json() {
    let chart = parse(NORMAL);
    let json = serde_json::to_value(&chart).unwrap();
    assert_eq!(json["title"], "Sample Song");
    assert_eq!(json["hit_objects"][0]["type"], 5);
}
