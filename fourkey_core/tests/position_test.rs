use std::sync::Arc;

use fourkey_core::{GameplayConfig, PlaySession, PositionMapper};

const CHART: &str = "[General]
Mode: 3

[Difficulty]
CircleSize:4

[TimingPoints]
0,500,4,1,0,100,1,0

[HitObjects]
64,192,1000,1,0,0:0:0:0:
";

#[test]
fn test_default_speed_places_note_800px_away() {
    let map = fourkey_chart::parse(CHART).unwrap();
    let config = GameplayConfig {
        scroll_speed: 40.0,
        ..GameplayConfig::default()
    };
    let mapper = PositionMapper::from_config(&config);
    assert_eq!(mapper.px_per_sec, 1600.0);

    let config = GameplayConfig::default();
    let mapper = PositionMapper::from_config(&config);
    assert_eq!(mapper.px_per_sec, 800.0);
    assert_eq!(mapper.note_offset(&map, 1000.0, 0.0), -800.0);
    assert_eq!(mapper.note_y(&map, 900.0, 1000.0, 0.0), 100.0);
}

#[test]
fn test_sv_section_scrolls_faster() {
    let chart = CHART.replace(
        "0,500,4,1,0,100,1,0\n",
        "0,500,4,1,0,100,1,0\n1000,-50,4,1,0,100,0,0\n",
    );
    let map = fourkey_chart::parse(&chart).unwrap();
    let mut config = GameplayConfig::default();
    let mapper = PositionMapper::from_config(&config);
    // 1000ms at 1x plus 500ms at 2x
    assert_eq!(mapper.note_offset(&map, 1500.0, 0.0), -(800.0 / 1000.0) * 2000.0);

    config.show_sv = false;
    let linear = PositionMapper::from_config(&config);
    assert_eq!(linear.note_offset(&map, 1500.0, 0.0), -(800.0 / 1000.0) * 1500.0);
}

#[test]
fn test_bpm_scaling_uses_combined_table() {
    let chart = CHART.replace(
        "0,500,4,1,0,100,1,0\n",
        "0,500,4,1,0,100,1,0\n1000,250,4,1,0,100,1,0\n",
    );
    let map = fourkey_chart::parse(&chart).unwrap();
    let config = GameplayConfig {
        scroll_speed: 25.0,
        bpm_scaling: true,
        ..GameplayConfig::default()
    };
    let mapper = PositionMapper::from_config(&config);
    assert_eq!(mapper.note_offset(&map, 1500.0, 0.0), -2000.0);

    let plain = PositionMapper { bpm_scaling: false, ..mapper };
    assert_eq!(plain.note_offset(&map, 1500.0, 0.0), -1500.0);
}

#[test]
fn test_session_offsets_need_a_chart() {
    let mut session = PlaySession::new(GameplayConfig::default());
    assert_eq!(session.note_offset(1000.0, 0.0), None);

    session.select_chart(Arc::new(fourkey_chart::parse(CHART).unwrap()));
    assert_eq!(session.note_offset(1000.0, 0.0), Some(-800.0));
}
