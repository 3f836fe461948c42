#![allow(dead_code)]

use fourkey_schema::{Beatmap, ChartFormat, HitObject, SvTable, LONG_NOTE_FLAG};

/// `(column, time, Some(end) for long notes)`, in hit-object order.
pub fn beatmap(notes: &[(u8, i64, Option<i64>)]) -> Beatmap {
    let hit_objects = notes
        .iter()
        .map(|&(column, time, end)| HitObject {
            x: 64 + 128 * i32::from(column),
            time,
            object_type: if end.is_some() { LONG_NOTE_FLAG } else { 1 },
            is_long_note: end.is_some(),
            end_time: end.unwrap_or(time),
            column,
            key_group: 0,
        })
        .collect();

    Beatmap {
        format: ChartFormat::OsuText,
        metadata: Default::default(),
        general: Default::default(),
        difficulty: Default::default(),
        timing_points: Vec::new(),
        raw_timing_points: Vec::new(),
        hit_objects,
        key_count: 4,
        sv: SvTable::default(),
        combined: SvTable::default(),
        measures: Vec::new(),
    }
}
