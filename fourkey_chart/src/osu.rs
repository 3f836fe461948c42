use std::collections::BTreeMap;

use fourkey_schema::{ChartFormat, DifficultyValue, TimingPoint, LONG_NOTE_FLAG};

use crate::error::{ParseError, Warnings};
use crate::raw::{RawChart, RawObject};

const MANIA_MODE: f64 = 3.0;
const MAX_DECLARED_KEYS: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    General,
    Metadata,
    Difficulty,
    TimingPoints,
    HitObjects,
    Other,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name.trim() {
            "General" => Self::General,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Other,
        }
    }
}

pub(crate) fn parse_osu(src: &str, warnings: &mut Warnings) -> Result<RawChart, ParseError> {
    let mut chart = RawChart::new(ChartFormat::OsuText);
    let mut section = Section::None;
    let mut saw_hit_objects = false;

    for (i, raw_line) in src.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw_line.trim().trim_start_matches('\u{feff}');
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            section = Section::from_header(&trimmed[1..trimmed.len() - 1]);
            saw_hit_objects |= section == Section::HitObjects;
            continue;
        }

        match section {
            Section::General => parse_key_value(trimmed, &mut chart.general),
            Section::Metadata => parse_key_value(trimmed, &mut chart.metadata),
            Section::Difficulty => parse_difficulty(trimmed, &mut chart.difficulty),
            Section::TimingPoints => match parse_timing_point(trimmed) {
                Some(point) => chart.timing_points.push(point),
                None => warnings.push(
                    "W2001",
                    format!("malformed timing point skipped (context={trimmed})"),
                    Some(line_no),
                ),
            },
            Section::HitObjects => {
                let source_index = chart.objects.len();
                match parse_hit_object(trimmed, source_index, line_no, warnings) {
                    Some(object) => chart.objects.push(object),
                    None => warnings.push(
                        "W2002",
                        format!("malformed hit object skipped (context={trimmed})"),
                        Some(line_no),
                    ),
                }
            }
            Section::None | Section::Other => {}
        }
    }

    if !saw_hit_objects {
        return Err(ParseError::new("E3001", "missing [HitObjects] section", 0).with_section("HitObjects"));
    }

    chart.key_count = declared_key_count(&chart.general, &chart.difficulty);
    Ok(chart)
}

/// Mania charts declare their lane count through `CircleSize`.
fn declared_key_count(
    general: &BTreeMap<String, String>,
    difficulty: &BTreeMap<String, DifficultyValue>,
) -> Option<u8> {
    let mode = general.get("Mode").and_then(|m| m.parse::<f64>().ok())?;
    if mode != MANIA_MODE {
        return None;
    }
    let keys = difficulty.get("CircleSize").and_then(DifficultyValue::as_f64)?;
    if keys.fract() == 0.0 && (1.0..=MAX_DECLARED_KEYS).contains(&keys) {
        Some(keys as u8)
    } else {
        None
    }
}

fn parse_key_value(line: &str, target: &mut BTreeMap<String, String>) {
    let Some((key, value)) = line.split_once(':') else {
        return;
    };
    let key = key.trim();
    let value = value.trim();
    if !key.is_empty() && !value.is_empty() {
        target.insert(key.to_string(), value.to_string());
    }
}

fn parse_difficulty(line: &str, target: &mut BTreeMap<String, DifficultyValue>) {
    let Some((key, value)) = line.split_once(':') else {
        return;
    };
    let key = key.trim();
    if key.is_empty() {
        return;
    }
    let value = value.trim();
    let parsed = match value.parse::<f64>() {
        Ok(v) if v.is_finite() => DifficultyValue::Number(v),
        _ => DifficultyValue::Text(value.to_string()),
    };
    target.insert(key.to_string(), parsed);
}

fn parse_timing_point(line: &str) -> Option<TimingPoint> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return None;
    }
    let time: f64 = parts[0].parse().ok().filter(|t: &f64| t.is_finite())?;
    let beat_length: f64 = parts[1].parse().ok().filter(|b: &f64| !b.is_nan())?;
    let meter = parts
        .get(2)
        .and_then(|m| parse_int(m))
        .filter(|m| *m > 0)
        .map_or(4, |m| m as u32);
    // Short rows predate the uninherited column and are always tempo points.
    let uninherited = parts.len() < 7 || parts[6] == "1";

    Some(TimingPoint {
        time,
        beat_length,
        meter,
        uninherited,
    })
}

fn parse_hit_object(
    line: &str,
    source_index: usize,
    line_no: usize,
    warnings: &mut Warnings,
) -> Option<RawObject> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 4 {
        return None;
    }
    let x = i32::try_from(parse_int(parts[0])?).ok()?;
    let time = parse_int(parts[2])?;
    let object_type = u32::try_from(parse_int(parts[3])?).ok()?;
    let is_long_note = object_type & LONG_NOTE_FLAG != 0;

    let mut end_time = time;
    if is_long_note {
        let declared = parts
            .get(5)
            .and_then(|extras| extras.split(':').next())
            .and_then(parse_int);
        match declared {
            Some(end) if end >= time => end_time = end,
            _ => warnings.push(
                "W2003",
                format!("long note has no usable end time, treating as zero length (context={line})"),
                Some(line_no),
            ),
        }
    }

    Some(RawObject {
        x,
        time,
        object_type,
        is_long_note,
        end_time,
        column: None,
        source_index,
    })
}

/// Integer field; fractional values are truncated.
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })
}
