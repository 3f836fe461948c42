use std::collections::BTreeMap;

use fourkey_schema::{
    ChartFormat, DifficultyValue, SvSegment, SvTable, TimingPoint, CIRCLE_FLAG, LONG_NOTE_FLAG, SLIDER_FLAG,
};
use serde::Deserialize;

use crate::error::{ParseError, Warnings};
use crate::raw::{Precomputed, RawChart, RawKeyGroup, RawObject};
use crate::velocity::{MAX_SV, MIN_SV};

/// Length given to long notes that omit their end time.
const MISSING_LN_LENGTH_MS: i64 = 100;

/// Tolerance for shipped segment boundaries and areas.
const TABLE_EPSILON: f64 = 1e-3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonChart {
    #[serde(default)]
    metadata: JsonMetadata,
    #[serde(default)]
    general: JsonGeneral,
    #[serde(default)]
    difficulty: JsonDifficulty,
    timing: Option<JsonTiming>,
    objects: Option<JsonObjects>,
    calculated: Option<JsonCalculated>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonMetadata {
    title: Option<String>,
    title_unicode: Option<String>,
    artist: Option<String>,
    artist_unicode: Option<String>,
    creator: Option<String>,
    version: Option<String>,
    source: Option<String>,
    tags: Option<Vec<String>>,
    beatmap_id: Option<i64>,
    beatmap_set_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonGeneral {
    audio_filename: Option<String>,
    audio_lead_in: Option<f64>,
    preview_time: Option<f64>,
    countdown: Option<f64>,
    sample_set: Option<String>,
    stack_leniency: Option<f64>,
    mode: Option<f64>,
    letterbox_in_breaks: Option<bool>,
    use_skin_sprites: Option<bool>,
    overlay_position: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonDifficulty {
    hp_drain_rate: Option<f64>,
    circle_size: Option<f64>,
    overall_difficulty: Option<f64>,
    approach_rate: Option<f64>,
    slider_multiplier: Option<f64>,
    slider_tick_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTiming {
    #[serde(rename = "baseSV")]
    base_sv: Option<f64>,
    #[serde(default)]
    points: Vec<JsonTimingPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTimingPoint {
    time: f64,
    beat_length: f64,
    meter: Option<u32>,
    #[serde(default)]
    uninherited: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonObjects {
    key_count: Option<u8>,
    hit_objects: Option<Vec<JsonHitObject>>,
    key_groups: Option<Vec<JsonKeyGroup>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonHitObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    time: Option<f64>,
    column: Option<u8>,
    x: Option<f64>,
    start_time: Option<f64>,
    end_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct JsonKeyGroup {
    id: u32,
    #[serde(default)]
    objects: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonCalculated {
    sv_segments: Option<Vec<SvSegment>>,
    sv_cum_areas: Option<Vec<f64>>,
    combined_segments: Option<Vec<SvSegment>>,
    combined_cum_areas: Option<Vec<f64>>,
    measures: Option<Vec<f64>>,
}

pub(crate) fn parse_json(src: &str, warnings: &mut Warnings) -> Result<RawChart, ParseError> {
    let doc: JsonChart = serde_json::from_str(src).map_err(|e| {
        ParseError::new("E1101", format!("invalid JSON chart: {e}"), e.line())
    })?;

    let Some(hit_objects) = doc.objects.as_ref().and_then(|o| o.hit_objects.as_ref()) else {
        return Err(ParseError::new("E1102", "missing required field objects.hitObjects", 0)
            .with_section("objects"));
    };

    let mut chart = RawChart::new(ChartFormat::Json);
    chart.metadata = convert_metadata(&doc.metadata);
    chart.general = convert_general(&doc.general);
    chart.difficulty = convert_difficulty(&doc.difficulty);

    if let Some(timing) = &doc.timing {
        chart.base_sv = timing.base_sv;
        chart.timing_points = timing
            .points
            .iter()
            .map(|p| TimingPoint {
                time: p.time,
                beat_length: p.beat_length,
                meter: p.meter.filter(|m| *m > 0).unwrap_or(4),
                uninherited: p.uninherited,
            })
            .collect();
    }

    for (source_index, obj) in hit_objects.iter().enumerate() {
        match convert_hit_object(obj, source_index, warnings) {
            Some(object) => chart.objects.push(object),
            None => warnings.push(
                "W2002",
                format!("hit object obj_{source_index} has no time, skipped"),
                None,
            ),
        }
    }

    if let Some(objects) = &doc.objects {
        chart.key_count = objects.key_count.filter(|k| *k > 0);
        chart.key_groups = objects.key_groups.as_ref().filter(|g| !g.is_empty()).map(|groups| {
            groups
                .iter()
                .map(|g| RawKeyGroup {
                    id: g.id,
                    objects: g.objects.clone(),
                })
                .collect()
        });
    }

    if let Some(calculated) = doc.calculated {
        chart.precomputed = Precomputed {
            sv: precomputed_table(calculated.sv_segments, calculated.sv_cum_areas, "sv", warnings),
            combined: precomputed_table(
                calculated.combined_segments,
                calculated.combined_cum_areas,
                "combined",
                warnings,
            ),
            measures: calculated.measures,
        };
    }

    Ok(chart)
}

fn convert_hit_object(obj: &JsonHitObject, source_index: usize, warnings: &mut Warnings) -> Option<RawObject> {
    let kind = obj.kind.as_deref().unwrap_or("circle");
    let is_long_note = kind == "longNote";
    let object_type = match kind {
        "longNote" => LONG_NOTE_FLAG,
        "slider" => SLIDER_FLAG,
        _ => CIRCLE_FLAG,
    };

    let head = if is_long_note {
        obj.start_time.or(obj.time)
    } else {
        obj.time
    };
    let time = to_ms(head?)?;

    let end_time = if is_long_note {
        match obj.end_time.and_then(to_ms).filter(|end| *end >= time) {
            Some(end) => end,
            None => {
                warnings.push(
                    "W2003",
                    format!("long note obj_{source_index} missing end time, using start + {MISSING_LN_LENGTH_MS}ms"),
                    None,
                );
                time + MISSING_LN_LENGTH_MS
            }
        }
    } else {
        time
    };

    Some(RawObject {
        x: obj.x.and_then(to_ms).map_or(0, |x| x as i32),
        time,
        object_type,
        is_long_note,
        end_time,
        column: obj.column,
        source_index,
    })
}

fn to_ms(v: f64) -> Option<i64> {
    v.is_finite().then(|| v.round() as i64)
}

fn precomputed_table(
    segments: Option<Vec<SvSegment>>,
    cum_areas: Option<Vec<f64>>,
    name: &str,
    warnings: &mut Warnings,
) -> Option<SvTable> {
    let (segments, cum_areas) = (segments?, cum_areas?);
    if table_is_consistent(&segments, &cum_areas) {
        Some(SvTable { segments, cum_areas })
    } else {
        warnings.push(
            "W3002",
            format!("precomputed {name} table is inconsistent, rebuilding from timing points"),
            None,
        );
        None
    }
}

/// Segments must be contiguous with one open tail, multipliers within the
/// clamp bounds, and each area must be the integral up to its segment.
fn table_is_consistent(segments: &[SvSegment], cum_areas: &[f64]) -> bool {
    let Some(last) = segments.last() else {
        return false;
    };
    if segments.len() != cum_areas.len() || last.end.is_some() {
        return false;
    }
    if !segments
        .iter()
        .all(|s| s.start.is_finite() && s.sv.is_finite() && (MIN_SV..=MAX_SV).contains(&s.sv))
    {
        return false;
    }
    if !cum_areas.iter().all(|a| a.is_finite()) {
        return false;
    }
    segments.windows(2).zip(cum_areas.windows(2)).all(|(pair, areas)| {
        let (seg, next) = (&pair[0], &pair[1]);
        let Some(end) = seg.end else {
            return false;
        };
        let expected = areas[0] + seg.sv * (end - seg.start);
        end > seg.start
            && (next.start - end).abs() <= TABLE_EPSILON
            && (areas[1] - expected).abs() <= TABLE_EPSILON * expected.abs().max(1.0)
    })
}

fn convert_metadata(meta: &JsonMetadata) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            out.insert(key.to_string(), v);
        }
    };
    put("Title", meta.title.clone());
    put("TitleUnicode", meta.title_unicode.clone());
    put("Artist", meta.artist.clone());
    put("ArtistUnicode", meta.artist_unicode.clone());
    put("Creator", meta.creator.clone());
    put("Version", meta.version.clone());
    put("Source", meta.source.clone());
    put("Tags", meta.tags.as_ref().map(|tags| tags.join(" ")));
    put("BeatmapID", meta.beatmap_id.map(|id| id.to_string()));
    put("BeatmapSetID", meta.beatmap_set_id.map(|id| id.to_string()));
    out
}

fn convert_general(general: &JsonGeneral) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value {
            out.insert(key.to_string(), v);
        }
    };
    let flag = |b: bool| String::from(if b { "1" } else { "0" });
    put("AudioFilename", general.audio_filename.clone());
    put("AudioLeadIn", general.audio_lead_in.map(|v| v.to_string()));
    put("PreviewTime", general.preview_time.map(|v| v.to_string()));
    put("Countdown", general.countdown.map(|v| v.to_string()));
    put("SampleSet", general.sample_set.clone());
    put("StackLeniency", general.stack_leniency.map(|v| v.to_string()));
    put("Mode", general.mode.map(|v| v.to_string()));
    put("LetterboxInBreaks", general.letterbox_in_breaks.map(flag));
    put("UseSkinSprites", general.use_skin_sprites.map(flag));
    put("OverlayPosition", general.overlay_position.clone());
    out
}

fn convert_difficulty(difficulty: &JsonDifficulty) -> BTreeMap<String, DifficultyValue> {
    [
        ("HPDrainRate", difficulty.hp_drain_rate),
        ("CircleSize", difficulty.circle_size),
        ("OverallDifficulty", difficulty.overall_difficulty),
        ("ApproachRate", difficulty.approach_rate),
        ("SliderMultiplier", difficulty.slider_multiplier),
        ("SliderTickRate", difficulty.slider_tick_rate),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key.to_string(), DifficultyValue::Number(v))))
    .collect()
}
