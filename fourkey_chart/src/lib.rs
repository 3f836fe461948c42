use std::{fs, path::Path};

use fourkey_schema::{Millis, SvTable};

mod error;
mod format;
mod json;
mod lanes;
mod osu;
mod raw;
mod timing;
mod velocity;


pub use error::{ParseError, ParseErrorKind, ParseWarning};
pub use format::{detect_format, format_from_extension};
pub use fourkey_schema::{Beatmap, ChartFormat};
pub use lanes::{column_for_x, lane_center_x};
pub use velocity::{build_combined_table, build_sv_table, clamp_sv, MAX_SV, MIN_SV};

use error::Warnings;
use raw::RawChart;

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Skip detection and run this parser.
    pub format: Option<ChartFormat>,
    /// Multiplier applied to every SV point; a JSON chart's `timing.baseSV` overrides it.
    pub base_sv: f64,
    pub key_group_subdivisions: u32,
    pub key_group_size: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            format: None,
            base_sv: 1.0,
            key_group_subdivisions: 16,
            key_group_size: 2,
        }
    }
}

/// A loaded chart plus everything that was recovered from along the way.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub beatmap: Beatmap,
    pub warnings: Vec<ParseWarning>,
}

pub fn parse(src: &str) -> Result<Beatmap, ParseError> {
    parse_with_options(src, &ParseOptions::default()).map(|report| report.beatmap)
}

pub fn parse_with_options(src: &str, options: &ParseOptions) -> Result<ParseReport, ParseError> {
    if src.trim().trim_start_matches('\u{feff}').is_empty() {
        return Err(ParseError::new("E1001", "chart is empty", 0));
    }

    let mut warnings = Warnings::default();
    let format = format::resolve_format(src, options.format, &mut warnings);
    let raw = match format {
        ChartFormat::OsuText => osu::parse_osu(src, &mut warnings)?,
        ChartFormat::Json => json::parse_json(src, &mut warnings)?,
    };

    if raw.objects.is_empty() {
        return Err(ParseError::new("E3002", "chart contains no playable hit objects", 0));
    }

    let beatmap = normalize(raw, options, &mut warnings);
    log::debug!(
        "parsed {:?} chart: {} objects, {} sv segments, {} measures",
        beatmap.format,
        beatmap.hit_objects.len(),
        beatmap.sv.segments.len(),
        beatmap.measures.len()
    );

    Ok(ParseReport {
        beatmap,
        warnings: warnings.into_vec(),
    })
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Beatmap, ParseError> {
    parse_file_with_options(path, &ParseOptions::default()).map(|report| report.beatmap)
}

/// Reads and parses a chart file. When the content does not identify its own
/// format the file extension decides.
pub fn parse_file_with_options(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParseReport, ParseError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        ParseError::new("E2001", format!("failed to read chart: {e}"), 0).with_file(path.display().to_string())
    })?;

    let mut options = options.clone();
    if options.format.is_none() && detect_format(&src).is_none() {
        options.format = format_from_extension(path);
    }

    parse_with_options(&src, &options).map_err(|e| e.with_file(path.display().to_string()))
}

fn normalize(raw: RawChart, options: &ParseOptions, warnings: &mut Warnings) -> Beatmap {
    let RawChart {
        format,
        metadata,
        general,
        difficulty,
        timing_points,
        objects,
        key_count,
        base_sv,
        key_groups,
        precomputed,
    } = raw;

    let aligned = timing::align_timing_points(&timing_points);
    let last_end = objects
        .iter()
        .map(|o| o.end_time.max(o.time))
        .max()
        .unwrap_or(0);
    let measures = match precomputed.measures {
        Some(measures) => clean_measures(measures),
        None => timing::compute_measures(&aligned, last_end, warnings),
    };

    let key_count = key_count.unwrap_or_else(|| lanes::detect_key_count(&objects));
    let mut placed = lanes::place_objects(&objects, key_count);
    lanes::sort_placed(&mut placed);
    match &key_groups {
        Some(groups) => lanes::apply_explicit_key_groups(&mut placed, groups),
        None => lanes::key_groups_by_sub_measure(
            &mut placed,
            &measures,
            options.key_group_subdivisions,
            options.key_group_size,
        ),
    }

    let base_sv = base_sv
        .filter(|sv| sv.is_finite() && *sv > 0.0)
        .unwrap_or(options.base_sv);
    let sv = table_or_build(precomputed.sv, || {
        velocity::build_sv_table_into(&timing_points, base_sv, warnings)
    });
    let combined = table_or_build(precomputed.combined, || {
        velocity::build_combined_table_into(&timing_points, base_sv, warnings)
    });

    Beatmap {
        format,
        metadata,
        general,
        difficulty,
        timing_points: aligned,
        raw_timing_points: timing_points,
        hit_objects: placed.into_iter().map(|p| p.object).collect(),
        key_count,
        sv,
        combined,
        measures,
    }
}

fn table_or_build(precomputed: Option<SvTable>, build: impl FnOnce() -> SvTable) -> SvTable {
    precomputed.unwrap_or_else(build)
}

fn clean_measures(mut measures: Vec<Millis>) -> Vec<Millis> {
    measures.retain(|m| m.is_finite());
    measures.sort_by(f64::total_cmp);
    measures.dedup();
    measures
}
