use fourkey_schema::{Millis, SvSegment, SvTable, TimingPoint};

use crate::error::Warnings;

pub const MIN_SV: f64 = 0.01;
pub const MAX_SV: f64 = 10.0;

const DEFAULT_BPM: f64 = 120.0;
const MERGE_EPSILON: f64 = 1e-6;

/// Clamps a multiplier into `[MIN_SV, MAX_SV]`; non-finite values become 1.0.
pub fn clamp_sv(sv: f64) -> f64 {
    if sv.is_finite() {
        sv.clamp(MIN_SV, MAX_SV)
    } else {
        1.0
    }
}

/// Builds the SV-only table from raw (unaligned) timing points.
pub fn build_sv_table(raw: &[TimingPoint], base_sv: f64) -> SvTable {
    build_sv_table_into(raw, base_sv, &mut Warnings::default())
}

/// Builds the table whose multiplier also scales with tempo relative to the
/// first tempo point.
pub fn build_combined_table(raw: &[TimingPoint], base_sv: f64) -> SvTable {
    build_combined_table_into(raw, base_sv, &mut Warnings::default())
}

pub(crate) fn build_sv_table_into(raw: &[TimingPoint], base_sv: f64, warnings: &mut Warnings) -> SvTable {
    let base = sanitize(base_sv, 0.0, warnings);
    integrate(raw, warnings, |_, green, t, warnings| match green {
        Some(point) => {
            let raw_sv = point.sv_multiplier().unwrap_or(1.0);
            sanitize(base * raw_sv, t, warnings)
        }
        None => base,
    })
}

pub(crate) fn build_combined_table_into(
    raw: &[TimingPoint],
    base_sv: f64,
    warnings: &mut Warnings,
) -> SvTable {
    let base = sanitize(base_sv, 0.0, warnings);
    let base_bpm = sorted_points(raw)
        .iter()
        .find_map(|p| p.bpm())
        .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
        .unwrap_or(DEFAULT_BPM);

    integrate(raw, warnings, |red, green, t, warnings| {
        let sv = match green {
            Some(point) => sanitize(base * point.sv_multiplier().unwrap_or(1.0), t, warnings),
            None => base,
        };
        let bpm = red.and_then(TimingPoint::bpm).unwrap_or(base_bpm);
        sanitize(sv * (bpm / base_bpm), t, warnings)
    })
}

fn sanitize(multiplier: f64, t: Millis, warnings: &mut Warnings) -> f64 {
    let clamped = clamp_sv(multiplier);
    if !multiplier.is_finite() {
        warnings.push("W3001", format!("non-finite scroll multiplier at {t}ms, using 1.0"), None);
    } else if clamped != multiplier {
        warnings.push(
            "W3001",
            format!("scroll multiplier {multiplier} at {t}ms clamped to {clamped}"),
            None,
        );
    }
    clamped
}

fn sorted_points(raw: &[TimingPoint]) -> Vec<TimingPoint> {
    let mut points: Vec<TimingPoint> = raw.iter().copied().filter(|p| p.time.is_finite()).collect();
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
    points
}

fn integrate<F>(raw: &[TimingPoint], warnings: &mut Warnings, mut multiplier_at: F) -> SvTable
where
    F: FnMut(Option<&TimingPoint>, Option<&TimingPoint>, Millis, &mut Warnings) -> f64,
{
    let points = sorted_points(raw);

    // Boundaries: 0 plus every distinct positive change time.
    let mut times: Vec<Millis> = points.iter().map(|p| p.time).filter(|t| *t > 0.0).collect();
    times.push(0.0);
    times.sort_by(f64::total_cmp);
    times.dedup();

    let mut segments: Vec<SvSegment> = Vec::with_capacity(times.len());
    let mut next_point = 0;
    let mut red: Option<&TimingPoint> = None;
    let mut green: Option<&TimingPoint> = None;

    for (i, &start) in times.iter().enumerate() {
        while next_point < points.len() && points[next_point].time <= start {
            let point = &points[next_point];
            if point.uninherited {
                red = Some(point);
            } else {
                green = Some(point);
            }
            next_point += 1;
        }
        let sv = multiplier_at(red, green, start, warnings);
        let end = times.get(i + 1).copied();

        match segments.last_mut() {
            Some(last) if (last.sv - sv).abs() < MERGE_EPSILON && last.end == Some(start) => {
                last.end = end;
            }
            _ => segments.push(SvSegment { start, end, sv }),
        }
    }

    let mut cum_areas = Vec::with_capacity(segments.len());
    let mut cum = 0.0;
    for seg in &segments {
        cum_areas.push(cum);
        let Some(duration) = seg.duration() else {
            continue;
        };
        let increment = seg.sv * duration;
        if increment.is_finite() {
            cum += increment;
        } else {
            warnings.push(
                "W3002",
                format!("non-finite area increment for segment starting at {}ms skipped", seg.start),
                None,
            );
        }
    }

    SvTable { segments, cum_areas }
}
