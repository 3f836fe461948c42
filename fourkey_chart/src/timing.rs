use std::collections::HashSet;

use fourkey_schema::{Millis, TimingPoint};

use crate::error::Warnings;

const DEFAULT_BEAT_LENGTH: f64 = 500.0;
pub(crate) const MEASURE_TAIL_MS: f64 = 10_000.0;
const MAX_TICKS_PER_SEGMENT: usize = 100_000;

/// Display-only alignment: one point per time, sorted, with every green
/// point's beat length rewritten to the governing tempo's.
pub(crate) fn align_timing_points(points: &[TimingPoint]) -> Vec<TimingPoint> {
    let mut seen = HashSet::new();
    let mut unique: Vec<TimingPoint> = points
        .iter()
        .filter(|p| p.time.is_finite())
        // +0.0 folds -0.0 into the same key
        .filter(|p| seen.insert((p.time + 0.0).to_bits()))
        .copied()
        .collect();
    unique.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut current_beat_length = DEFAULT_BEAT_LENGTH;
    unique
        .into_iter()
        .map(|point| {
            if point.uninherited {
                current_beat_length = point.beat_length;
                point
            } else {
                TimingPoint {
                    beat_length: current_beat_length,
                    ..point
                }
            }
        })
        .collect()
}

/// Measure-line tick times. Only tempo points delimit measures; the last
/// one runs until `last_object_end + MEASURE_TAIL_MS`.
pub(crate) fn compute_measures(
    aligned: &[TimingPoint],
    last_object_end: i64,
    warnings: &mut Warnings,
) -> Vec<Millis> {
    let reds: Vec<&TimingPoint> = aligned.iter().filter(|p| p.uninherited).collect();
    let track_end = last_object_end as f64 + MEASURE_TAIL_MS;

    let mut ticks = Vec::new();
    for (i, red) in reds.iter().enumerate() {
        let segment_end = reds.get(i + 1).map_or(track_end, |next| next.time);
        let measure_len = red.beat_length.abs() * red.meter as f64;
        if !(measure_len.is_finite() && measure_len > 0.0) {
            warnings.push(
                "W3003",
                format!("degenerate measure length at {}ms skipped", red.time),
                None,
            );
            continue;
        }

        let mut k = 0usize;
        loop {
            let t = red.time + k as f64 * measure_len;
            if t >= segment_end {
                break;
            }
            if k >= MAX_TICKS_PER_SEGMENT {
                warnings.push(
                    "W3004",
                    format!("measure tick limit reached in segment starting at {}ms", red.time),
                    None,
                );
                break;
            }
            ticks.push(round_ms(t));
            k += 1;
        }
    }

    ticks.sort_by(f64::total_cmp);
    ticks.dedup();
    ticks
}

fn round_ms(t: Millis) -> Millis {
    (t * 1000.0).round() / 1000.0
}
