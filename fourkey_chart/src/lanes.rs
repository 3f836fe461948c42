use std::collections::{BTreeSet, HashMap};

use fourkey_schema::{HitObject, Millis, LANE_COUNT, PLAYFIELD_WIDTH};

use crate::raw::{RawKeyGroup, RawObject};

pub(crate) const KEY_GROUP_GAP_MS: i64 = 150;
const FALLBACK_MEASURE_MS: f64 = 2000.0;
const DETECTION_BUCKETS: i32 = 8;

/// A normalized object plus its position in the source file.
#[derive(Debug, Clone)]
pub(crate) struct Placed {
    pub(crate) object: HitObject,
    pub(crate) source_index: usize,
}

fn clamp_x(x: i32) -> i32 {
    x.clamp(0, PLAYFIELD_WIDTH - 1)
}

/// Lane index of `x` on a playfield split into `lanes` equal columns.
pub fn column_for_x(x: i32, lanes: u8) -> u8 {
    let lanes = i32::from(lanes.max(1));
    (clamp_x(x) * lanes / PLAYFIELD_WIDTH) as u8
}

/// Centre `x` of a lane in the normalized four-lane layout.
pub fn lane_center_x(column: u8) -> i32 {
    let lane_width = PLAYFIELD_WIDTH / LANE_COUNT as i32;
    lane_width * i32::from(column) + lane_width / 2
}

pub(crate) fn detect_key_count(objects: &[RawObject]) -> u8 {
    let buckets: BTreeSet<i32> = objects
        .iter()
        .map(|o| clamp_x(o.x) * DETECTION_BUCKETS / PLAYFIELD_WIDTH)
        .collect();
    buckets.len().max(1) as u8
}

fn remap_column(original: u8, original_count: u8) -> u8 {
    let target = (u32::from(original) * LANE_COUNT as u32 / u32::from(original_count.max(1))) as u8;
    target.min(LANE_COUNT as u8 - 1)
}

/// Assigns a four-lane column to every object, remapping charts authored
/// for another lane count and recentring their `x`.
pub(crate) fn place_objects(objects: &[RawObject], key_count: u8) -> Vec<Placed> {
    let key_count = key_count.max(1);
    objects
        .iter()
        .map(|raw| {
            let (x, column) = if usize::from(key_count) == LANE_COUNT {
                let column = raw
                    .column
                    .filter(|c| usize::from(*c) < LANE_COUNT)
                    .unwrap_or_else(|| column_for_x(raw.x, key_count));
                (raw.x, column)
            } else {
                let original = raw
                    .column
                    .filter(|c| *c < key_count)
                    .unwrap_or_else(|| column_for_x(raw.x, key_count));
                let column = remap_column(original, key_count);
                (lane_center_x(column), column)
            };
            Placed {
                object: HitObject {
                    x,
                    time: raw.time,
                    object_type: raw.object_type,
                    is_long_note: raw.is_long_note,
                    end_time: raw.end_time,
                    column,
                    key_group: 0,
                },
                source_index: raw.source_index,
            }
        })
        .collect()
}

pub(crate) fn sort_placed(placed: &mut [Placed]) {
    placed.sort_by(|a, b| {
        a.object
            .time
            .cmp(&b.object.time)
            .then(a.object.column.cmp(&b.object.column))
            .then(a.object.x.cmp(&b.object.x))
            .then(a.source_index.cmp(&b.source_index))
    });
}

/// Fallback grouping: a new group starts whenever the gap to the previous
/// object exceeds `KEY_GROUP_GAP_MS`. Expects time-sorted input.
pub(crate) fn key_groups_by_gap(placed: &mut [Placed]) {
    let mut group = 0;
    let mut last_time: Option<i64> = None;
    for p in placed.iter_mut() {
        if last_time.map_or(true, |last| p.object.time - last > KEY_GROUP_GAP_MS) {
            group += 1;
        }
        p.object.key_group = group;
        last_time = Some(p.object.time);
    }
}

/// Groups by position inside the measure: each measure is cut into
/// `subdivisions` slices and every `group_size` consecutive slices share a group.
pub(crate) fn key_groups_by_sub_measure(
    placed: &mut [Placed],
    measures: &[Millis],
    subdivisions: u32,
    group_size: u32,
) {
    if measures.len() < 2 {
        key_groups_by_gap(placed);
        return;
    }
    let subdivisions = subdivisions.max(1);
    let group_size = group_size.max(1);

    for p in placed.iter_mut() {
        let t = p.object.time as f64;
        let idx = measures.partition_point(|m| *m <= t).saturating_sub(1);
        let start = measures[idx];
        let end = measures
            .get(idx + 1)
            .copied()
            .unwrap_or(start + FALLBACK_MEASURE_MS);
        let duration = end - start;
        let position = (t - start).max(0.0);
        let sub = if duration > 0.0 {
            (((position / duration) * f64::from(subdivisions)).floor() as u32).min(subdivisions - 1)
        } else {
            0
        };
        let global = idx as u32 * subdivisions + sub;
        p.object.key_group = global / group_size;
    }
}

/// Applies explicit `obj_<index>` group membership; objects left unassigned
/// get fresh ids after the largest explicit one.
pub(crate) fn apply_explicit_key_groups(placed: &mut [Placed], groups: &[RawKeyGroup]) {
    let position_by_source: HashMap<usize, usize> = placed
        .iter()
        .enumerate()
        .map(|(pos, p)| (p.source_index, pos))
        .collect();

    let mut assigned = vec![false; placed.len()];
    for group in groups {
        for id in &group.objects {
            let Some(source_index) = id.strip_prefix("obj_").and_then(|n| n.parse::<usize>().ok()) else {
                continue;
            };
            if let Some(&pos) = position_by_source.get(&source_index) {
                placed[pos].object.key_group = group.id;
                assigned[pos] = true;
            }
        }
    }

    let mut next = groups.iter().map(|g| g.id).max().map_or(0, |max| max + 1);
    for (p, done) in placed.iter_mut().zip(assigned) {
        if !done {
            p.object.key_group = next;
            next += 1;
        }
    }
}
