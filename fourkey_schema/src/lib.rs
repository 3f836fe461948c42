use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds on the audio timeline.
pub type Millis = f64;

pub const LANE_COUNT: usize = 4;

/// Horizontal extent of the source playfield that `x` positions are laid out on.
pub const PLAYFIELD_WIDTH: i32 = 512;

pub const CIRCLE_FLAG: u32 = 1;
pub const SLIDER_FLAG: u32 = 2;
pub const LONG_NOTE_FLAG: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartFormat {
    /// Line-oriented sectioned text (`[TimingPoints]`, `[HitObjects]`, ...).
    OsuText,
    /// Structured JSON with `timing.points` and `objects.hitObjects`.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    pub time: Millis,
    pub beat_length: f64,
    pub meter: u32,
    pub uninherited: bool,
}

impl TimingPoint {
    /// BPM of a tempo ("red") point. `None` for scroll-velocity points.
    pub fn bpm(&self) -> Option<f64> {
        if self.uninherited {
            Some(60_000.0 / self.beat_length)
        } else {
            None
        }
    }

    /// Raw, unclamped SV multiplier encoded by a green point (`100 / |beatLength|`).
    pub fn sv_multiplier(&self) -> Option<f64> {
        if self.uninherited {
            None
        } else {
            Some(100.0 / self.beat_length.abs())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitObject {
    pub x: i32,
    pub time: i64,
    #[serde(rename = "type")]
    pub object_type: u32,
    pub is_long_note: bool,
    pub end_time: i64,
    pub column: u8,
    pub key_group: u32,
}

impl HitObject {
    pub fn duration(&self) -> i64 {
        self.end_time - self.time
    }

    /// Time at which the object stops occupying its lane.
    pub fn end(&self) -> i64 {
        if self.is_long_note {
            self.end_time
        } else {
            self.time
        }
    }
}

/// A maximal run of constant scroll multiplier. `end == None` marks the
/// unbounded tail segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvSegment {
    pub start: Millis,
    pub end: Option<Millis>,
    pub sv: f64,
}

impl SvSegment {
    pub fn duration(&self) -> Option<Millis> {
        self.end.map(|end| end - self.start)
    }

    pub fn contains(&self, t: Millis) -> bool {
        t >= self.start && self.end.map_or(true, |end| t < end)
    }
}

/// Piecewise-constant velocity segments plus the running integral at each
/// segment start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvTable {
    pub segments: Vec<SvSegment>,
    pub cum_areas: Vec<f64>,
}

impl SvTable {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Cumulative scroll distance (ms × multiplier) from 0 to `t`.
    ///
    /// Without segments this is the identity. Times before the first segment
    /// extend it linearly so the result stays non-decreasing in `t`.
    pub fn area_at(&self, t: Millis) -> f64 {
        if self.segments.is_empty() {
            return t;
        }
        let idx = self
            .segments
            .partition_point(|seg| seg.start <= t)
            .saturating_sub(1);
        let seg = &self.segments[idx];
        let base = self.cum_areas.get(idx).copied().unwrap_or(0.0);
        let upper = seg.end.unwrap_or(f64::INFINITY);
        let effective = if idx == 0 {
            t.min(upper)
        } else {
            t.max(seg.start).min(upper)
        };
        base + seg.sv * (effective - seg.start)
    }

    /// Multiplier in effect at `t` (1.0 without segments).
    pub fn multiplier_at(&self, t: Millis) -> f64 {
        if self.segments.is_empty() {
            return 1.0;
        }
        let idx = self
            .segments
            .partition_point(|seg| seg.start <= t)
            .saturating_sub(1);
        self.segments[idx].sv
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DifficultyValue {
    Number(f64),
    Text(String),
}

impl DifficultyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DifficultyValue::Number(v) => Some(*v),
            DifficultyValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub format: ChartFormat,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub general: BTreeMap<String, String>,
    #[serde(default)]
    pub difficulty: BTreeMap<String, DifficultyValue>,
    /// Display-aligned timing points (measure lines, nominal BPM).
    pub timing_points: Vec<TimingPoint>,
    /// Timing points as they appeared in the source; the only input to SV integration.
    pub raw_timing_points: Vec<TimingPoint>,
    pub hit_objects: Vec<HitObject>,
    /// Lane count the source was authored for; objects are always placed on four lanes.
    pub key_count: u8,
    pub sv: SvTable,
    pub combined: SvTable,
    #[serde(default)]
    pub measures: Vec<Millis>,
}

impl Beatmap {
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("Title").map(String::as_str)
    }

    pub fn artist(&self) -> Option<&str> {
        self.metadata.get("Artist").map(String::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.get("Version").map(String::as_str)
    }

    pub fn long_note_count(&self) -> usize {
        self.hit_objects.iter().filter(|o| o.is_long_note).count()
    }

    /// Latest time any object occupies a lane, 0 for an empty chart.
    pub fn last_object_end(&self) -> i64 {
        self.hit_objects.iter().map(HitObject::end).max().unwrap_or(0)
    }

    /// Heads plus long-note tails: the number of judgements a full play produces.
    pub fn total_judgements(&self) -> usize {
        self.hit_objects.len() + self.long_note_count()
    }
}
