use std::collections::BTreeMap;

use fourkey_schema::{ChartFormat, DifficultyValue, Millis, SvTable, TimingPoint};

/// Source chart as read by a format parser, before normalization.
#[derive(Debug, Clone)]
pub(crate) struct RawChart {
    pub(crate) format: ChartFormat,
    pub(crate) metadata: BTreeMap<String, String>,
    pub(crate) general: BTreeMap<String, String>,
    pub(crate) difficulty: BTreeMap<String, DifficultyValue>,
    pub(crate) timing_points: Vec<TimingPoint>,
    pub(crate) objects: Vec<RawObject>,
    /// Lane count declared by the source, if any.
    pub(crate) key_count: Option<u8>,
    pub(crate) base_sv: Option<f64>,
    pub(crate) key_groups: Option<Vec<RawKeyGroup>>,
    pub(crate) precomputed: Precomputed,
}

impl RawChart {
    pub(crate) fn new(format: ChartFormat) -> Self {
        Self {
            format,
            metadata: BTreeMap::new(),
            general: BTreeMap::new(),
            difficulty: BTreeMap::new(),
            timing_points: Vec::new(),
            objects: Vec::new(),
            key_count: None,
            base_sv: None,
            key_groups: None,
            precomputed: Precomputed::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawObject {
    pub(crate) x: i32,
    pub(crate) time: i64,
    pub(crate) object_type: u32,
    pub(crate) is_long_note: bool,
    pub(crate) end_time: i64,
    pub(crate) column: Option<u8>,
    pub(crate) source_index: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct RawKeyGroup {
    pub(crate) id: u32,
    pub(crate) objects: Vec<String>,
}

/// Tables shipped inside the chart file; used verbatim instead of being rebuilt.
#[derive(Debug, Clone, Default)]
pub(crate) struct Precomputed {
    pub(crate) sv: Option<SvTable>,
    pub(crate) combined: Option<SvTable>,
    pub(crate) measures: Option<Vec<Millis>>,
}
