use fourkey_schema::{Beatmap, Millis, SvTable};

use crate::config::GameplayConfig;

/// Pixel offset of a note from the judgement line; negative is above it.
///
/// Distances follow the integrated velocity so a note moves at the speed of
/// the multiplier in effect at the current time. An empty table scrolls
/// linearly.
pub fn note_offset(table: &SvTable, note_time: Millis, current_time: Millis, px_per_sec: f64) -> f64 {
    let px_per_ms = px_per_sec / 1000.0;
    if table.is_empty() {
        return -px_per_ms * (note_time - current_time);
    }
    -px_per_ms * (table.area_at(note_time) - table.area_at(current_time))
}

/// Display settings resolved once per chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionMapper {
    pub px_per_sec: f64,
    pub show_sv: bool,
    pub bpm_scaling: bool,
}

impl PositionMapper {
    pub fn from_config(config: &GameplayConfig) -> Self {
        Self {
            px_per_sec: config.scroll_px_per_sec(),
            show_sv: config.show_sv,
            bpm_scaling: config.bpm_scaling,
        }
    }

    /// Table in use, `None` when scrolling is purely time-linear.
    pub fn table<'a>(&self, beatmap: &'a Beatmap) -> Option<&'a SvTable> {
        if !self.show_sv {
            return None;
        }
        let table = if self.bpm_scaling { &beatmap.combined } else { &beatmap.sv };
        (!table.is_empty()).then_some(table)
    }

    pub fn note_offset(&self, beatmap: &Beatmap, note_time: Millis, current_time: Millis) -> f64 {
        match self.table(beatmap) {
            Some(table) => note_offset(table, note_time, current_time, self.px_per_sec),
            None => -(self.px_per_sec / 1000.0) * (note_time - current_time),
        }
    }

    /// Screen y of a note given the judgement line's y.
    pub fn note_y(&self, beatmap: &Beatmap, judge_line_y: f64, note_time: Millis, current_time: Millis) -> f64 {
        judge_line_y + self.note_offset(beatmap, note_time, current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourkey_schema::SvSegment;

    fn doubled_after_1000() -> SvTable {
        SvTable {
            segments: vec![
                SvSegment { start: 0.0, end: Some(1000.0), sv: 1.0 },
                SvSegment { start: 1000.0, end: None, sv: 2.0 },
            ],
            cum_areas: vec![0.0, 1000.0],
        }
    }

    #[test]
    fn empty_table_is_linear() {
        assert_eq!(note_offset(&SvTable::default(), 1000.0, 0.0, 800.0), -800.0);
    }

    #[test]
    fn offset_follows_the_integrated_velocity() {
        let table = doubled_after_1000();
        // 500ms at 1x then 500ms at 2x
        assert_eq!(note_offset(&table, 1500.0, 500.0, 1000.0), -1500.0);
        // once inside the fast section the note moves twice as fast
        assert_eq!(note_offset(&table, 1500.0, 1400.0, 1000.0), -200.0);
    }

    #[test]
    fn passed_notes_are_below_the_line() {
        let table = doubled_after_1000();
        assert!(note_offset(&table, 1000.0, 1100.0, 800.0) > 0.0);
    }
}
