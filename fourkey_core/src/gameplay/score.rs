use std::collections::BTreeMap;

use serde::Serialize;

use super::judge::JudgementEvent;
use super::JudgementTier;

/// Running totals folded from the judgement stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    /// Percentage in `0..=100`; 100 before anything is judged.
    pub accuracy: f64,
    pub counts: BTreeMap<JudgementTier, u32>,
    pub total: u32,
    pub heads_judged: u32,
    pub tails_judged: u32,
    #[serde(skip)]
    weighted: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            accuracy: 100.0,
            counts: JudgementTier::ALL.into_iter().map(|t| (t, 0)).collect(),
            total: 0,
            heads_judged: 0,
            tails_judged: 0,
            weighted: 0.0,
        }
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a JudgementEvent>) -> Self {
        let mut stats = Self::default();
        for event in events {
            stats.apply_event(event);
        }
        stats
    }

    pub fn apply(&mut self, tier: JudgementTier, is_head: bool) {
        *self.counts.entry(tier).or_insert(0) += 1;
        self.total += 1;
        self.weighted += tier.weight();
        if is_head {
            self.heads_judged += 1;
        } else {
            self.tails_judged += 1;
        }

        if tier.breaks_combo() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
            // floor(combo * 0.5)
            self.score += tier.points() + u64::from(self.combo / 2);
        }

        self.accuracy = self.weighted / f64::from(self.total) * 100.0;
    }

    pub fn apply_event(&mut self, event: &JudgementEvent) {
        self.apply(event.tier, event.is_head);
    }

    pub fn count(&self, tier: JudgementTier) -> u32 {
        self.counts.get(&tier).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_report_full_accuracy() {
        let stats = Stats::new();
        assert_eq!(stats.accuracy, 100.0);
        assert_eq!(stats.count(JudgementTier::Miss), 0);
    }

    #[test]
    fn combo_bonus_is_half_the_combo_rounded_down() {
        let mut stats = Stats::new();
        stats.apply(JudgementTier::Perfect, true);
        assert_eq!(stats.score, 300);
        stats.apply(JudgementTier::Great, true);
        assert_eq!(stats.score, 300 + 200 + 1);
        stats.apply(JudgementTier::Good, true);
        assert_eq!(stats.score, 501 + 100 + 1);
        assert_eq!(stats.combo, 3);
    }

    #[test]
    fn miss_resets_combo_and_lowers_accuracy() {
        let mut stats = Stats::new();
        stats.apply(JudgementTier::Perfect, true);
        stats.apply(JudgementTier::Perfect, true);
        stats.apply(JudgementTier::Miss, false);
        assert_eq!(stats.combo, 0);
        assert_eq!(stats.max_combo, 2);
        assert_eq!(stats.tails_judged, 1);
        assert!((stats.accuracy - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn accuracy_uses_tier_weights() {
        let mut stats = Stats::new();
        stats.apply(JudgementTier::Great, true);
        stats.apply(JudgementTier::Bad, true);
        assert!((stats.accuracy - 65.0).abs() < 1e-9);
    }

    #[test]
    fn folding_the_same_events_is_deterministic() {
        let events: Vec<JudgementEvent> = [JudgementTier::Perfect, JudgementTier::Miss, JudgementTier::Good]
            .into_iter()
            .enumerate()
            .map(|(i, tier)| JudgementEvent {
                tier,
                lane: i % 4,
                note_index: i,
                is_head: true,
                delta_ms: 0.0,
                time_ms: i as f64 * 100.0,
            })
            .collect();
        assert_eq!(Stats::from_events(&events), Stats::from_events(&events));
        assert_eq!(Stats::from_events(&events).score, 300 + 100);
    }
}
