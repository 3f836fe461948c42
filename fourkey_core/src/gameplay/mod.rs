pub mod judge;
pub mod position;
pub mod score;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JudgementTier {
    Perfect,
    Great,
    Good,
    Bad,
    Miss,
}

impl JudgementTier {
    /// Tightest first.
    pub const ALL: [JudgementTier; 5] = [
        JudgementTier::Perfect,
        JudgementTier::Great,
        JudgementTier::Good,
        JudgementTier::Bad,
        JudgementTier::Miss,
    ];

    pub fn points(self) -> u64 {
        match self {
            JudgementTier::Perfect => 300,
            JudgementTier::Great => 200,
            JudgementTier::Good => 100,
            JudgementTier::Bad => 50,
            JudgementTier::Miss => 0,
        }
    }

    /// Contribution to accuracy.
    pub fn weight(self) -> f64 {
        match self {
            JudgementTier::Perfect => 1.0,
            JudgementTier::Great => 0.9,
            JudgementTier::Good => 0.7,
            JudgementTier::Bad => 0.4,
            JudgementTier::Miss => 0.0,
        }
    }

    pub fn breaks_combo(self) -> bool {
        self == JudgementTier::Miss
    }
}
