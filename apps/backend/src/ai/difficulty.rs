//! Difficulty tiers and the recalibration policy.

use serde::{Deserialize, Serialize};

pub const TARGET_WIN_RATE: f64 = 0.5;
/// Dead band around the target before a tier change is recommended.
pub const WIN_RATE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl AiLevel {
    pub fn step_up(self) -> Self {
        match self {
            AiLevel::Low => AiLevel::Medium,
            AiLevel::Medium => AiLevel::High,
            AiLevel::High => AiLevel::VeryHigh,
            AiLevel::VeryHigh => AiLevel::VeryHigh,
        }
    }

    pub fn step_down(self) -> Self {
        match self {
            AiLevel::VeryHigh => AiLevel::High,
            AiLevel::High => AiLevel::Medium,
            AiLevel::Medium => AiLevel::Low,
            AiLevel::Low => AiLevel::Low,
        }
    }
}

/// Search budget per tier. Budgets must be strictly increasing so a higher
/// tier is never weaker than a lower one.
#[derive(Debug, Clone, Copy)]
pub struct IterationBudgets {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub very_high: u32,
}

impl Default for IterationBudgets {
    fn default() -> Self {
        Self {
            low: 100,
            medium: 500,
            high: 1_500,
            very_high: 3_000,
        }
    }
}

impl IterationBudgets {
    pub fn iterations(&self, level: AiLevel) -> u32 {
        match level {
            AiLevel::Low => self.low,
            AiLevel::Medium => self.medium,
            AiLevel::High => self.high,
            AiLevel::VeryHigh => self.very_high,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DifficultyAdjustment {
    pub recommended_level: AiLevel,
    pub previous_level: AiLevel,
    pub reason: String,
    pub win_rate: f64,
}

/// Nudge the tier one step against the observed opponent win rate, clamped
/// at the tier boundaries.
pub fn recalibrate(current_level: AiLevel, win_rate: f64, target_win_rate: f64) -> DifficultyAdjustment {
    let (recommended_level, reason) = if win_rate > target_win_rate + WIN_RATE_THRESHOLD {
        if current_level == AiLevel::VeryHigh {
            (current_level, "Already at maximum difficulty".to_string())
        } else {
            (
                current_level.step_up(),
                "Increasing difficulty: player win rate too high".to_string(),
            )
        }
    } else if win_rate < target_win_rate - WIN_RATE_THRESHOLD {
        if current_level == AiLevel::Low {
            (current_level, "Already at minimum difficulty".to_string())
        } else {
            (
                current_level.step_down(),
                "Decreasing difficulty: player win rate too low".to_string(),
            )
        }
    } else {
        (
            current_level,
            "Win rate within acceptable range".to_string(),
        )
    };

    DifficultyAdjustment {
        recommended_level,
        previous_level: current_level,
        reason,
        win_rate,
    }
}
