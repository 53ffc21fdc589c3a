//! XP and leveling engine.
//!
//! Two groups of pure functions:
//! - Leveling: cumulative points <-> level on a triangular curve
//!   (level N is reached at `(N-1)*N/2 * 100` points)
//! - Streak rewards: an accelerating schedule where day `d` of a clean
//!   streak is worth `d * rate`
//!
//! Every function is total over `i64`. Out-of-domain inputs clamp to
//! 0 points or level 1 and large results saturate instead of overflowing.

use serde::{Deserialize, Serialize};

/// Cumulative experience points.
pub type PointTotal = i64;

/// Derived level, always `>= 1`.
pub type Level = i64;

/// Consecutive relapse-free days.
pub type StreakLength = i64;

/// Points granted for day 1 of a streak.
pub type RewardRate = i64;

/// Points between consecutive triangular steps of the curve.
pub const POINTS_PER_STEP: PointTotal = 100;

/// Progress inside the current level, ready for a progress bar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Points earned since the current level was reached
    pub current_level_points: PointTotal,
    /// Points needed to clear the current level
    pub next_level_points: PointTotal,
    /// `current_level_points / next_level_points`, in `[0, 1)`
    pub progress: f64,
}

fn saturate(value: i128) -> i64 {
    value.clamp(0, i64::MAX as i128) as i64
}

/// `n * (n + 1) / 2` for `0 <= n <= i64::MAX`. The product fits in `i128`.
fn triangular(n: i128) -> i128 {
    n * (n + 1) / 2
}

/// Threshold of `level` in `i128`, saturating at `i128::MAX`.
fn threshold(level: i128) -> i128 {
    if level <= 1 {
        return 0;
    }
    triangular(level - 1).saturating_mul(POINTS_PER_STEP as i128)
}

/// Points required to *arrive at* `level`.
///
/// Level 1 needs 0, level 2 needs 100, level 3 needs 300, level 4 needs 600.
/// Any `level <= 1` returns 0.
pub fn points_required_for_level(level: Level) -> PointTotal {
    saturate(threshold(level as i128))
}

/// Level reached with `points` accumulated.
///
/// Returns the greatest `L >= 1` such that
/// `points_required_for_level(L) <= points`. Zero and negative totals are
/// level 1.
pub fn level_for_points(points: PointTotal) -> Level {
    if points <= 0 {
        return 1;
    }

    // (L-1)*L*50 <= points  <=>  (L-1)*L <= points / 50 (integer floor)
    let budget = (points / (POINTS_PER_STEP / 2)) as i128;

    // Closed-form estimate, then corrected in integers to absorb
    // floating point error on large totals.
    let estimate = ((1.0 + (1.0 + 4.0 * budget as f64).sqrt()) / 2.0).floor() as i128;
    let mut level = estimate.max(1);
    while level > 1 && (level - 1) * level > budget {
        level -= 1;
    }
    while level * (level + 1) <= budget {
        level += 1;
    }

    level as Level
}

/// Split `points` into progress within the current level.
///
/// Negative totals are reported as 0 points into level 1.
pub fn level_progress(points: PointTotal) -> LevelProgress {
    let points = points.max(0);
    let level = level_for_points(points) as i128;
    let start = threshold(level);
    let end = threshold(level + 1);

    let current = points as i128 - start;
    let needed = end - start;
    let progress = if needed > 0 {
        current as f64 / needed as f64
    } else {
        0.0
    };

    LevelProgress {
        current_level_points: current as PointTotal,
        next_level_points: needed as PointTotal,
        progress,
    }
}

/// Total reward accrued over a streak of `streak_days` days.
///
/// Day `d` contributes `d * reward_rate`, so the total is
/// `n * (n + 1) / 2 * reward_rate`. This is also the amount forfeited when
/// the streak ends in a relapse.
pub fn cumulative_streak_reward(streak_days: StreakLength, reward_rate: RewardRate) -> PointTotal {
    if streak_days <= 0 || reward_rate <= 0 {
        return 0;
    }
    saturate(triangular(streak_days as i128).saturating_mul(reward_rate as i128))
}

/// Reward for exactly day `day` (1-based) of a streak.
pub fn daily_streak_reward(day: StreakLength, reward_rate: RewardRate) -> PointTotal {
    if day <= 0 || reward_rate <= 0 {
        return 0;
    }
    saturate(day as i128 * reward_rate as i128)
}
