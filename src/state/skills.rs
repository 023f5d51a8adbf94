use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Skill;

/// Cumulative per-skill XP. Melvor-style level curve: XP required for
/// level `L` grows roughly geometrically; we use the same closed-form
/// approximation the teacher's probability tables use elsewhere in the
/// pack (a fixed polynomial), good enough for planning purposes since
/// only monotonicity and thresholds matter, never the exact curve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillState {
    xp: HashMap<Skill, f64>,
}

const MAX_LEVEL: u32 = 99;

/// XP required to *start* level `level` (level 1 starts at 0 XP).
pub fn start_xp_for_level(level: u32) -> f64 {
    if level <= 1 {
        return 0.0;
    }
    let mut total = 0.0;
    for l in 1..level {
        total += (l as f64 + 300.0 * 2f64.powf(l as f64 / 7.0)).floor() / 4.0;
    }
    total
}

pub fn level_for_xp(xp: f64) -> u32 {
    let mut level = 1;
    while level < MAX_LEVEL && start_xp_for_level(level + 1) <= xp {
        level += 1;
    }
    level
}

impl SkillState {
    pub fn xp(&self, skill: Skill) -> f64 {
        self.xp.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn level(&self, skill: Skill) -> u32 {
        level_for_xp(self.xp(skill))
    }

    /// Adds `amount` (must be `>= 0`) of XP, preserving monotonicity.
    pub fn add_xp(&mut self, skill: Skill, amount: f64) {
        debug_assert!(amount >= 0.0, "xp deltas must be non-negative");
        if amount <= 0.0 {
            return;
        }
        *self.xp.entry(skill).or_insert(0.0) += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_starts_at_zero() {
        assert_eq!(start_xp_for_level(1), 0.0);
        assert_eq!(level_for_xp(0.0), 1);
    }

    #[test]
    fn level_curve_is_monotone_increasing() {
        let mut prev = start_xp_for_level(1);
        for l in 2..=MAX_LEVEL {
            let next = start_xp_for_level(l);
            assert!(next > prev, "level {l} xp {next} should exceed {prev}");
            prev = next;
        }
    }

    #[test]
    fn level_for_xp_is_inverse_of_threshold() {
        for l in 1..MAX_LEVEL {
            let threshold = start_xp_for_level(l);
            assert!(level_for_xp(threshold) >= l);
        }
    }

    #[test]
    fn add_xp_is_monotone() {
        let mut s = SkillState::default();
        s.add_xp(Skill::Woodcutting, 10.0);
        let before = s.xp(Skill::Woodcutting);
        s.add_xp(Skill::Woodcutting, 5.0);
        assert!(s.xp(Skill::Woodcutting) >= before);
    }
}
