//! Goal abstraction (spec §4.3). Four concrete variants share a common
//! contract: `is_satisfied`, `progress`, `remaining`, and the set of
//! skills they consider relevant to planning.

use serde::{Deserialize, Serialize};

use crate::registries::Registries;
use crate::sell_policy::SellPolicySpec;
use crate::state::{skills::start_xp_for_level, GameState};
use crate::types::Skill;
use crate::watch::WatchSet;

/// The JSON-serializable subset of `Goal` (spec §6: segment-wrapped
/// goals are not serializable as a whole).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistentGoal {
    ReachCurrency { target: u64 },
    ReachSkillLevel { skill: Skill, level: u32 },
    MultiSkill { subgoals: Vec<PersistentGoal> },
}

/// A goal, possibly wrapped for segment-boundary planning. The wrapper
/// is an execution-time construct (spec §9) and is intentionally not
/// part of `PersistentGoal`.
#[derive(Debug, Clone)]
pub enum Goal {
    Persistent(PersistentGoal),
    SegmentWrapper {
        inner: Box<Goal>,
        watch: Box<WatchSet>,
    },
}

impl Goal {
    pub fn reach_currency(target: u64) -> Self {
        Goal::Persistent(PersistentGoal::ReachCurrency { target })
    }

    pub fn reach_skill_level(skill: Skill, level: u32) -> Self {
        Goal::Persistent(PersistentGoal::ReachSkillLevel { skill, level })
    }

    pub fn multi_skill(subgoals: Vec<PersistentGoal>) -> Self {
        Goal::Persistent(PersistentGoal::MultiSkill { subgoals })
    }

    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Goal::Persistent(p) => serde_json::to_value(p).ok(),
            Goal::SegmentWrapper { .. } => None,
        }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(Goal::Persistent(serde_json::from_value(value)?))
    }

    pub fn is_satisfied(&self, state: &GameState, registries: &Registries) -> bool {
        match self {
            Goal::Persistent(p) => p.is_satisfied(state, registries),
            Goal::SegmentWrapper { watch, .. } => watch.detect_boundary(state, registries).is_some(),
        }
    }

    pub fn progress(&self, state: &GameState, registries: &Registries) -> f64 {
        match self {
            Goal::Persistent(p) => p.progress(state, registries),
            Goal::SegmentWrapper { inner, .. } => inner.progress(state, registries),
        }
    }

    pub fn remaining(&self, state: &GameState, registries: &Registries) -> f64 {
        match self {
            Goal::Persistent(p) => p.remaining(state, registries),
            Goal::SegmentWrapper { inner, .. } => inner.remaining(state, registries),
        }
    }

    pub fn relevant_skills(&self) -> Vec<Skill> {
        match self {
            Goal::Persistent(p) => p.relevant_skills(),
            Goal::SegmentWrapper { inner, .. } => inner.relevant_skills(),
        }
    }

    pub fn tracks_hp(&self) -> bool {
        match self {
            Goal::Persistent(p) => p.tracks_hp(),
            Goal::SegmentWrapper { inner, .. } => inner.tracks_hp(),
        }
    }

    pub fn tracks_inventory(&self) -> bool {
        match self {
            Goal::Persistent(p) => p.tracks_inventory(),
            Goal::SegmentWrapper { inner, .. } => inner.tracks_inventory(),
        }
    }

    pub fn consuming_skills(&self) -> Vec<Skill> {
        match self {
            Goal::Persistent(p) => p.consuming_skills(),
            Goal::SegmentWrapper { inner, .. } => inner.consuming_skills(),
        }
    }

    pub fn sell_policy_spec(&self) -> SellPolicySpec {
        match self {
            Goal::Persistent(p) => p.sell_policy_spec(),
            Goal::SegmentWrapper { inner, .. } => inner.sell_policy_spec(),
        }
    }

    /// Ranking function used by the candidate enumerator: how much this
    /// goal values training `skill` at the given gold/xp rates.
    pub fn activity_rate(&self, skill: Skill, gold_rate: f64, xp_rate: f64) -> f64 {
        match self {
            Goal::Persistent(p) => p.activity_rate(skill, gold_rate, xp_rate),
            Goal::SegmentWrapper { inner, .. } => inner.activity_rate(skill, gold_rate, xp_rate),
        }
    }
}

impl PersistentGoal {
    pub fn is_satisfied(&self, state: &GameState, registries: &Registries) -> bool {
        self.remaining(state, registries) <= 0.0
    }

    pub fn progress(&self, state: &GameState, registries: &Registries) -> f64 {
        match self {
            PersistentGoal::ReachCurrency { .. } => {
                SellPolicySpec::SellAll.resolve(registries, &[]).effective_credits(state, registries) as f64
            }
            PersistentGoal::ReachSkillLevel { skill, .. } => state.skills.xp(*skill),
            PersistentGoal::MultiSkill { subgoals } => {
                subgoals.iter().map(|g| g.progress(state, registries)).sum()
            }
        }
    }

    pub fn remaining(&self, state: &GameState, registries: &Registries) -> f64 {
        match self {
            PersistentGoal::ReachCurrency { target } => {
                (*target as f64 - self.progress(state, registries)).max(0.0)
            }
            PersistentGoal::ReachSkillLevel { skill, level } => {
                (start_xp_for_level(*level) - state.skills.xp(*skill)).max(0.0)
            }
            PersistentGoal::MultiSkill { subgoals } => subgoals
                .iter()
                .filter(|g| !g.is_satisfied(state, registries))
                .map(|g| g.remaining(state, registries))
                .sum(),
        }
    }

    pub fn relevant_skills(&self) -> Vec<Skill> {
        match self {
            PersistentGoal::ReachCurrency { .. } => Skill::ALL.to_vec(),
            PersistentGoal::ReachSkillLevel { skill, .. } => vec![*skill],
            PersistentGoal::MultiSkill { subgoals } => {
                let mut skills: Vec<Skill> = subgoals.iter().flat_map(|g| g.relevant_skills()).collect();
                skills.sort();
                skills.dedup();
                skills
            }
        }
    }

    pub fn tracks_hp(&self) -> bool {
        self.relevant_skills().contains(&Skill::Thieving)
    }

    pub fn tracks_inventory(&self) -> bool {
        self.relevant_skills().iter().any(|s| s.is_consuming())
    }

    pub fn consuming_skills(&self) -> Vec<Skill> {
        self.relevant_skills().into_iter().filter(|s| s.is_consuming()).collect()
    }

    pub fn sell_policy_spec(&self) -> SellPolicySpec {
        match self {
            PersistentGoal::ReachCurrency { .. } => SellPolicySpec::SellAll,
            _ if self.tracks_inventory() => SellPolicySpec::ReserveConsumingInputs,
            _ => SellPolicySpec::SellAll,
        }
    }

    pub fn activity_rate(&self, skill: Skill, gold_rate: f64, xp_rate: f64) -> f64 {
        match self {
            PersistentGoal::ReachCurrency { .. } => gold_rate,
            PersistentGoal::ReachSkillLevel { skill: target, .. } => {
                if skill == *target {
                    xp_rate
                } else {
                    0.0
                }
            }
            PersistentGoal::MultiSkill { subgoals } => subgoals
                .iter()
                .map(|g| g.activity_rate(skill, gold_rate, xp_rate))
                .fold(0.0, f64::max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registries() -> Registries {
        Registries::default()
    }

    #[test]
    fn reach_currency_progress_is_monotone_with_gp() {
        let goal = Goal::reach_currency(1000);
        let registries = registries();
        let state = GameState::new(10, 10).with_gp(500);
        assert!(!goal.is_satisfied(&state, &registries));
        let state2 = state.with_gp(1500);
        assert!(goal.is_satisfied(&state2, &registries));
    }

    #[test]
    fn reach_skill_level_only_ranks_target_skill() {
        let goal = Goal::reach_skill_level(Skill::Woodcutting, 10);
        assert!(goal.activity_rate(Skill::Fishing, 0.0, 100.0) == 0.0);
        assert!(goal.activity_rate(Skill::Woodcutting, 0.0, 100.0) == 100.0);
    }

    #[test]
    fn multi_skill_remaining_sums_unfinished_subgoals() {
        let goal = Goal::multi_skill(vec![
            PersistentGoal::ReachSkillLevel { skill: Skill::Woodcutting, level: 5 },
            PersistentGoal::ReachSkillLevel { skill: Skill::Fishing, level: 5 },
        ]);
        let registries = registries();
        let mut state = GameState::new(10, 10);
        let total_remaining_before = goal.remaining(&state, &registries);
        state.skills.add_xp(Skill::Woodcutting, start_xp_for_level(5));
        let total_remaining_after = goal.remaining(&state, &registries);
        assert!(total_remaining_after < total_remaining_before);
        assert!(!goal.is_satisfied(&state, &registries));
    }

    #[test]
    fn persistent_goal_json_round_trips() {
        let goal = Goal::reach_skill_level(Skill::Mining, 20);
        let json = goal.to_json().unwrap();
        let restored = Goal::from_json(json).unwrap();
        assert_eq!(restored.relevant_skills(), vec![Skill::Mining]);
    }

    #[test]
    fn consuming_skill_goal_has_reserve_sell_policy() {
        let goal = Goal::reach_skill_level(Skill::Firemaking, 5);
        assert_eq!(goal.sell_policy_spec(), SellPolicySpec::ReserveConsumingInputs);
        let goal2 = Goal::reach_skill_level(Skill::Woodcutting, 5);
        assert_eq!(goal2.sell_policy_spec(), SellPolicySpec::SellAll);
    }
}
