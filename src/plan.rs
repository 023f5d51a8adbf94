//! Plan representation, reconstruction, and compression (spec §4.10,
//! §4.11): the search produces a path of `Step`s; `compress` removes
//! no-op switches and merges consecutive waits before handing the plan
//! to the executor.

use crate::candidates::Candidate;
use crate::macros::MacroSpec;
use crate::sell_policy::SellPolicy;
use crate::types::ActionId;
use crate::wait::WaitFor;

/// One edge in the search path, carrying its tick cost for
/// reconstruction bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    InteractionStep { candidate: Candidate, ticks: u64 },
    WaitStep {
        ticks: u64,
        /// The predicate the executor re-checks against the live state
        /// before treating the wait as satisfied (spec §3/§4.12) --
        /// `ticks` is only the planning-time estimate.
        wait_for: WaitFor,
        /// The action that should still be active when the wait ends;
        /// if the executor finds a different action running, it must
        /// switch back to this one before continuing (spec §4.12).
        expected_action: Option<ActionId>,
    },
    MacroStep { macro_spec: MacroSpec, ticks: u64 },
}

impl Step {
    pub fn ticks(&self) -> u64 {
        match self {
            Step::InteractionStep { ticks, .. } => *ticks,
            Step::WaitStep { ticks, .. } => *ticks,
            Step::MacroStep { ticks, .. } => *ticks,
        }
    }

    /// `true` for steps that represent "do nothing, just let time pass"
    /// -- the only step kind `compress` ever merges.
    pub fn is_wait(&self) -> bool {
        matches!(self, Step::WaitStep { .. })
    }
}

/// Maps a step index to the sell policy active from that point forward
/// (spec §4.11): segment boundaries change which items are kept versus
/// sold, and the executor needs to know which policy applies mid-plan.
#[derive(Debug, Clone)]
pub struct SegmentMarker {
    pub from_step: usize,
    pub sell_policy: Option<SellPolicy>,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub steps: Vec<Step>,
    pub segment_markers: Vec<SegmentMarker>,
    pub total_ticks: u64,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        let total_ticks = steps.iter().map(Step::ticks).sum();
        Self {
            steps,
            segment_markers: Vec::new(),
            total_ticks,
        }
    }

    pub fn with_segment_markers(mut self, markers: Vec<SegmentMarker>) -> Self {
        self.segment_markers = markers;
        self
    }

    /// Sell policy in effect at `step_index`, per the most recent marker
    /// at or before that index (defaults to sell-all when unmarked).
    pub fn sell_policy_at(&self, step_index: usize) -> SellPolicy {
        self.segment_markers
            .iter()
            .rev()
            .find(|m| m.from_step <= step_index)
            .and_then(|m| m.sell_policy.clone())
            .unwrap_or(SellPolicy::SellAll)
    }

    /// Merges consecutive wait steps and drops interaction steps that
    /// switch to the activity already active (spec §4.10).
    pub fn compress(self) -> Self {
        let mut compressed: Vec<Step> = Vec::new();
        let mut last_switch: Option<Candidate> = None;

        for step in self.steps {
            match &step {
                Step::InteractionStep { candidate, .. } => {
                    if let Candidate::SwitchActivity { .. } = candidate {
                        if last_switch.as_ref() == Some(candidate) {
                            continue; // no-op: already doing this
                        }
                        last_switch = Some(candidate.clone());
                    }
                    compressed.push(step);
                }
                Step::WaitStep { ticks, wait_for, expected_action } => {
                    if let Some(Step::WaitStep { ticks: prev_ticks, .. }) = compressed.last_mut() {
                        *prev_ticks += ticks;
                    } else {
                        compressed.push(Step::WaitStep {
                            ticks: *ticks,
                            wait_for: wait_for.clone(),
                            expected_action: *expected_action,
                        });
                    }
                }
                Step::MacroStep { .. } => {
                    last_switch = None;
                    compressed.push(step);
                }
            }
        }

        let total_ticks = compressed.iter().map(Step::ticks).sum();
        Self {
            steps: compressed,
            segment_markers: self.segment_markers,
            total_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionId;

    fn switch(id: u32) -> Candidate {
        Candidate::SwitchActivity { action: ActionId::new(0, id), recipe: None }
    }

    fn wait(ticks: u64) -> Step {
        Step::WaitStep {
            ticks,
            wait_for: WaitFor::Goal,
            expected_action: None,
        }
    }

    #[test]
    fn compress_merges_consecutive_waits() {
        let plan = Plan::new(vec![wait(5), wait(3)]).compress();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].ticks(), 8);
    }

    #[test]
    fn compress_drops_repeated_switch_to_same_activity() {
        let plan = Plan::new(vec![
            Step::InteractionStep { candidate: switch(1), ticks: 0 },
            wait(10),
            Step::InteractionStep { candidate: switch(1), ticks: 0 },
            wait(10),
        ])
        .compress();
        let switches = plan
            .steps
            .iter()
            .filter(|s| matches!(s, Step::InteractionStep { .. }))
            .count();
        assert_eq!(switches, 1);
    }

    #[test]
    fn total_ticks_tracks_sum_of_steps() {
        let plan = Plan::new(vec![wait(5), Step::InteractionStep { candidate: switch(2), ticks: 1 }]);
        assert_eq!(plan.total_ticks, 6);
    }
}
