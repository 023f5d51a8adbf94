//! Search node (spec §4.9): a state plus the path-cost bookkeeping
//! needed to reconstruct the plan once the goal is reached.

use std::rc::Rc;

use crate::plan::Step;
use crate::state::GameState;

#[derive(Debug)]
pub struct Node {
    pub state: GameState,
    pub ticks_so_far: u64,
    pub interaction_count: u32,
    pub parent: Option<Rc<Node>>,
    pub step_from_parent: Option<Step>,
}

impl Node {
    pub fn root(state: GameState) -> Rc<Node> {
        Rc::new(Node {
            state,
            ticks_so_far: 0,
            interaction_count: 0,
            parent: None,
            step_from_parent: None,
        })
    }

    pub fn child(parent: &Rc<Node>, state: GameState, step: Step, is_interaction: bool) -> Rc<Node> {
        Rc::new(Node {
            ticks_so_far: parent.ticks_so_far + step.ticks(),
            interaction_count: parent.interaction_count + if is_interaction { 1 } else { 0 },
            parent: Some(Rc::clone(parent)),
            step_from_parent: Some(step),
            state,
        })
    }

    /// Walks parent links back to the root and returns the path of steps
    /// in forward (root-to-goal) order.
    pub fn reconstruct_path(node: &Rc<Node>) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut current = Some(Rc::clone(node));
        while let Some(n) = current {
            if let Some(step) = &n.step_from_parent {
                steps.push(step.clone());
            }
            current = n.parent.clone();
        }
        steps.reverse();
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionId;
    use crate::candidates::Candidate;

    #[test]
    fn reconstruct_path_is_root_to_goal_order() {
        let root = Node::root(GameState::new(10, 10));
        let step1 = Step::WaitStep { ticks: 5, wait_for: crate::wait::WaitFor::Goal, expected_action: None };
        let child1 = Node::child(&root, GameState::new(10, 10), step1.clone(), false);
        let step2 = Step::InteractionStep {
            candidate: Candidate::SwitchActivity { action: ActionId::new(0, 1), recipe: None },
            ticks: 0,
        };
        let child2 = Node::child(&child1, GameState::new(10, 10), step2.clone(), true);

        let path = Node::reconstruct_path(&child2);
        assert_eq!(path, vec![step1, step2]);
        assert_eq!(child2.interaction_count, 1);
        assert_eq!(child2.ticks_so_far, 5);
    }
}
