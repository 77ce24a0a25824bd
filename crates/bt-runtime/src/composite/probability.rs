use bt_core::{Blackboard, DeterministicRng};

use crate::composite::CompositePolicy;
use crate::context::{tags, EvalCx, TickCx};
use crate::state::State;

/// Picks one child by weighted draw on every start and runs only that one.
///
/// Weights are integers; a child with weight 0 is never picked. The weight list
/// follows the child list: missing entries default to 1 and extra entries are
/// dropped. When every weight is 0 nothing is selected and the branch fails.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityBranch {
    weights: Vec<u32>,
    selected: Option<usize>,
}

impl ProbabilityBranch {
    pub fn new(weights: impl Into<Vec<u32>>) -> Self {
        Self {
            weights: weights.into(),
            selected: None,
        }
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Index chosen by the last draw.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn draw(&self, rng: &mut impl DeterministicRng) -> Option<usize> {
        let total: u64 = self.weights.iter().map(|&w| u64::from(w)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = rng.next_below(total);
        for (index, &weight) in self.weights.iter().enumerate() {
            let weight = u64::from(weight);
            if roll < weight {
                return Some(index);
            }
            roll -= weight;
        }
        None
    }
}

impl CompositePolicy for ProbabilityBranch {
    fn on_start(&mut self, cx: &mut TickCx<'_>, _bb: &Blackboard) {
        if self.weights.len() != cx.child_count() {
            self.sync_children(cx.child_count());
        }
        self.selected = self.draw(cx.rng());
        if let Some(index) = self.selected {
            cx.emit(tags::PROBABILITY_SELECT, index as u64);
        }
    }

    fn run_children(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        match self.selected.and_then(|index| cx.child(index)) {
            Some(child) => cx.run_child(child, bb),
            None => State::Failure,
        }
    }

    fn on_active_evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        match self.selected.and_then(|index| cx.child(index)) {
            Some(child) if cx.can_re_evaluate_child(child) => cx.evaluate_child(child, bb),
            _ => State::Success,
        }
    }

    fn on_deactive_evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        self.on_active_evaluate(cx, bb)
    }

    fn sync_children(&mut self, count: usize) {
        self.weights.resize(count, 1);
    }

    fn on_reset(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_core::SplitMix64;

    #[test]
    fn zero_weight_is_never_drawn() {
        let branch = ProbabilityBranch::new(vec![0, 1]);
        let mut rng = SplitMix64::new(11);
        for _ in 0..500 {
            assert_eq!(branch.draw(&mut rng), Some(1));
        }
    }

    #[test]
    fn all_zero_weights_select_nothing() {
        let branch = ProbabilityBranch::new(vec![0, 0, 0]);
        let mut rng = SplitMix64::new(1);
        assert_eq!(branch.draw(&mut rng), None);
    }

    #[test]
    fn sync_pads_with_one_and_truncates() {
        let mut branch = ProbabilityBranch::new(vec![5]);
        branch.sync_children(3);
        assert_eq!(branch.weights(), &[5, 1, 1]);
        branch.sync_children(2);
        assert_eq!(branch.weights(), &[5, 1]);
    }

    #[test]
    fn draws_follow_weights() {
        let branch = ProbabilityBranch::new(vec![1, 3]);
        let mut rng = SplitMix64::new(2024);
        let mut hits = [0u32; 2];
        for _ in 0..4000 {
            hits[branch.draw(&mut rng).unwrap_or(0)] += 1;
        }
        // Expected 1000 / 3000.
        assert!((800..1200).contains(&hits[0]), "{hits:?}");
    }
}
