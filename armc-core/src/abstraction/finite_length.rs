//! §4.5.2 finite-length-language abstraction: states are equivalent when
//! their bounded forward/backward state (or trace) languages up to a
//! maintained integer bound `n` coincide. Refinement increases `n`.

use crate::sfa::{Equivalence, Sfa};

use super::{Abstraction, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageFlavor {
    State,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundIncrement {
    One,
    /// Grow by the size of the failing replay automaton `X`.
    X,
    /// Grow by the size of the current automaton `M`.
    M,
}

pub struct FiniteLengthAbstraction {
    bound: usize,
    flavor: LanguageFlavor,
    direction: Direction,
    increment: BoundIncrement,
    halve_increment: bool,
}

impl FiniteLengthAbstraction {
    pub fn new(
        initial_bound: usize,
        flavor: LanguageFlavor,
        direction: Direction,
        increment: BoundIncrement,
        halve_increment: bool,
    ) -> Self {
        Self {
            bound: initial_bound.max(1),
            flavor,
            direction,
            increment,
            halve_increment,
        }
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    fn state_language(&self, m: &Sfa, q: usize) -> Sfa {
        let language = match (self.direction, self.flavor) {
            (Direction::Forward, LanguageFlavor::State) => m.forward_state_language(q),
            (Direction::Forward, LanguageFlavor::Trace) => m.forward_trace_language(q),
            (Direction::Backward, LanguageFlavor::State) => m.backward_state_language(q),
            (Direction::Backward, LanguageFlavor::Trace) => m.backward_trace_language(q),
        }
        .expect("q is a state of m");
        language.bounded_language(self.bound)
    }
}

impl Abstraction for FiniteLengthAbstraction {
    fn collapse(&self, m: &Sfa) -> Sfa {
        m.collapse(|mm, a, b| self.states_are_equivalent(mm, a, b))
    }

    fn states_are_equivalent(&self, m: &Sfa, q: usize, q_prime: usize) -> bool {
        let a = self.state_language(m, q);
        let b = self.state_language(m, q_prime);
        matches!(a.equivalent_to(&b), Ok(Equivalence::Equivalent))
    }

    fn refine(&mut self, m: &Sfa, x: &Sfa) {
        let raw_increment = match self.increment {
            BoundIncrement::One => 1,
            BoundIncrement::X => x.num_states(),
            BoundIncrement::M => m.num_states(),
        };
        let increment = if self.halve_increment {
            (raw_increment / 2).max(1)
        } else {
            raw_increment
        };
        self.bound += increment;
        log::info!("finite-length abstraction bound increased to {}", self.bound);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::alphabet::Alphabet;
    use crate::predicate::PredicateAlgebra;
    use crate::sfa::SfaState;

    fn chain() -> Sfa {
        let alg = Rc::new(PredicateAlgebra::new(Alphabet::from_strs(["a"])));
        let a = alg.symbol(0);
        let states = vec![
            SfaState { name: None, accepting: false },
            SfaState { name: None, accepting: false },
            SfaState { name: None, accepting: true },
        ];
        let transitions = vec![vec![(a.clone(), 1)], vec![(a, 2)], vec![]];
        let epsilon = vec![Vec::new(); 3];
        Sfa::raw(alg, 0, states, transitions, epsilon, None).unwrap()
    }

    #[test]
    fn small_bound_merges_far_apart_states() {
        let m = chain();
        let abstraction = FiniteLengthAbstraction::new(0, LanguageFlavor::State, Direction::Forward, BoundIncrement::One, false);
        // At bound 1, state 0 (Lf = {"aa"}, truncated to {}) and state 2
        // (Lf = {""}) both see only the empty word within the bound, so
        // they're indistinguishable.
        assert!(abstraction.states_are_equivalent(&m, 0, 2));
    }

    #[test]
    fn refine_increases_bound_by_configured_increment() {
        let m = chain();
        let x = chain();
        let mut abstraction = FiniteLengthAbstraction::new(1, LanguageFlavor::State, Direction::Forward, BoundIncrement::X, false);
        abstraction.refine(&m, &x);
        assert_eq!(abstraction.bound(), 1 + x.num_states());
    }

    #[test]
    fn halved_increment_rounds_down_but_never_to_zero() {
        let m = chain();
        let x = chain();
        let mut abstraction = FiniteLengthAbstraction::new(1, LanguageFlavor::State, Direction::Forward, BoundIncrement::One, true);
        abstraction.refine(&m, &x);
        assert_eq!(abstraction.bound(), 2); // 1 + max(1/2, 1) = 2
    }
}
