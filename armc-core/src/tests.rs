//! Property-based suite over randomly generated [`sfa::Sfa`]s, adapted from
//! the predecessor crate's own `prop_compose!` DFA/NFA generators (see
//! `dfa_minimize_eq`, `dfa_self_union`, `binary_dfa_ops` there) but built
//! directly via `Sfa::raw` over a small fixed alphabet instead of through
//! the text-table parser, since symbolic automata have no direct
//! counterpart to that table syntax.

use std::rc::Rc;

use proptest::prelude::*;

use crate::alphabet::{Alphabet, Symbol};
use crate::predicate::PredicateAlgebra;
use crate::sfa::{Equivalence, Move, Sfa, SfaState};

const ALPHABET: [&str; 4] = ["a", "b", "c", "d"];

fn fixed_algebra() -> Rc<PredicateAlgebra> {
    Rc::new(PredicateAlgebra::new(Alphabet::from_strs(ALPHABET)))
}

/// A random word over the fixed test alphabet, for `accepts`-based checks.
fn word() -> impl Strategy<Value = Vec<Symbol>> {
    prop::collection::vec(0..ALPHABET.len(), 0..8)
        .prop_map(|indices| indices.into_iter().map(|i| Rc::from(ALPHABET[i])).collect())
}

prop_compose! {
    fn random_sfa(max_states: usize)
        (num_states in 1..max_states)
        (
            initial in 0..num_states,
            accepting in prop::collection::vec(any::<bool>(), num_states),
            // Each state gets 0..=2 outgoing moves, each on a single random symbol.
            transitions in prop::collection::vec(
                prop::collection::vec((0..ALPHABET.len(), 0..num_states), 0..3),
                num_states
            )
        )
    -> Sfa {
        let algebra = fixed_algebra();
        let states: Vec<SfaState> = accepting
            .into_iter()
            .map(|accepting| SfaState { name: None, accepting })
            .collect();
        let transitions: Vec<Vec<Move>> = transitions
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(sym_idx, target)| (algebra.symbol(sym_idx), target))
                    .collect()
            })
            .collect();
        let epsilon = vec![Vec::new(); num_states];
        Sfa::raw(algebra, initial, states, transitions, epsilon, None).unwrap()
    }
}

fn assert_equivalent(a: &Sfa, b: &Sfa, context: &str) {
    match a.equivalent_to(b).unwrap() {
        Equivalence::Equivalent => {}
        Equivalence::NotEquivalent { witness } => {
            panic!("{context}: languages differ, witness = {witness:?}");
        }
    }
}

proptest! {
    /// Intersecting an automaton with itself never changes its language.
    #[test]
    fn sfa_self_intersection(sfa in random_sfa(15)) {
        let product = sfa.product(&sfa).unwrap();
        assert_equivalent(&product, &sfa, "self-intersection");
    }

    /// Union-ing an automaton with itself never changes its language.
    #[test]
    fn sfa_self_union(sfa in random_sfa(15)) {
        let sum = sfa.sum(&sfa).unwrap();
        assert_equivalent(&sum, &sfa, "self-union");
    }

    /// Determinizing never changes the accepted language.
    #[test]
    fn sfa_determinize_preserves_language(sfa in random_sfa(12)) {
        let det = sfa.determinize();
        assert_equivalent(&sfa, &det, "determinize");
    }

    /// Minimizing never changes the accepted language.
    #[test]
    fn sfa_minimize_preserves_language(sfa in random_sfa(10)) {
        let minimized = sfa.minimize();
        assert_equivalent(&sfa, &minimized, "minimize");
    }

    /// Complementing twice returns to the original language.
    #[test]
    fn sfa_double_complement(sfa in random_sfa(10)) {
        let twice = sfa.complement().unwrap().complement().unwrap();
        assert_equivalent(&sfa, &twice, "double complement");
    }

    /// `product`/`sum`/`difference` agree pointwise with boolean combinations
    /// of `accepts` on concrete words, the way the predecessor crate checks
    /// its own `intersection`/`union`/`difference` against `accepts_graphemes`.
    #[test]
    fn sfa_binary_ops_agree_with_accepts(
        lhs in random_sfa(10),
        rhs in random_sfa(10),
        words in prop::collection::vec(word(), 20)
    ) {
        let intersection = lhs.product(&rhs).unwrap();
        let union = lhs.sum(&rhs).unwrap();
        let difference = lhs.difference(&rhs).unwrap();
        for w in &words {
            let l = lhs.accepts(w);
            let r = rhs.accepts(w);
            prop_assert_eq!(intersection.accepts(w), l && r);
            prop_assert_eq!(union.accepts(w), l || r);
            prop_assert_eq!(difference.accepts(w), l && !r);
        }
    }

    /// Reversing twice returns to the original language (over words, since
    /// `reverse` renumbers states and isn't expected to be structurally
    /// idempotent).
    #[test]
    fn sfa_double_reverse_preserves_accepts(sfa in random_sfa(10), words in prop::collection::vec(word(), 20)) {
        let twice = sfa.reverse().reverse();
        for w in &words {
            prop_assert_eq!(sfa.accepts(w), twice.accepts(w));
        }
    }

    /// `bounded_language(n)` only ever removes words, never adds any.
    #[test]
    fn sfa_bounded_language_is_a_subset(sfa in random_sfa(10), words in prop::collection::vec(word(), 20)) {
        let bounded = sfa.bounded_language(4);
        for w in &words {
            if bounded.accepts(w) {
                prop_assert!(sfa.accepts(w));
                prop_assert!(w.len() <= 4);
            }
        }
    }
}
