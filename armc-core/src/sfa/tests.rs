use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use super::*;
use crate::alphabet::Alphabet;
use crate::predicate::PredicateAlgebra;

fn algebra(symbols: &[&str]) -> Rc<PredicateAlgebra> {
    Rc::new(PredicateAlgebra::new(Alphabet::from_strs(symbols.iter().copied())))
}

fn sym(s: &str) -> Symbol {
    Rc::from(s)
}

/// A single-state automaton accepting `{symbol}*`.
fn star_of(algebra: &Rc<PredicateAlgebra>, idx: usize) -> Sfa {
    let p = algebra.symbol(idx);
    let states = vec![SfaState { name: None, accepting: true }];
    let transitions = vec![vec![(p, 0)]];
    let epsilon = vec![Vec::new()];
    Sfa::raw(algebra.clone(), 0, states, transitions, epsilon, None).unwrap()
}

/// Accepts exactly the single word `[symbol]`.
fn single_word(algebra: &Rc<PredicateAlgebra>, idx: usize) -> Sfa {
    let p = algebra.symbol(idx);
    let states = vec![
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: true },
    ];
    let transitions = vec![vec![(p, 1)], vec![]];
    let epsilon = vec![Vec::new(), Vec::new()];
    Sfa::raw(algebra.clone(), 0, states, transitions, epsilon, None).unwrap()
}

#[test]
fn product_of_disjoint_stars_accepts_only_epsilon() {
    let alg = algebra(&["a", "b"]);
    let a_star = star_of(&alg, 0);
    let b_star = star_of(&alg, 1);
    let product = a_star.product(&b_star).unwrap();
    assert!(product.accepts(&[]));
    assert!(!product.accepts(&[sym("a")]));
    assert!(!product.accepts(&[sym("b")]));
}

#[test]
fn sum_accepts_union_of_languages() {
    let alg = algebra(&["a", "b"]);
    let a_word = single_word(&alg, 0);
    let b_word = single_word(&alg, 1);
    let union = a_word.sum(&b_word).unwrap();
    assert!(union.accepts(&[sym("a")]));
    assert!(union.accepts(&[sym("b")]));
    assert!(!union.accepts(&[]));
    assert!(!union.accepts(&[sym("a"), sym("b")]));
}

#[test]
fn complement_flips_acceptance() {
    let alg = algebra(&["a", "b"]);
    let a_star = star_of(&alg, 0);
    let complement = a_star.complement().unwrap();
    assert!(!complement.accepts(&[sym("a")]));
    assert!(!complement.accepts(&[]));
    assert!(complement.accepts(&[sym("b")]));
    assert!(complement.accepts(&[sym("a"), sym("b")]));
}

#[test]
fn difference_removes_shared_words() {
    let alg = algebra(&["a", "b"]);
    let a_star = star_of(&alg, 0);
    let single_a = single_word(&alg, 0);
    let diff = a_star.difference(&single_a).unwrap();
    assert!(diff.accepts(&[])); // epsilon still in a* but not in {a}
    assert!(!diff.accepts(&[sym("a")]));
}

#[test]
fn determinize_preserves_language() {
    let alg = algebra(&["a"]);
    let p = alg.symbol(0);
    // Nondeterministic: two parallel edges on 'a' from the initial state.
    let states = vec![
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: true },
        SfaState { name: None, accepting: true },
    ];
    let transitions = vec![vec![(p.clone(), 1), (p, 2)], vec![], vec![]];
    let epsilon = vec![Vec::new(); 3];
    let nfa = Sfa::raw(alg, 0, states, transitions, epsilon, None).unwrap();
    let dfa = nfa.determinize();
    assert!(dfa.accepts(&[sym("a")]));
    assert!(!dfa.accepts(&[]));
    assert!(!dfa.accepts(&[sym("a"), sym("a")]));
}

#[test]
fn minimize_preserves_language_and_shrinks() {
    let alg = algebra(&["a"]);
    let p = alg.symbol(0);
    // Three equivalent states in a chain that should collapse once minimized+total.
    let states = vec![
        SfaState { name: None, accepting: true },
        SfaState { name: None, accepting: true },
        SfaState { name: None, accepting: true },
    ];
    let transitions = vec![vec![(p.clone(), 1)], vec![(p.clone(), 2)], vec![(p, 0)]];
    let epsilon = vec![Vec::new(); 3];
    let sfa = Sfa::raw(alg, 0, states, transitions, epsilon, None).unwrap();
    let minimized = sfa.minimize();
    assert!(minimized.num_states() <= sfa.num_states() + 1); // +1 for a possible sink, never grows the live part
    assert!(minimized.accepts(&[]));
    assert!(minimized.accepts(&[sym("a")]));
    assert!(minimized.accepts(&[sym("a"), sym("a")]));
}

#[test]
fn equivalent_to_detects_real_difference() {
    let alg = algebra(&["a", "b"]);
    let a_star = star_of(&alg, 0);
    let single_a = single_word(&alg, 0);
    match a_star.equivalent_to(&single_a).unwrap() {
        Equivalence::Equivalent => panic!("a* should not equal {{a}}"),
        Equivalence::NotEquivalent { witness } => {
            // epsilon (accepted by a*, not by {a}) is the shortest witness
            assert!(witness.is_empty());
        }
    }
}

#[test]
fn equivalent_to_confirms_equal_languages() {
    let alg = algebra(&["a"]);
    let a_star_1 = star_of(&alg, 0);
    let a_star_2 = star_of(&alg, 0).determinize().minimize();
    assert!(matches!(a_star_1.equivalent_to(&a_star_2).unwrap(), Equivalence::Equivalent));
}

#[test]
fn normalize_preserves_language() {
    let alg = algebra(&["a"]);
    let sfa = single_word(&alg, 0);
    let normalized = sfa.normalize(5);
    assert!(normalized.accepts(&[sym("a")]));
    assert!(!normalized.accepts(&[]));
}

#[test]
fn bounded_language_caps_word_length() {
    let alg = algebra(&["a"]);
    let a_star = star_of(&alg, 0);
    let bounded = a_star.bounded_language(2);
    assert!(bounded.accepts(&[]));
    assert!(bounded.accepts(&[sym("a")]));
    assert!(bounded.accepts(&[sym("a"), sym("a")]));
    assert!(!bounded.accepts(&[sym("a"), sym("a"), sym("a")]));
}

#[test]
fn collapse_only_grows_the_language() {
    let alg = algebra(&["a", "b"]);
    let a_word = single_word(&alg, 0);
    let b_word = single_word(&alg, 1);
    let both = a_word.sum(&b_word).unwrap();
    // Collapse everything into a single class: massively over-approximates.
    let collapsed = both.collapse(|_, _, _| true);
    assert!(collapsed.accepts(&[sym("a")]));
    assert!(collapsed.accepts(&[sym("b")]));
    // Original, un-collapsed automaton must remain untouched (value semantics).
    assert!(!both.accepts(&[sym("a"), sym("b")]));
}

#[test]
fn prefix_language_accepts_every_prefix() {
    let alg = algebra(&["a"]);
    let p = alg.symbol(0);
    let states = vec![
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: true },
    ];
    let transitions = vec![vec![(p.clone(), 1)], vec![(p, 2)], vec![]];
    let epsilon = vec![Vec::new(); 3];
    let sfa = Sfa::raw(alg, 0, states, transitions, epsilon, None).unwrap();
    let prefixes = sfa.prefix_language();
    assert!(prefixes.accepts(&[]));
    assert!(prefixes.accepts(&[sym("a")]));
    assert!(prefixes.accepts(&[sym("a"), sym("a")]));
}

#[test]
fn rebind_translates_predicates_through_symbol_names() {
    // Built over {b}; rebound onto a merged algebra where "b" sorts to index 1.
    let small = algebra(&["b"]);
    let accepts_b = star_of(&small, 0);
    assert!(accepts_b.accepts(&[sym("b")]));

    let merged = algebra(&["a", "b"]);
    let rebound = accepts_b.rebind(&merged);
    assert!(Rc::ptr_eq(rebound.algebra(), &merged));
    assert!(rebound.accepts(&[sym("b")]));
    assert!(!rebound.accepts(&[sym("a")]));
}

/// A handful of automata shared across tests instead of rebuilt per-test.
struct Examples {
    a_star: Sfa,
    single_a: Sfa,
}

lazy_static! {
    static ref EXAMPLES: Examples = {
        let alg = algebra(&["a", "b"]);
        Examples {
            a_star: star_of(&alg, 0),
            single_a: single_word(&alg, 0),
        }
    };
}

#[test]
fn examples_a_star_accepts_every_length_of_a() {
    assert!(EXAMPLES.a_star.accepts(&[]));
    assert!(EXAMPLES.a_star.accepts(&[sym("a")]));
    assert!(EXAMPLES.a_star.accepts(&[sym("a"), sym("a"), sym("a")]));
    assert!(!EXAMPLES.a_star.accepts(&[sym("b")]));
}

#[test]
fn examples_single_a_rejects_empty_and_repeats() {
    assert!(!EXAMPLES.single_a.accepts(&[]));
    assert!(EXAMPLES.single_a.accepts(&[sym("a")]));
    assert!(!EXAMPLES.single_a.accepts(&[sym("a"), sym("a")]));
}

/// Exhaustively checks an SFA for `a(ba)*` against Rust's own regex engine
/// over every string of length `0..=6` on `{a,b}`, as an acceptance oracle
/// independent of this crate's own automaton algebra.
#[test]
fn regex_oracle_agrees_with_sfa_acceptance() {
    let alg = algebra(&["a", "b"]);
    let a = alg.symbol(0);
    let b = alg.symbol(1);
    let states = vec![
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: true },
        SfaState { name: None, accepting: false },
    ];
    let transitions = vec![vec![(a.clone(), 1)], vec![(b, 2)], vec![(a, 1)]];
    let epsilon = vec![Vec::new(); 3];
    let sfa = Sfa::raw(alg, 0, states, transitions, epsilon, None).unwrap();

    let oracle = Regex::new("^a(ba)*$").unwrap();

    for word in all_words_up_to(&["a", "b"], 6) {
        let symbols: Vec<Symbol> = word.iter().map(|s| sym(*s)).collect();
        let text: String = word.concat();
        assert_eq!(sfa.accepts(&symbols), oracle.is_match(&text), "word {text:?}");
    }
}

/// Every string over `alphabet` of length `0..=max_len`, shortest first.
fn all_words_up_to<'a>(alphabet: &[&'a str], max_len: usize) -> Vec<Vec<&'a str>> {
    let mut words = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for word in &frontier {
            for &letter in alphabet {
                let mut extended = word.clone();
                extended.push(letter);
                next.push(extended);
            }
        }
        words.extend(next.iter().cloned());
        frontier = next;
    }
    words
}

#[test]
fn reverse_reverses_accepted_words() {
    let alg = algebra(&["a", "b"]);
    let a = alg.symbol(0);
    let b = alg.symbol(1);
    let states = vec![
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: false },
        SfaState { name: None, accepting: true },
    ];
    let transitions = vec![vec![(a, 1)], vec![(b, 2)], vec![]];
    let epsilon = vec![Vec::new(); 3];
    let sfa = Sfa::raw(alg, 0, states, transitions, epsilon, None).unwrap();
    assert!(sfa.accepts(&[sym("a"), sym("b")]));
    let reversed = sfa.reverse();
    assert!(reversed.accepts(&[sym("b"), sym("a")]));
    assert!(!reversed.accepts(&[sym("a"), sym("b")]));
}
