//! §4.1 predicate algebra: a boolean algebra on subsets of Σ, represented
//! compactly as `(kind, S)` pairs so that a predicate over a huge alphabet
//! never needs to materialise the huge side of the set it denotes.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::alphabet::Alphabet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    In,
    NotIn,
}

/// A finite representation of a subset of Σ: either the set itself (`In`)
/// or its complement (`NotIn`). Structurally distinct predicates may denote
/// the same set — comparisons must go through [`PredicateAlgebra::equivalent`],
/// never `==` (predicates are non-extensional, §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    kind: Kind,
    symbols: Rc<BTreeSet<usize>>,
}

impl Predicate {
    fn new(kind: Kind, symbols: BTreeSet<usize>) -> Self {
        Self {
            kind,
            symbols: Rc::new(symbols),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The raw `S` half of `(kind, S)`, in whichever sense `kind` gives it
    /// (inclusion set for `In`, excluded set for `NotIn`).
    pub fn raw_set(&self) -> &BTreeSet<usize> {
        &self.symbols
    }
}

/// The predicate algebra over a fixed alphabet Σ. One instance is shared by
/// every automaton built over the same Σ (see [`crate::alphabet::AlgebraRegistry`]).
pub struct PredicateAlgebra {
    alphabet: Alphabet,
}

impl PredicateAlgebra {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// `TRUE = (NOT_IN, ∅)`. An associated-constant-like accessor kept as a
    /// method since it depends on no per-instance state beyond Σ itself
    /// (§9 resolves `True`/`False` to behave as algebra-level constants).
    pub fn tru(&self) -> Predicate {
        Predicate::new(Kind::NotIn, BTreeSet::new())
    }

    /// `FALSE = (IN, ∅)`.
    pub fn fals(&self) -> Predicate {
        Predicate::new(Kind::In, BTreeSet::new())
    }

    pub fn symbol(&self, idx: usize) -> Predicate {
        Predicate::new(Kind::In, BTreeSet::from([idx]))
    }

    pub fn from_inclusive_indices(&self, indices: impl IntoIterator<Item = usize>) -> Predicate {
        Predicate::new(Kind::In, indices.into_iter().collect())
    }

    pub fn from_exclusive_indices(&self, indices: impl IntoIterator<Item = usize>) -> Predicate {
        Predicate::new(Kind::NotIn, indices.into_iter().collect())
    }

    pub fn not(&self, p: &Predicate) -> Predicate {
        let kind = match p.kind {
            Kind::In => Kind::NotIn,
            Kind::NotIn => Kind::In,
        };
        Predicate::new(kind, (*p.symbols).clone())
    }

    pub fn and(&self, p: &Predicate, q: &Predicate) -> Predicate {
        match (p.kind, q.kind) {
            (Kind::In, Kind::In) => {
                Predicate::new(Kind::In, p.symbols.intersection(&q.symbols).copied().collect())
            }
            (Kind::In, Kind::NotIn) => {
                Predicate::new(Kind::In, p.symbols.difference(&q.symbols).copied().collect())
            }
            (Kind::NotIn, Kind::In) => {
                Predicate::new(Kind::In, q.symbols.difference(&p.symbols).copied().collect())
            }
            (Kind::NotIn, Kind::NotIn) => {
                Predicate::new(Kind::NotIn, p.symbols.union(&q.symbols).copied().collect())
            }
        }
    }

    pub fn or(&self, p: &Predicate, q: &Predicate) -> Predicate {
        self.not(&self.and(&self.not(p), &self.not(q)))
    }

    pub fn sub(&self, p: &Predicate, q: &Predicate) -> Predicate {
        self.and(p, &self.not(q))
    }

    /// Symmetric difference `△`, derived from `∧, ∨, ¬` per §4.1.
    pub fn xor(&self, p: &Predicate, q: &Predicate) -> Predicate {
        self.or(&self.sub(p, q), &self.sub(q, p))
    }

    pub fn satisfiable(&self, p: &Predicate) -> bool {
        match p.kind {
            Kind::In => !p.symbols.is_empty(),
            Kind::NotIn => p.symbols.len() < self.alphabet.len(),
        }
    }

    /// `⟦P⟧ ∩ Σ` materialised as a finite set of alphabet indices.
    pub fn inclusive_set(&self, p: &Predicate) -> BTreeSet<usize> {
        match p.kind {
            Kind::In => (*p.symbols).clone(),
            Kind::NotIn => (0..self.alphabet.len()).filter(|i| !p.symbols.contains(i)).collect(),
        }
    }

    pub fn equivalent(&self, p: &Predicate, q: &Predicate) -> bool {
        self.inclusive_set(p) == self.inclusive_set(q)
    }

    pub fn implies(&self, p: &Predicate, q: &Predicate) -> bool {
        self.inclusive_set(p).is_subset(&self.inclusive_set(q))
    }

    /// Pick the representation ( `In` vs `NotIn` ) with the smaller backing set.
    pub fn simplify(&self, p: &Predicate) -> Predicate {
        let inclusive = self.inclusive_set(p);
        let complement_len = self.alphabet.len() - inclusive.len();
        if inclusive.len() <= complement_len {
            Predicate::new(Kind::In, inclusive)
        } else {
            let complement: BTreeSet<usize> =
                (0..self.alphabet.len()).filter(|i| !inclusive.contains(i)).collect();
            Predicate::new(Kind::NotIn, complement)
        }
    }

    /// Enumerate all non-empty intersections of each `Pᵢ` or its complement
    /// (the partition of Σ the predicates jointly induce). Implemented as
    /// iterative partition refinement, the same technique the predecessor
    /// crate's Hopcroft-style DFA minimisation uses on state partitions
    /// (`Dfa::state_equivalence_classes_idx`), applied here to symbol sets
    /// instead of state sets.
    pub fn minterms(&self, predicates: &[Predicate]) -> Vec<Predicate> {
        let mut classes: Vec<BTreeSet<usize>> = vec![(0..self.alphabet.len()).collect()];
        for p in predicates {
            let included = self.inclusive_set(p);
            let mut refined = Vec::with_capacity(classes.len() * 2);
            for class in classes {
                let inside: BTreeSet<usize> = class.intersection(&included).copied().collect();
                let outside: BTreeSet<usize> = class.difference(&included).copied().collect();
                if !inside.is_empty() {
                    refined.push(inside);
                }
                if !outside.is_empty() {
                    refined.push(outside);
                }
            }
            classes = refined;
        }
        classes.into_iter().map(|c| Predicate::new(Kind::In, c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn algebra() -> PredicateAlgebra {
        PredicateAlgebra::new(Alphabet::from_strs(["a", "b", "c"]))
    }

    #[test]
    fn not_flips_kind_and_preserves_set() {
        let alg = algebra();
        let p = alg.symbol(0);
        let not_p = alg.not(&p);
        assert_eq!(not_p.kind(), Kind::NotIn);
        assert_eq!(not_p.raw_set(), p.raw_set());
    }

    #[test]
    fn and_or_soundness_over_inclusive_sets() {
        let alg = algebra();
        let p = alg.from_inclusive_indices([0, 1]);
        let q = alg.from_inclusive_indices([1, 2]);
        let and = alg.and(&p, &q);
        let or = alg.or(&p, &q);
        assert_eq!(alg.inclusive_set(&and), BTreeSet::from([1]));
        assert_eq!(alg.inclusive_set(&or), BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn satisfiable_matches_inclusive_set_nonempty() {
        let alg = algebra();
        assert!(!alg.satisfiable(&alg.fals()));
        assert!(alg.satisfiable(&alg.tru()));
        let full_complement = alg.from_exclusive_indices([0, 1, 2]);
        assert!(!alg.satisfiable(&full_complement));
    }

    #[test]
    fn minterms_partition_the_alphabet() {
        let alg = algebra();
        let p = alg.from_inclusive_indices([0, 1]);
        let q = alg.from_inclusive_indices([1, 2]);
        let minterms = alg.minterms(&[p, q]);
        let mut seen = BTreeSet::new();
        for m in &minterms {
            let s = alg.inclusive_set(m);
            assert!(s.is_disjoint(&seen));
            seen.extend(s);
        }
        assert_eq!(seen, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn simplify_picks_smaller_side() {
        let alg = algebra();
        let p = alg.from_exclusive_indices([0]); // denotes {1,2}, complement has size 1
        let simplified = alg.simplify(&p);
        assert_eq!(simplified.kind(), Kind::NotIn);
        assert_eq!(simplified.raw_set().len(), 1);
    }
}
