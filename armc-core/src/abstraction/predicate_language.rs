//! §4.5.1 predicate-language abstraction: states of `M` are equivalent when
//! they carry the same "signature" against a family `Π` of predicate
//! automata — the set of `(p, r)` pairs whose state language intersects
//! `M`'s state language at that state, computed by fixed-point propagation
//! over a shared work-list rather than recursion (§9).

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::sfa::Sfa;

use super::{reverse_adjacency, Abstraction, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    ImportantStates,
    KeyStates,
}

/// A signature: the set of `(predicate automaton index, its state)` pairs a
/// state of `M` is linked to.
type Signature = BTreeSet<(usize, usize)>;

pub struct PredicateLanguageAbstraction {
    predicates: Vec<Sfa>,
    /// States of `predicates[i]` to exclude from propagation and seeding,
    /// persisted once decided at refinement time (§4.5.1 "ignored set").
    ignored: Vec<BTreeSet<usize>>,
    direction: Direction,
    heuristic: Option<Heuristic>,
}

impl PredicateLanguageAbstraction {
    pub fn new(seed: Vec<Sfa>, direction: Direction, heuristic: Option<Heuristic>) -> Self {
        let ignored = seed.iter().map(|_| BTreeSet::new()).collect();
        Self {
            predicates: seed,
            ignored,
            direction,
            heuristic,
        }
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    fn propagate_one(&self, m: &Sfa, m_rev: &[Vec<(crate::predicate::Predicate, usize)>], p_idx: usize) -> HashSet<(usize, usize)> {
        let algebra = m.algebra();
        let p = &self.predicates[p_idx];
        let p_rev = reverse_adjacency(p);
        let ignored = &self.ignored[p_idx];

        let seeds: Vec<(usize, usize)> = match self.direction {
            Direction::Forward => m
                .accepting_states()
                .flat_map(|fm| p.accepting_states().map(move |fp| (fm, fp)))
                .collect(),
            Direction::Backward => vec![(m.initial_state(), p.initial_state())],
        };

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut queue = VecDeque::new();
        for (sm, sp) in seeds {
            if ignored.contains(&sp) {
                continue;
            }
            if seen.insert((sm, sp)) {
                queue.push_back((sm, sp));
            }
        }

        while let Some((sm, sp)) = queue.pop_front() {
            let (m_edges, p_edges): (&[(crate::predicate::Predicate, usize)], &[(crate::predicate::Predicate, usize)]) =
                match self.direction {
                    Direction::Forward => (&m_rev[sm], &p_rev[sp]),
                    Direction::Backward => (m.out_edges(sm), p.out_edges(sp)),
                };
            for (pm, tm) in m_edges {
                for (pp, tp) in p_edges {
                    if ignored.contains(tp) {
                        continue;
                    }
                    let conj = algebra.and(pm, pp);
                    if algebra.satisfiable(&conj) && seen.insert((*tm, *tp)) {
                        queue.push_back((*tm, *tp));
                    }
                }
            }
        }
        seen
    }

    /// `λ : states(M) → 𝒫(states(predicateUnion))`.
    fn compute_labelling(&self, m: &Sfa) -> Vec<Signature> {
        let m_rev = reverse_adjacency(m);
        let mut lambda = vec![BTreeSet::new(); m.num_states()];
        for p_idx in 0..self.predicates.len() {
            for (sm, sp) in self.propagate_one(m, &m_rev, p_idx) {
                lambda[sm].insert((p_idx, sp));
            }
        }
        lambda
    }
}

impl Abstraction for PredicateLanguageAbstraction {
    fn collapse(&self, m: &Sfa) -> Sfa {
        let lambda = self.compute_labelling(m);
        m.collapse(|_, a, b| lambda[a] == lambda[b])
    }

    fn states_are_equivalent(&self, m: &Sfa, q: usize, q_prime: usize) -> bool {
        let lambda = self.compute_labelling(m);
        lambda[q] == lambda[q_prime]
    }

    /// Appends `X` to `Π`; if a heuristic is configured, decides which
    /// states of `X` may be ignored during future collapses (§4.5.1
    /// "Refinement heuristics").
    fn refine(&mut self, m: &Sfa, x: &Sfa) {
        let idx = self.predicates.len();
        self.predicates.push(x.clone());
        self.ignored.push(BTreeSet::new());

        let Some(heuristic) = self.heuristic else {
            return;
        };

        let lambda = self.compute_labelling(m);
        let important: BTreeSet<usize> = lambda
            .iter()
            .flat_map(|sig| sig.iter().filter(|(p, _)| *p == idx).map(|(_, s)| *s))
            .collect();
        let all_states: BTreeSet<usize> = (0..x.num_states()).collect();
        let unimportant: BTreeSet<usize> = all_states.difference(&important).copied().collect();

        match heuristic {
            Heuristic::ImportantStates => {
                self.ignored[idx] = unimportant;
            }
            Heuristic::KeyStates => {
                if !self.try_key_states(m, x, idx, &important, &all_states) {
                    log::warn!(
                        "KeyStates heuristic found no witnessing state or pair for predicate automaton {idx}, falling back to ImportantStates"
                    );
                    self.ignored[idx] = unimportant;
                }
            }
        }
    }
}

impl PredicateLanguageAbstraction {
    /// Looks for a single `important` state (or, failing that, an unordered
    /// pair) such that ignoring every other important state still yields
    /// `Collapse(M) ∩ X = ∅`. Mutates `self.ignored[idx]` with the winning
    /// candidate and returns whether one was found.
    fn try_key_states(&mut self, m: &Sfa, x: &Sfa, idx: usize, important: &BTreeSet<usize>, all_states: &BTreeSet<usize>) -> bool {
        let important: Vec<usize> = important.iter().copied().collect();

        for &k in &important {
            let mut candidate = all_states.clone();
            candidate.remove(&k);
            self.ignored[idx] = candidate;
            if self.collapse(m).product_is_empty(x).unwrap_or(false) {
                return true;
            }
        }

        for i in 0..important.len() {
            for j in (i + 1)..important.len() {
                let mut candidate = all_states.clone();
                candidate.remove(&important[i]);
                candidate.remove(&important[j]);
                self.ignored[idx] = candidate;
                if self.collapse(m).product_is_empty(x).unwrap_or(false) {
                    return true;
                }
            }
        }

        false
    }
}
