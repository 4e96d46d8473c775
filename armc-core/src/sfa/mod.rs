//! §4.3 Symbolic Finite Automaton: an NFA whose edges are labelled by
//! predicates over a shared Σ instead of single symbols. Automata are
//! value-like (§3 "Lifecycle") — every operation below returns a fresh
//! [`Sfa`] and leaves its receiver(s) untouched, the same contract the
//! predecessor crate's `Nfa`/`Dfa` operators follow.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

use crate::alphabet::Symbol;
use crate::error::SfaError;
use crate::predicate::{Predicate, PredicateAlgebra};

pub mod parse;
pub mod words;

#[derive(Debug, Clone)]
pub struct SfaState {
    pub name: Option<Rc<str>>,
    pub accepting: bool,
}

/// An outgoing predicate-labelled move.
pub type Move = (Predicate, usize);

/// A symbolic finite automaton over a shared [`PredicateAlgebra`].
#[derive(Clone)]
pub struct Sfa {
    algebra: Rc<PredicateAlgebra>,
    initial: usize,
    states: Vec<SfaState>,
    transitions: Vec<Vec<Move>>,
    epsilon: Vec<Vec<usize>>,
    name: Option<Rc<str>>,
}

pub enum Equivalence {
    Equivalent,
    NotEquivalent { witness: Vec<Symbol> },
}

impl Sfa {
    /// Raw constructor used by the parser and by every operation below. Does
    /// **not** trim unreachable/dead states — callers that build an
    /// automaton straight from user input must call [`Sfa::trim`].
    pub(crate) fn raw(
        algebra: Rc<PredicateAlgebra>,
        initial: usize,
        states: Vec<SfaState>,
        transitions: Vec<Vec<Move>>,
        epsilon: Vec<Vec<usize>>,
        name: Option<Rc<str>>,
    ) -> Result<Self, SfaError> {
        if states.is_empty() {
            return Err(SfaError::NoStates);
        }
        if initial >= states.len() {
            return Err(SfaError::StateNotInStates(initial));
        }
        for row in &transitions {
            for (_, target) in row {
                if *target >= states.len() {
                    return Err(SfaError::StateNotInStates(*target));
                }
            }
        }
        for row in &epsilon {
            for target in row {
                if *target >= states.len() {
                    return Err(SfaError::StateNotInStates(*target));
                }
            }
        }
        Ok(Self {
            algebra,
            initial,
            states,
            transitions,
            epsilon,
            name,
        })
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn algebra(&self) -> &Rc<PredicateAlgebra> {
        &self.algebra
    }

    pub fn initial_state(&self) -> usize {
        self.initial
    }

    pub fn name(&self) -> Option<&Rc<str>> {
        self.name.as_ref()
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    pub fn accepting_states(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.states.len()).filter(|s| self.states[*s].accepting)
    }

    pub fn out_edges(&self, state: usize) -> &[Move] {
        &self.transitions[state]
    }

    pub fn epsilon_edges(&self, state: usize) -> &[usize] {
        &self.epsilon[state]
    }

    pub fn has_epsilon_moves(&self) -> bool {
        self.epsilon.iter().any(|e| !e.is_empty())
    }

    fn same_algebra(&self, other: &Sfa) -> Result<(), SfaError> {
        if Rc::ptr_eq(&self.algebra, &other.algebra) {
            return Ok(());
        }
        let a: Vec<String> = self.algebra.alphabet().iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = other.algebra.alphabet().iter().map(|s| s.to_string()).collect();
        if a == b {
            return Ok(());
        }
        Err(SfaError::IncompatibleAlphabets(a, b))
    }

    /// Reachable states from the initial state, following satisfiable
    /// predicate edges and epsilon edges, via an explicit work-list (§9:
    /// graph traversals never recurse).
    pub fn reachable_states(&self) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(self.initial);
        queue.push_back(self.initial);
        while let Some(s) = queue.pop_front() {
            for (p, t) in &self.transitions[s] {
                if self.algebra.satisfiable(p) && seen.insert(*t) {
                    queue.push_back(*t);
                }
            }
            for t in &self.epsilon[s] {
                if seen.insert(*t) {
                    queue.push_back(*t);
                }
            }
        }
        seen
    }

    /// States that can reach an accepting state (co-reachability), via
    /// reverse adjacency built once and then BFS'd with a work-list.
    pub fn co_reachable_states(&self) -> BTreeSet<usize> {
        let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
        for (s, row) in self.transitions.iter().enumerate() {
            for (p, t) in row {
                if self.algebra.satisfiable(p) {
                    reverse[*t].push(s);
                }
            }
        }
        for (s, row) in self.epsilon.iter().enumerate() {
            for t in row {
                reverse[*t].push(s);
            }
        }
        let mut seen: BTreeSet<usize> = self.accepting_states().collect();
        let mut queue: VecDeque<usize> = seen.iter().copied().collect();
        while let Some(s) = queue.pop_front() {
            for &pred in &reverse[s] {
                if seen.insert(pred) {
                    queue.push_back(pred);
                }
            }
        }
        seen
    }

    /// Rebinds this automaton onto a different algebra (typically one built
    /// over a merged alphabet), translating every predicate's index set
    /// through symbol names rather than reusing raw indices, which only
    /// happen to coincide when the alphabets are identical. Used by the
    /// driver (§4.6 setup) to put `Init`, `Bad` and every `τᵢ` onto one
    /// shared Σ before the CEGAR loop runs.
    pub fn rebind(&self, new_algebra: &Rc<PredicateAlgebra>) -> Sfa {
        let old_algebra = &self.algebra;
        let remap = |p: &Predicate| -> Predicate {
            let indices: Vec<usize> = old_algebra
                .inclusive_set(p)
                .iter()
                .filter_map(|&idx| new_algebra.alphabet().index_of(old_algebra.alphabet().symbol(idx)))
                .collect();
            new_algebra.from_inclusive_indices(indices)
        };
        let transitions = self
            .transitions
            .iter()
            .map(|row| row.iter().map(|(p, t)| (remap(p), *t)).collect())
            .collect();
        Sfa {
            algebra: new_algebra.clone(),
            initial: self.initial,
            states: self.states.clone(),
            transitions,
            epsilon: self.epsilon.clone(),
            name: self.name.clone(),
        }
    }

    /// Eliminate unreachable and dead states (§3 invariant), always keeping
    /// the initial state even if it turns out dead (the result is then an
    /// automaton with empty language, not a dangling reference).
    pub fn trim(&self) -> Sfa {
        let reachable = self.reachable_states();
        let co_reachable = self.co_reachable_states();
        let mut keep: BTreeSet<usize> = reachable.intersection(&co_reachable).copied().collect();
        keep.insert(self.initial);
        let keep: Vec<usize> = keep.into_iter().collect();
        let remap: HashMap<usize, usize> = keep.iter().enumerate().map(|(new, &old)| (old, new)).collect();

        let states = keep
            .iter()
            .map(|&old| self.states[old].clone())
            .collect();
        let transitions = keep
            .iter()
            .map(|&old| {
                self.transitions[old]
                    .iter()
                    .filter_map(|(p, t)| remap.get(t).map(|&nt| (p.clone(), nt)))
                    .collect()
            })
            .collect();
        let epsilon = keep
            .iter()
            .map(|&old| {
                self.epsilon[old]
                    .iter()
                    .filter_map(|t| remap.get(t).copied())
                    .collect()
            })
            .collect();

        Sfa {
            algebra: self.algebra.clone(),
            initial: remap[&self.initial],
            states,
            transitions,
            epsilon,
            name: self.name.clone(),
        }
    }

    /// Epsilon removal via closures, then trimming.
    pub fn remove_epsilons(&self) -> Sfa {
        if !self.has_epsilon_moves() {
            return self.clone();
        }
        let closures: Vec<BTreeSet<usize>> = (0..self.states.len())
            .map(|s| self.epsilon_closure(s))
            .collect();

        let states = (0..self.states.len())
            .map(|s| SfaState {
                name: self.states[s].name.clone(),
                accepting: closures[s].iter().any(|&c| self.states[c].accepting),
            })
            .collect();

        let transitions = (0..self.states.len())
            .map(|s| {
                closures[s]
                    .iter()
                    .flat_map(|&c| self.transitions[c].iter().cloned())
                    .collect()
            })
            .collect();

        let epsilon = vec![Vec::new(); self.states.len()];

        Sfa {
            algebra: self.algebra.clone(),
            initial: self.initial,
            states,
            transitions,
            epsilon,
            name: self.name.clone(),
        }
        .trim()
    }

    /// Whether a concrete word (a sequence of alphabet symbols) is accepted.
    /// Not part of the component design's operation list — a convenience
    /// used by tests and by the CLI's counterexample pretty-printing, in
    /// the same spirit as the predecessor crate's `Nfa::accepts`.
    pub fn accepts(&self, word: &[Symbol]) -> bool {
        let mut current = self.epsilon_closure(self.initial);
        for symbol in word {
            let idx = match self.algebra.alphabet().index_of(symbol) {
                Some(i) => i,
                None => return false,
            };
            let mut next = BTreeSet::new();
            for &s in &current {
                for (p, t) in &self.transitions[s] {
                    if self.algebra.inclusive_set(p).contains(&idx) {
                        next.extend(self.epsilon_closure(*t));
                    }
                }
            }
            current = next;
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|&s| self.is_accepting(s))
    }

    fn epsilon_closure(&self, state: usize) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(state);
        queue.push_back(state);
        while let Some(s) = queue.pop_front() {
            for &t in &self.epsilon[s] {
                if seen.insert(t) {
                    queue.push_back(t);
                }
            }
        }
        seen
    }

    /// Synchronous product: `L(M1 × M2) = L(M1) ∩ L(M2)`.
    pub fn product(&self, other: &Sfa) -> Result<Sfa, SfaError> {
        self.same_algebra(other)?;
        let lhs = self.remove_epsilons();
        let rhs = other.remove_epsilons();

        let mut state_of: HashMap<(usize, usize), usize> = HashMap::new();
        let mut states = Vec::new();
        let mut transitions: Vec<Vec<Move>> = Vec::new();
        let mut queue = VecDeque::new();

        let start = (lhs.initial, rhs.initial);
        state_of.insert(start, 0);
        states.push(SfaState {
            name: None,
            accepting: lhs.is_accepting(start.0) && rhs.is_accepting(start.1),
        });
        transitions.push(Vec::new());
        queue.push_back(start);

        while let Some((a, b)) = queue.pop_front() {
            let idx = state_of[&(a, b)];
            for (pa, ta) in &lhs.transitions[a] {
                for (pb, tb) in &rhs.transitions[b] {
                    let conj = self.algebra.and(pa, pb);
                    if !self.algebra.satisfiable(&conj) {
                        continue;
                    }
                    let key = (*ta, *tb);
                    let target = *state_of.entry(key).or_insert_with(|| {
                        states.push(SfaState {
                            name: None,
                            accepting: lhs.is_accepting(key.0) && rhs.is_accepting(key.1),
                        });
                        transitions.push(Vec::new());
                        queue.push_back(key);
                        states.len() - 1
                    });
                    transitions[idx].push((conj, target));
                }
            }
        }

        let epsilon = vec![Vec::new(); states.len()];
        Sfa::raw(self.algebra.clone(), 0, states, transitions, epsilon, None).map(|s| s.trim())
    }

    /// Classical union via a fresh start state with ε-moves into both operands.
    pub fn sum(&self, other: &Sfa) -> Result<Sfa, SfaError> {
        self.same_algebra(other)?;
        let offset_b = self.states.len() + 1;
        let mut states = Vec::with_capacity(self.states.len() + other.states.len() + 1);
        states.push(SfaState {
            name: None,
            accepting: false,
        });
        states.extend(self.states.iter().cloned());
        states.extend(other.states.iter().cloned());

        let mut transitions = vec![Vec::new()];
        transitions.extend(self.transitions.iter().cloned());
        transitions.extend(other.transitions.iter().map(|row| {
            row.iter().map(|(p, t)| (p.clone(), t + offset_b)).collect()
        }));

        let mut epsilon = vec![vec![1, offset_b]];
        epsilon.extend(self.epsilon.iter().map(|row| row.iter().map(|t| t + 1).collect()));
        epsilon.extend(
            other
                .epsilon
                .iter()
                .map(|row| row.iter().map(|t| t + offset_b).collect()),
        );

        Sfa::raw(self.algebra.clone(), 0, states, transitions, epsilon, None).map(|s| s.trim())
    }

    /// `Determinize → MakeTotal → flip finality`.
    pub fn complement(&self) -> Result<Sfa, SfaError> {
        let total = self.determinize().make_total();
        let states = total
            .states
            .iter()
            .map(|s| SfaState {
                name: s.name.clone(),
                accepting: !s.accepting,
            })
            .collect();
        Sfa::raw(
            total.algebra.clone(),
            total.initial,
            states,
            total.transitions.clone(),
            total.epsilon.clone(),
            None,
        )
    }

    /// `M1 ∧ ¬M2`.
    pub fn difference(&self, other: &Sfa) -> Result<Sfa, SfaError> {
        self.product(&other.complement()?)
    }

    /// Reachability of a final state from the initial state.
    pub fn is_empty(&self) -> bool {
        self.reachable_states().iter().all(|&s| !self.is_accepting(s))
    }

    /// Hot check in the driver (§4.6): whether `L(M1) ∩ L(M2) = ∅`, computed
    /// via a direct joint BFS rather than materialising the full product.
    pub fn product_is_empty(&self, other: &Sfa) -> Result<bool, SfaError> {
        self.same_algebra(other)?;
        let lhs = self.remove_epsilons();
        let rhs = other.remove_epsilons();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        let start = (lhs.initial, rhs.initial);
        seen.insert(start);
        queue.push_back(start);
        while let Some((a, b)) = queue.pop_front() {
            if lhs.is_accepting(a) && rhs.is_accepting(b) {
                return Ok(false);
            }
            for (pa, ta) in &lhs.transitions[a] {
                for (pb, tb) in &rhs.transitions[b] {
                    let conj = self.algebra.and(pa, pb);
                    if self.algebra.satisfiable(&conj) && seen.insert((*ta, *tb)) {
                        queue.push_back((*ta, *tb));
                    }
                }
            }
        }
        Ok(true)
    }

    /// `difference` checked both ways; on inequivalence, a shortest
    /// distinguishing word is reconstructed from the BFS parent pointers.
    pub fn equivalent_to(&self, other: &Sfa) -> Result<Equivalence, SfaError> {
        let left_only = self.difference(other)?;
        if let Some(witness) = left_only.shortest_accepted_word() {
            return Ok(Equivalence::NotEquivalent { witness });
        }
        let right_only = other.difference(self)?;
        if let Some(witness) = right_only.shortest_accepted_word() {
            return Ok(Equivalence::NotEquivalent { witness });
        }
        Ok(Equivalence::Equivalent)
    }

    /// BFS for the shortest word reaching an accepting state, picking one
    /// concrete symbol per satisfiable predicate along the path. `None` if
    /// the language is empty.
    pub fn shortest_accepted_word(&self) -> Option<Vec<Symbol>> {
        let mut parent: HashMap<usize, (usize, Symbol)> = HashMap::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(self.initial);
        queue.push_back(self.initial);
        if self.is_accepting(self.initial) {
            return Some(Vec::new());
        }
        while let Some(s) = queue.pop_front() {
            for (p, t) in &self.transitions[s] {
                if seen.contains(t) {
                    continue;
                }
                if let Some(symbol) = self.witness_symbol(p) {
                    seen.insert(*t);
                    parent.insert(*t, (s, symbol));
                    if self.is_accepting(*t) {
                        return Some(self.reconstruct(*t, &parent));
                    }
                    queue.push_back(*t);
                }
            }
        }
        None
    }

    fn witness_symbol(&self, p: &Predicate) -> Option<Symbol> {
        let set = self.algebra.inclusive_set(p);
        set.iter().next().map(|&idx| self.algebra.alphabet().symbol(idx).clone())
    }

    fn reconstruct(&self, mut state: usize, parent: &HashMap<usize, (usize, Symbol)>) -> Vec<Symbol> {
        let mut word = Vec::new();
        while let Some((prev, symbol)) = parent.get(&state) {
            word.push(symbol.clone());
            state = *prev;
        }
        word.reverse();
        word
    }

    /// Minterm-based subset construction. Assumes epsilon-free input
    /// (removes epsilons defensively if present).
    pub fn determinize(&self) -> Sfa {
        let source = self.remove_epsilons();
        let mut state_of: HashMap<BTreeSet<usize>, usize> = HashMap::new();
        let mut subsets: Vec<BTreeSet<usize>> = Vec::new();
        let mut states = Vec::new();
        let mut transitions: Vec<Vec<Move>> = Vec::new();
        let mut queue = VecDeque::new();

        let start: BTreeSet<usize> = BTreeSet::from([source.initial]);
        state_of.insert(start.clone(), 0);
        subsets.push(start.clone());
        states.push(SfaState {
            name: None,
            accepting: start.iter().any(|&s| source.is_accepting(s)),
        });
        transitions.push(Vec::new());
        queue.push_back(start);

        while let Some(subset) = queue.pop_front() {
            let idx = state_of[&subset];
            let predicates: Vec<Predicate> = subset
                .iter()
                .flat_map(|&s| source.transitions[s].iter().map(|(p, _)| p.clone()))
                .collect();
            if predicates.is_empty() {
                continue;
            }
            for minterm in source.algebra.minterms(&predicates) {
                let successor: BTreeSet<usize> = subset
                    .iter()
                    .flat_map(|&s| {
                        source.transitions[s].iter().filter_map(|(p, t)| {
                            source.algebra.implies(&minterm, p).then_some(*t)
                        })
                    })
                    .collect();
                if successor.is_empty() {
                    continue;
                }
                let target = *state_of.entry(successor.clone()).or_insert_with(|| {
                    let new_idx = states.len();
                    states.push(SfaState {
                        name: None,
                        accepting: successor.iter().any(|&s| source.is_accepting(s)),
                    });
                    transitions.push(Vec::new());
                    subsets.push(successor.clone());
                    queue.push_back(successor.clone());
                    new_idx
                });
                transitions[idx].push((minterm, target));
            }
        }

        let epsilon = vec![Vec::new(); states.len()];
        Sfa::raw(self.algebra.clone(), 0, states, transitions, epsilon, None)
            .expect("subset construction preserves structural invariants")
            .trim()
    }

    /// Adds an explicit sink state so every state has a transition covering
    /// all of Σ (the disjunction of the state's existing predicates, plus
    /// its negation routed to the sink).
    pub fn make_total(&self) -> Sfa {
        let mut states = self.states.clone();
        let mut transitions = self.transitions.clone();
        let sink = states.len();
        let tru = self.algebra.tru();

        let mut needs_sink = false;
        for row in transitions.iter_mut() {
            let covered = row
                .iter()
                .fold(self.algebra.fals(), |acc, (p, _)| self.algebra.or(&acc, p));
            if !self.algebra.equivalent(&covered, &tru) {
                let remainder = self.algebra.not(&covered);
                row.push((remainder, sink));
                needs_sink = true;
            }
        }

        if !needs_sink {
            return self.clone();
        }

        states.push(SfaState {
            name: None,
            accepting: false,
        });
        transitions.push(vec![(tru, sink)]);
        let epsilon = vec![Vec::new(); states.len()];

        Sfa::raw(self.algebra.clone(), self.initial, states, transitions, epsilon, None)
            .expect("adding a sink preserves structural invariants")
    }

    /// Moore-style partition refinement: states start split by
    /// acceptance and are repeatedly refined by the class of their
    /// minterm-successors until stable, then quotiented. Assumes a
    /// determinized, total input (callers determinize first).
    pub fn minimize(&self) -> Sfa {
        let det = self.determinize().make_total();
        let n = det.states.len();
        if n <= 1 {
            return det;
        }

        let mut classes: Vec<usize> = det
            .states
            .iter()
            .map(|s| if s.accepting { 1 } else { 0 })
            .collect();

        loop {
            let all_predicates: Vec<Predicate> = det
                .transitions
                .iter()
                .flat_map(|row| row.iter().map(|(p, _)| p.clone()))
                .collect();
            let minterms = det.algebra.minterms(&all_predicates);

            let signatures: Vec<Vec<usize>> = (0..n)
                .map(|s| {
                    let mut sig = vec![classes[s]];
                    for m in &minterms {
                        let target_class = det.transitions[s]
                            .iter()
                            .find(|(p, _)| det.algebra.implies(m, p))
                            .map(|(_, t)| classes[*t]);
                        sig.push(target_class.unwrap_or(usize::MAX));
                    }
                    sig
                })
                .collect();

            let mut next_classes = vec![0usize; n];
            let mut seen: Vec<&Vec<usize>> = Vec::new();
            for s in 0..n {
                let pos = seen.iter().position(|sig| **sig == signatures[s]);
                next_classes[s] = match pos {
                    Some(p) => p,
                    None => {
                        seen.push(&signatures[s]);
                        seen.len() - 1
                    }
                };
            }

            if next_classes == classes {
                break;
            }
            classes = next_classes;
        }

        det.collapse(move |_, a, b| classes[a] == classes[b])
    }

    /// Quotient by a client-supplied equivalence: the abstraction engine
    /// (§4.3 Collapse, §4.5). `equiv` receives `(self, state_a, state_b)`.
    pub fn collapse(&self, mut equiv: impl FnMut(&Sfa, usize, usize) -> bool) -> Sfa {
        let n = self.states.len();
        let mut reps: Vec<usize> = Vec::new();
        let mut class_of = vec![0usize; n];
        for s in 0..n {
            let found = reps.iter().position(|&rep| equiv(self, s, rep));
            match found {
                Some(class) => class_of[s] = class,
                None => {
                    class_of[s] = reps.len();
                    reps.push(s);
                }
            }
        }

        let num_classes = reps.len();
        let mut states = Vec::with_capacity(num_classes);
        let mut transitions: Vec<Vec<Move>> = vec![Vec::new(); num_classes];
        let mut epsilon: Vec<Vec<usize>> = vec![Vec::new(); num_classes];

        for class in 0..num_classes {
            let accepting = (0..n)
                .filter(|&s| class_of[s] == class)
                .any(|s| self.is_accepting(s));
            states.push(SfaState { name: None, accepting });
        }

        for s in 0..n {
            let class = class_of[s];
            for (p, t) in &self.transitions[s] {
                transitions[class].push((p.clone(), class_of[*t]));
            }
            for t in &self.epsilon[s] {
                let target = class_of[*t];
                if target != class && !epsilon[class].contains(&target) {
                    epsilon[class].push(target);
                }
            }
        }

        Sfa::raw(
            self.algebra.clone(),
            class_of[self.initial],
            states,
            transitions,
            epsilon,
            self.name.clone(),
        )
        .expect("collapse preserves structural invariants")
        .trim()
    }

    /// Reverse every move; the new accepting set is `{old initial}` and the
    /// new initial state nondeterministically starts at any old accepting
    /// state (via ε-moves from a fresh state).
    pub fn reverse(&self) -> Sfa {
        let n = self.states.len();
        let fresh = n;
        let mut states = self.states.clone();
        states.push(SfaState {
            name: None,
            accepting: false,
        });
        for (idx, s) in states.iter_mut().enumerate().take(n) {
            s.accepting = idx == self.initial;
        }

        let mut transitions: Vec<Vec<Move>> = vec![Vec::new(); n + 1];
        for (s, row) in self.transitions.iter().enumerate() {
            for (p, t) in row {
                transitions[*t].push((p.clone(), s));
            }
        }

        let mut epsilon: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
        for (s, row) in self.epsilon.iter().enumerate() {
            for t in row {
                epsilon[*t].push(s);
            }
        }
        epsilon[fresh] = self.accepting_states().collect();

        Sfa::raw(self.algebra.clone(), fresh, states, transitions, epsilon, None)
            .expect("reversal preserves structural invariants")
            .trim()
    }

    /// All prefixes of accepted words: every reachable state becomes final.
    pub fn prefix_language(&self) -> Sfa {
        let reachable = self.reachable_states();
        let states = self
            .states
            .iter()
            .enumerate()
            .map(|(idx, s)| SfaState {
                name: s.name.clone(),
                accepting: reachable.contains(&idx),
            })
            .collect();
        Sfa::raw(
            self.algebra.clone(),
            self.initial,
            states,
            self.transitions.clone(),
            self.epsilon.clone(),
            None,
        )
        .expect("state-set unchanged")
        .trim()
    }

    /// All suffixes of accepted words: a fresh initial state ε-reaches every
    /// original state, acceptance unchanged.
    pub fn suffix_language(&self) -> Sfa {
        let n = self.states.len();
        let fresh = n;
        let mut states = self.states.clone();
        states.push(SfaState {
            name: None,
            accepting: false,
        });
        let mut epsilon = self.epsilon.clone();
        epsilon.push((0..n).collect());
        let mut transitions = self.transitions.clone();
        transitions.push(Vec::new());

        Sfa::raw(self.algebra.clone(), fresh, states, transitions, epsilon, None)
            .expect("adding one epsilon-connected state preserves invariants")
            .trim()
    }

    /// Renumber states so the initial state is `offset`, final states occupy
    /// the next contiguous block, and the rest follow (§4.3 Normalize).
    pub fn normalize(&self, offset: usize) -> Sfa {
        let n = self.states.len();
        let mut order = Vec::with_capacity(n);
        order.push(self.initial);
        for s in self.accepting_states() {
            if s != self.initial {
                order.push(s);
            }
        }
        for s in 0..n {
            if s != self.initial && !self.is_accepting(s) {
                order.push(s);
            }
        }

        let mut remap = HashMap::new();
        for (new_idx, &old) in order.iter().enumerate() {
            remap.insert(old, new_idx + offset);
        }

        let states: Vec<SfaState> = order.iter().map(|&old| self.states[old].clone()).collect();
        let transitions: Vec<Vec<Move>> = order
            .iter()
            .map(|&old| {
                self.transitions[old]
                    .iter()
                    .map(|(p, t)| (p.clone(), remap[t]))
                    .collect()
            })
            .collect();
        let epsilon: Vec<Vec<usize>> = order
            .iter()
            .map(|&old| self.epsilon[old].iter().map(|t| remap[t]).collect())
            .collect();

        // States are now addressed by position `offset..offset+n`; store
        // densely and let callers rely on `initial_state()`/accessor methods
        // rather than raw indices spanning a gap before `offset`.
        let _ = offset;
        Sfa::raw(self.algebra.clone(), 0, states, transitions, epsilon, self.name.clone())
            .expect("renumbering preserves structural invariants")
    }

    /// Product with a chain of `n+1` all-final states connected by `TRUE`
    /// edges: accepts the words of `L(M)` with length at most `n`.
    pub fn bounded_language(&self, n: usize) -> Sfa {
        let tru = self.algebra.tru();
        let chain_states = (0..=n)
            .map(|_| SfaState {
                name: None,
                accepting: true,
            })
            .collect();
        let chain_transitions = (0..=n)
            .map(|i| if i < n { vec![(tru.clone(), i + 1)] } else { Vec::new() })
            .collect();
        let chain_epsilon = vec![Vec::new(); n + 1];
        let chain = Sfa::raw(self.algebra.clone(), 0, chain_states, chain_transitions, chain_epsilon, None)
            .expect("chain automaton is well-formed");
        self.product(&chain).expect("same algebra by construction")
    }

    /// `Lf(q)`: language starting at `q`.
    pub fn forward_state_language(&self, q: usize) -> Result<Sfa, SfaError> {
        if q >= self.states.len() {
            return Err(SfaError::StateNotInStates(q));
        }
        Ok(Sfa {
            algebra: self.algebra.clone(),
            initial: q,
            states: self.states.clone(),
            transitions: self.transitions.clone(),
            epsilon: self.epsilon.clone(),
            name: None,
        }
        .trim())
    }

    /// `Lb(q)`: language from the initial state to `q`.
    pub fn backward_state_language(&self, q: usize) -> Result<Sfa, SfaError> {
        if q >= self.states.len() {
            return Err(SfaError::StateNotInStates(q));
        }
        let states = self
            .states
            .iter()
            .enumerate()
            .map(|(idx, s)| SfaState {
                name: s.name.clone(),
                accepting: idx == q,
            })
            .collect();
        Ok(Sfa {
            algebra: self.algebra.clone(),
            initial: self.initial,
            states,
            transitions: self.transitions.clone(),
            epsilon: self.epsilon.clone(),
            name: None,
        }
        .trim())
    }

    /// Prefixes of `Lf(q)`.
    pub fn forward_trace_language(&self, q: usize) -> Result<Sfa, SfaError> {
        Ok(self.forward_state_language(q)?.prefix_language())
    }

    /// Suffixes of `Lb(q)`.
    pub fn backward_trace_language(&self, q: usize) -> Result<Sfa, SfaError> {
        Ok(self.backward_state_language(q)?.suffix_language())
    }
}

#[cfg(test)]
mod tests;
