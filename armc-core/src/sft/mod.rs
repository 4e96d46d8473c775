//! §4.4 Symbolic Finite Transducer: an SFA whose edges carry a [`Label`]
//! instead of a bare predicate. Value-like, same as [`crate::sfa::Sfa`] —
//! every operation returns a fresh [`Sft`] and leaves its operands untouched.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::SftError;
use crate::label::Label;
use crate::predicate::PredicateAlgebra;
use crate::sfa::{Sfa, SfaState};

pub mod parse;

#[derive(Debug, Clone)]
pub struct SftState {
    pub name: Option<Rc<str>>,
    pub accepting: bool,
}

/// An outgoing label-carrying move.
pub type TMove = (Label, usize);

/// A symbolic finite transducer over a shared [`PredicateAlgebra`].
#[derive(Clone)]
pub struct Sft {
    algebra: Rc<PredicateAlgebra>,
    initial: usize,
    states: Vec<SftState>,
    transitions: Vec<Vec<TMove>>,
    epsilon: Vec<Vec<usize>>,
    name: Option<Rc<str>>,
}

impl Sft {
    pub(crate) fn raw(
        algebra: Rc<PredicateAlgebra>,
        initial: usize,
        states: Vec<SftState>,
        transitions: Vec<Vec<TMove>>,
        epsilon: Vec<Vec<usize>>,
        name: Option<Rc<str>>,
    ) -> Result<Self, SftError> {
        if initial >= states.len() {
            return Err(SftError::StateNotInStates(initial));
        }
        for row in &transitions {
            for (_, target) in row {
                if *target >= states.len() {
                    return Err(SftError::StateNotInStates(*target));
                }
            }
        }
        for row in &epsilon {
            for target in row {
                if *target >= states.len() {
                    return Err(SftError::StateNotInStates(*target));
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

    pub fn out_edges(&self, state: usize) -> &[TMove] {
        &self.transitions[state]
    }

    fn same_algebra(&self, other: &Sft) -> Result<(), SftError> {
        if Rc::ptr_eq(&self.algebra, &other.algebra) {
            return Ok(());
        }
        let a: Vec<String> = self.algebra.alphabet().iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = other.algebra.alphabet().iter().map(|s| s.to_string()).collect();
        if a == b {
            return Ok(());
        }
        Err(SftError::IncompatibleAlphabets(a, b))
    }

    /// Normalises to an SFA with the same moves' *input* labels, used as a
    /// lightweight epsilon-closure helper shared by `apply`/`compose`.
    fn epsilon_closure(&self, state: usize) -> Vec<usize> {
        let mut seen = vec![state];
        let mut queue = VecDeque::from([state]);
        while let Some(s) = queue.pop_front() {
            for &t in &self.epsilon[s] {
                if !seen.contains(&t) {
                    seen.push(t);
                    queue.push_back(t);
                }
            }
        }
        seen
    }

    /// `{τ(w) : w ∈ L(M)}`. Forward product traversal from `(τ.q₀, M.q₀)`
    /// (§4.4): an ε-input label advances only the transducer side, emitting
    /// its output predicate (or ε, if identity); otherwise both sides step
    /// together and the emitted predicate is `L.out` (or `L.in ∧ P` for
    /// identity labels), dropped whenever the conjunction is unsatisfiable.
    pub fn apply(&self, m: &Sfa) -> Result<Sfa, SftError> {
        let algebra = self.algebra.clone();
        let mut state_of: HashMap<(usize, usize), usize> = HashMap::new();
        let mut states = Vec::new();
        let mut transitions: Vec<Vec<(crate::predicate::Predicate, usize)>> = Vec::new();
        let mut queue = VecDeque::new();

        let start = (self.initial, m.initial_state());
        state_of.insert(start, 0);
        states.push(SfaState {
            name: None,
            accepting: self.is_accepting(start.0) && m.is_accepting(start.1),
        });
        transitions.push(Vec::new());
        queue.push_back(start);

        while let Some((p, s)) = queue.pop_front() {
            let idx = state_of[&(p, s)];
            for &p_eps in &self.epsilon_closure(p) {
                for (label, p_target) in &self.transitions[p_eps] {
                    if label.input().is_none() {
                        // ε-input: advance the transducer side only.
                        let emitted = label.out();
                        let key = (*p_target, s);
                        let target = *state_of.entry(key).or_insert_with(|| {
                            states.push(SfaState {
                                name: None,
                                accepting: self.is_accepting(key.0) && m.is_accepting(key.1),
                            });
                            transitions.push(Vec::new());
                            queue.push_back(key);
                            states.len() - 1
                        });
                        if let Some(out_pred) = emitted {
                            transitions[idx].push((out_pred.clone(), target));
                        }
                        continue;
                    }
                    for (p_m, t_m) in m.out_edges(s) {
                        let input = label.input().expect("checked above");
                        let conj = algebra.and(input, p_m);
                        if !algebra.satisfiable(&conj) {
                            continue;
                        }
                        let emitted = if label.is_identity() { conj } else { label.out().cloned().unwrap_or_else(|| algebra.fals()) };
                        let key = (*p_target, *t_m);
                        let target = *state_of.entry(key).or_insert_with(|| {
                            states.push(SfaState {
                                name: None,
                                accepting: self.is_accepting(key.0) && m.is_accepting(key.1),
                            });
                            transitions.push(Vec::new());
                            queue.push_back(key);
                            states.len() - 1
                        });
                        transitions[idx].push((emitted, target));
                    }
                }
            }
        }

        let epsilon = vec![Vec::new(); states.len()];
        Ok(Sfa::raw(algebra, 0, states, transitions, epsilon, None)
            .expect("product construction preserves structural invariants")
            .trim())
    }

    /// Swap input/output on every non-identity label; identity labels are
    /// invariant under inversion.
    pub fn invert(&self) -> Sft {
        let states = self.states.clone();
        let transitions = self
            .transitions
            .iter()
            .map(|row| row.iter().map(|(l, t)| (l.inverted(), *t)).collect())
            .collect();
        Sft {
            algebra: self.algebra.clone(),
            initial: self.initial,
            states,
            transitions,
            epsilon: self.epsilon.clone(),
            name: self.name.clone(),
        }
    }

    /// Synchronous product with `Combine` on labels (§4.2); unsatisfiable
    /// composites are dropped.
    pub fn compose(&self, other: &Sft) -> Result<Sft, SftError> {
        self.same_algebra(other)?;
        let algebra = &self.algebra;
        let mut state_of: HashMap<(usize, usize), usize> = HashMap::new();
        let mut states = Vec::new();
        let mut transitions: Vec<Vec<TMove>> = Vec::new();
        let mut queue = VecDeque::new();

        let start = (self.initial, other.initial);
        state_of.insert(start, 0);
        states.push(SftState {
            name: None,
            accepting: self.is_accepting(start.0) && other.is_accepting(start.1),
        });
        transitions.push(Vec::new());
        queue.push_back(start);

        while let Some((a, b)) = queue.pop_front() {
            let idx = state_of[&(a, b)];
            for (la, ta) in &self.transitions[a] {
                for (lb, tb) in &other.transitions[b] {
                    let combined = match Label::combine(algebra, la, lb) {
                        Some(l) if l.satisfiable(algebra) => l,
                        _ => continue,
                    };
                    let key = (*ta, *tb);
                    let target = *state_of.entry(key).or_insert_with(|| {
                        states.push(SftState {
                            name: None,
                            accepting: self.is_accepting(key.0) && other.is_accepting(key.1),
                        });
                        transitions.push(Vec::new());
                        queue.push_back(key);
                        states.len() - 1
                    });
                    transitions[idx].push((combined, target));
                }
            }
        }

        let epsilon = vec![Vec::new(); states.len()];
        Sft::raw(self.algebra.clone(), 0, states, transitions, epsilon, None)
    }

    /// Fresh start state with ε-moves into each normalised operand's start.
    pub fn union(transducers: &[Sft]) -> Result<Sft, SftError> {
        let first = transducers.first().ok_or(SftError::EmptyUnion)?;
        let algebra = first.algebra.clone();
        for t in &transducers[1..] {
            first.same_algebra(t)?;
        }

        let mut states = vec![SftState {
            name: None,
            accepting: false,
        }];
        let mut transitions: Vec<Vec<TMove>> = vec![Vec::new()];
        let mut epsilon: Vec<Vec<usize>> = vec![Vec::new()];

        for t in transducers {
            let offset = states.len();
            epsilon[0].push(offset + t.initial);
            states.extend(t.states.iter().cloned());
            transitions.extend(
                t.transitions
                    .iter()
                    .map(|row| row.iter().map(|(l, target)| (l.clone(), target + offset)).collect()),
            );
            epsilon.extend(
                t.epsilon
                    .iter()
                    .map(|row| row.iter().map(|target| target + offset).collect()),
            );
        }

        Sft::raw(algebra, 0, states, transitions, epsilon, None)
    }

    /// Rebinds this transducer onto a different algebra, the same way
    /// [`Sfa::rebind`] does for automata (§4.6 setup): every label's
    /// predicates are translated through symbol names, not raw indices.
    pub fn rebind(&self, new_algebra: &Rc<PredicateAlgebra>) -> Sft {
        let old_algebra = &self.algebra;
        let remap_predicate = |p: &crate::predicate::Predicate| -> crate::predicate::Predicate {
            let indices: Vec<usize> = old_algebra
                .inclusive_set(p)
                .iter()
                .filter_map(|&idx| new_algebra.alphabet().index_of(old_algebra.alphabet().symbol(idx)))
                .collect();
            new_algebra.from_inclusive_indices(indices)
        };
        let remap_label = |l: &Label| -> Label {
            match l {
                Label::Identity(p) => Label::Identity(p.as_ref().map(|p| remap_predicate(p))),
                Label::Pair(i, o) => Label::Pair(i.as_ref().map(|p| remap_predicate(p)), o.as_ref().map(|p| remap_predicate(p))),
            }
        };
        let transitions = self
            .transitions
            .iter()
            .map(|row| row.iter().map(|(l, t)| (remap_label(l), *t)).collect())
            .collect();
        Sft {
            algebra: new_algebra.clone(),
            initial: self.initial,
            states: self.states.clone(),
            transitions,
            epsilon: self.epsilon.clone(),
            name: self.name.clone(),
        }
    }

    /// Project each label to its input predicate and reinterpret as an SFA
    /// (identity labels project to their single predicate).
    pub fn domain(&self) -> Sfa {
        self.project(true)
    }

    /// Project each label to its output predicate.
    pub fn range(&self) -> Sfa {
        self.project(false)
    }

    fn project(&self, to_input: bool) -> Sfa {
        let states = self
            .states
            .iter()
            .map(|s| SfaState {
                name: s.name.clone(),
                accepting: s.accepting,
            })
            .collect();
        let transitions = self
            .transitions
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(l, t)| {
                        let p = if to_input { l.input() } else { l.out() };
                        p.map(|p| (p.clone(), *t))
                    })
                    .collect()
            })
            .collect();
        Sfa::raw(
            self.algebra.clone(),
            self.initial,
            states,
            transitions,
            self.epsilon.clone(),
            None,
        )
        .expect("projection preserves structural invariants")
        .trim()
    }
}
