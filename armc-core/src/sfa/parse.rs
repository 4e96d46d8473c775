//! Intermediate representation produced by the textual automaton-format
//! parsers (§6), and its validating conversion into an [`Sfa`]. Mirrors the
//! predecessor crate's `ParsedDfa`/`ParsedNfa` → `TryFrom` pattern in
//! `dfa::parse`/`nfa::parse`: the format parsers never construct an `Sfa`
//! directly, they build this plain data first so validation lives in one
//! place regardless of which textual format produced it.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::alphabet::Alphabet;
use crate::error::AutomatonError;
use crate::predicate::PredicateAlgebra;
use crate::sfa::{Sfa, SfaState};

/// A predicate as written in a textual format: an explicit inclusion set or
/// its complement (Timbuk's `in{…}` / `not_in{…}`, §6).
#[derive(Debug, Clone)]
pub enum ParsedPredicate {
    In(Vec<String>),
    NotIn(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ParsedTransition {
    pub predicate: ParsedPredicate,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct ParsedSfaState {
    pub name: String,
    pub initial: bool,
    pub accepting: bool,
    pub transitions: Vec<ParsedTransition>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSfa {
    pub alphabet: Vec<String>,
    pub states: Vec<ParsedSfaState>,
    pub automaton_name: Option<String>,
}

impl TryFrom<ParsedSfa> for Sfa {
    type Error = AutomatonError;

    fn try_from(parsed: ParsedSfa) -> Result<Self, Self::Error> {
        let mut seen_symbols = HashSet::new();
        for s in &parsed.alphabet {
            if !seen_symbols.insert(s.clone()) {
                return Err(AutomatonError::DuplicateSymbol(s.clone()));
            }
        }
        let alphabet = Alphabet::from_strs(parsed.alphabet.iter().map(String::as_str));

        let mut name_to_idx = HashMap::new();
        for (idx, state) in parsed.states.iter().enumerate() {
            if name_to_idx.insert(state.name.clone(), idx).is_some() {
                return Err(AutomatonError::DuplicateStateName(state.name.clone()));
            }
        }

        let initial_candidates: Vec<usize> = parsed
            .states
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.initial.then_some(idx))
            .collect();
        let initial = match initial_candidates.as_slice() {
            [] => return Err(AutomatonError::NoInitialState),
            [only] => *only,
            _ => return Err(AutomatonError::MultipleInitialStates),
        };

        let algebra = PredicateAlgebra::new(alphabet.clone());

        let mut states = Vec::with_capacity(parsed.states.len());
        let mut transitions = Vec::with_capacity(parsed.states.len());
        for (idx, state) in parsed.states.iter().enumerate() {
            states.push(SfaState {
                name: Some(Rc::from(state.name.as_str())),
                accepting: state.accepting,
            });

            let mut row = Vec::with_capacity(state.transitions.len());
            for t in &state.transitions {
                let target = *name_to_idx
                    .get(&t.target)
                    .ok_or_else(|| AutomatonError::UnknownStateName(t.target.clone()))?;
                let (symbols, negate) = match &t.predicate {
                    ParsedPredicate::In(syms) => (syms, false),
                    ParsedPredicate::NotIn(syms) => (syms, true),
                };
                let mut indices = Vec::with_capacity(symbols.len());
                for sym in symbols {
                    let sym_idx = alphabet
                        .index_of(sym)
                        .ok_or_else(|| AutomatonError::SymbolNotInAlphabet(idx, sym.clone()))?;
                    indices.push(sym_idx);
                }
                let predicate = if negate {
                    algebra.from_exclusive_indices(indices)
                } else {
                    algebra.from_inclusive_indices(indices)
                };
                row.push((predicate, target));
            }
            transitions.push(row);
        }

        let epsilon = vec![Vec::new(); states.len()];
        let name = parsed.automaton_name.map(|n| Rc::from(n.as_str()));

        Sfa::raw(Rc::new(algebra), initial, states, transitions, epsilon, name)
            .map_err(|_| AutomatonError::NoInitialState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_simple_two_state_sfa() {
        let parsed = ParsedSfa {
            alphabet: vec!["a".into(), "b".into()],
            states: vec![
                ParsedSfaState {
                    name: "q0".into(),
                    initial: true,
                    accepting: false,
                    transitions: vec![ParsedTransition {
                        predicate: ParsedPredicate::In(vec!["a".into()]),
                        target: "q1".into(),
                    }],
                },
                ParsedSfaState {
                    name: "q1".into(),
                    initial: false,
                    accepting: true,
                    transitions: vec![],
                },
            ],
            automaton_name: Some("example".into()),
        };
        let sfa: Sfa = parsed.try_into().unwrap();
        assert_eq!(sfa.num_states(), 2);
        assert!(!sfa.is_accepting(sfa.initial_state()));
    }

    #[test]
    fn rejects_duplicate_state_names() {
        let parsed = ParsedSfa {
            alphabet: vec!["a".into()],
            states: vec![
                ParsedSfaState { name: "q0".into(), initial: true, accepting: true, transitions: vec![] },
                ParsedSfaState { name: "q0".into(), initial: false, accepting: false, transitions: vec![] },
            ],
            automaton_name: None,
        };
        let result: Result<Sfa, _> = parsed.try_into();
        assert!(matches!(result, Err(AutomatonError::DuplicateStateName(_))));
    }

    #[test]
    fn rejects_transition_symbol_outside_alphabet() {
        let parsed = ParsedSfa {
            alphabet: vec!["a".into()],
            states: vec![ParsedSfaState {
                name: "q0".into(),
                initial: true,
                accepting: true,
                transitions: vec![ParsedTransition {
                    predicate: ParsedPredicate::In(vec!["z".into()]),
                    target: "q0".into(),
                }],
            }],
            automaton_name: None,
        };
        let result: Result<Sfa, _> = parsed.try_into();
        assert!(matches!(result, Err(AutomatonError::SymbolNotInAlphabet(_, _))));
    }
}
