//! Intermediate representation for textually-parsed transducers, mirroring
//! [`crate::sfa::parse`]: the format parsers build this plain data, and
//! validation into an [`Sft`] happens in exactly one place.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::alphabet::Alphabet;
use crate::error::AutomatonError;
use crate::predicate::PredicateAlgebra;
use crate::sft::{Sft, SftState};

use crate::label::Label;
use crate::sfa::parse::ParsedPredicate;

/// A label as written in a textual format: `X/Y` (an explicit input/output
/// pair, either half possibly absent) or `@P` (identity over `P`).
#[derive(Debug, Clone)]
pub enum ParsedLabel {
    Pair(Option<ParsedPredicate>, Option<ParsedPredicate>),
    Identity(Option<ParsedPredicate>),
}

#[derive(Debug, Clone)]
pub struct ParsedTTransition {
    pub label: ParsedLabel,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct ParsedSftState {
    pub name: String,
    pub initial: bool,
    pub accepting: bool,
    pub transitions: Vec<ParsedTTransition>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSft {
    pub alphabet: Vec<String>,
    pub states: Vec<ParsedSftState>,
    pub automaton_name: Option<String>,
}

fn to_predicate(algebra: &PredicateAlgebra, alphabet: &Alphabet, state_idx: usize, p: &ParsedPredicate) -> Result<crate::predicate::Predicate, AutomatonError> {
    let (symbols, negate) = match p {
        ParsedPredicate::In(s) => (s, false),
        ParsedPredicate::NotIn(s) => (s, true),
    };
    let mut indices = Vec::with_capacity(symbols.len());
    for s in symbols {
        let idx = alphabet
            .index_of(s)
            .ok_or_else(|| AutomatonError::SymbolNotInAlphabet(state_idx, s.clone()))?;
        indices.push(idx);
    }
    Ok(if negate {
        algebra.from_exclusive_indices(indices)
    } else {
        algebra.from_inclusive_indices(indices)
    })
}

impl TryFrom<ParsedSft> for Sft {
    type Error = AutomatonError;

    fn try_from(parsed: ParsedSft) -> Result<Self, Self::Error> {
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
            states.push(SftState {
                name: Some(Rc::from(state.name.as_str())),
                accepting: state.accepting,
            });

            let mut row = Vec::with_capacity(state.transitions.len());
            for t in &state.transitions {
                let target = *name_to_idx
                    .get(&t.target)
                    .ok_or_else(|| AutomatonError::UnknownStateName(t.target.clone()))?;
                let label = match &t.label {
                    ParsedLabel::Identity(p) => {
                        let pred = p.as_ref().map(|p| to_predicate(&algebra, &alphabet, idx, p)).transpose()?;
                        Label::Identity(pred)
                    }
                    ParsedLabel::Pair(i, o) => {
                        let input = i.as_ref().map(|p| to_predicate(&algebra, &alphabet, idx, p)).transpose()?;
                        let output = o.as_ref().map(|p| to_predicate(&algebra, &alphabet, idx, p)).transpose()?;
                        Label::Pair(input, output)
                    }
                };
                row.push((label, target));
            }
            transitions.push(row);
        }

        let epsilon = vec![Vec::new(); states.len()];
        let name = parsed.automaton_name.map(|n| Rc::from(n.as_str()));

        Sft::raw(Rc::new(algebra), initial, states, transitions, epsilon, name)
            .map_err(|_| AutomatonError::NoInitialState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_an_identity_transducer() {
        let parsed = ParsedSft {
            alphabet: vec!["a".into(), "b".into()],
            states: vec![
                ParsedSftState {
                    name: "q0".into(),
                    initial: true,
                    accepting: false,
                    transitions: vec![ParsedTTransition {
                        label: ParsedLabel::Identity(Some(ParsedPredicate::In(vec!["a".into()]))),
                        target: "q1".into(),
                    }],
                },
                ParsedSftState {
                    name: "q1".into(),
                    initial: false,
                    accepting: true,
                    transitions: vec![],
                },
            ],
            automaton_name: None,
        };
        let sft: Sft = parsed.try_into().unwrap();
        assert_eq!(sft.num_states(), 2);
    }

    #[test]
    fn rejects_transition_to_unknown_state() {
        let parsed = ParsedSft {
            alphabet: vec!["a".into()],
            states: vec![ParsedSftState {
                name: "q0".into(),
                initial: true,
                accepting: true,
                transitions: vec![ParsedTTransition {
                    label: ParsedLabel::Pair(Some(ParsedPredicate::In(vec!["a".into()])), Some(ParsedPredicate::In(vec!["a".into()]))),
                    target: "missing".into(),
                }],
            }],
            automaton_name: None,
        };
        let result: Result<Sft, _> = parsed.try_into();
        assert!(matches!(result, Err(AutomatonError::UnknownStateName(_))));
    }
}
