//! Error taxonomy for the core crate. Each fallible boundary gets its own
//! `thiserror`-derived enum; nothing here is recovered internally, it all
//! unwinds to whichever collaborator (driver, CLI) owns the boundary.

use thiserror::Error;

/// Raised while building or querying a [`crate::sfa::Sfa`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SfaError {
    #[error("state {0} is not a state of this automaton")]
    StateNotInStates(usize),
    #[error("incompatible alphabets: {0:?} vs {1:?}")]
    IncompatibleAlphabets(Vec<String>, Vec<String>),
    #[error("automaton has no states")]
    NoStates,
}

/// Raised while building or querying a [`crate::sft::Sft`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SftError {
    #[error("incompatible alphabets: {0:?} vs {1:?}")]
    IncompatibleAlphabets(Vec<String>, Vec<String>),
    #[error("union of zero transducers is undefined")]
    EmptyUnion,
    #[error("state {0} is not a state of this transducer")]
    StateNotInStates(usize),
}

/// Raised while validating a parsed automaton before it becomes an [`crate::sfa::Sfa`]
/// or [`crate::sft::Sft`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AutomatonError {
    #[error("state name map refers to unknown state {0}")]
    UnknownStateInNameMap(usize),
    #[error("state name {0:?} is used by more than one state")]
    DuplicateStateName(String),
    #[error("transition from state {0} uses symbol {1:?} which is not in the alphabet")]
    SymbolNotInAlphabet(usize, String),
    #[error("automaton declares no initial state")]
    NoInitialState,
    #[error("automaton declares more than one initial state")]
    MultipleInitialStates,
    #[error("alphabet symbol {0:?} is declared more than once")]
    DuplicateSymbol(String),
    #[error("transition refers to unknown state {0:?}")]
    UnknownStateName(String),
}

/// Raised by the textual automaton-format parsers (Timbuk / FSA / FSM / DOT).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParserError {
    #[error("unknown automaton format {0:?}")]
    UnknownFormat(String),
    #[error("syntax error in {format} input: {message}")]
    Syntax { format: &'static str, message: String },
    #[error("duplicate state {0:?}")]
    DuplicateState(String),
    #[error("duplicate label on transition from {0:?}")]
    DuplicateLabel(String),
    #[error("unknown final state {0:?}")]
    UnknownFinalState(String),
    #[error("missing start symbol")]
    MissingStartSymbol,
    #[error("unsupported tree-automaton arity {0}")]
    UnsupportedArity(usize),
    #[error("invalid identity label {0:?}")]
    InvalidIdentityLabel(String),
}

/// Raised by configuration-file loading.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("malformed configuration line {0:?}")]
    BadLine(String),
    #[error("unknown configuration key {0:?}")]
    UnknownKey(String),
    #[error("duplicate configuration key {0:?}")]
    DuplicateKey(String),
    #[error("missing required configuration key {0:?}")]
    MissingKey(&'static str),
    #[error("invalid value {1:?} for configuration key {0:?}")]
    BadValue(&'static str, String),
    #[error("exactly one of PREDICATE_LANGUAGES / FINITE_LENGTH_LANGUAGES must be set")]
    AbstractionSelectionConflict,
}

/// Raised by the ARMC driver itself (not by its sub-components).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ArmcError {
    #[error("initial property violation: Init and Bad are not disjoint")]
    InitialPropertyViolation,
    #[error("verification timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("no transducers given: tau would be the union of zero automata")]
    NoTransducers,
}
