//! # armc-core
//!
//! Core library for **Abstract Regular Model Checking**: proving
//! `post*(Init) ∩ Bad = ∅` for an infinite-state transition system whose
//! configurations are encoded as words over a finite alphabet, via a CEGAR
//! loop that computes successive overapproximations of the reachable
//! configurations using a state-collapsing abstraction on symbolic
//! automata.
//!
//! ## Layered architecture
//!
//! * [`alphabet`] and [`predicate`] — the shared alphabet, the `(kind, S)`
//!   predicate representation, and the registry of one [`predicate::PredicateAlgebra`]
//!   per alphabet.
//! * [`label`] — transducer edge labels (`Identity`/`Pair`) and their serial
//!   composition.
//! * [`sfa`] — symbolic finite automata: product, union, complement,
//!   determinize, minimize, collapse, and the rest of the automaton algebra.
//! * [`sft`] — symbolic finite transducers: apply, invert, compose, union,
//!   domain/range projection.
//! * [`abstraction`] — the two collapsing strategies (predicate-language
//!   equivalence, finite-length-language equivalence) that drive `Collapse`.
//! * [`driver`] — the CEGAR loop itself: setup, forward phase, replay,
//!   refinement.
//! * [`config`] — the `KEY = value` configuration file format.
//! * [`format`] — the four textual automaton formats (Timbuk, FSA, FSM, DOT).
//! * [`error`] — one `thiserror`-derived enum per fallible boundary.
//!
//! Data flows bottom-up: the automaton/transducer algebras know nothing of
//! abstraction or the driver; abstraction acts on `Sfa` and consumes `Sft`;
//! the driver sequences abstraction calls and SFA/SFT operations; the CLI
//! (in the sibling `armc-cli` crate) sequences config loading, parsing, the
//! driver, and output writing.

pub mod abstraction;
pub mod alphabet;
pub mod config;
pub mod driver;
pub mod error;
pub mod format;
pub mod label;
pub mod predicate;
pub mod sfa;
pub mod sft;

#[cfg(test)]
mod tests;
