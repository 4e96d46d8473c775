//! The alphabet Σ and the process-wide table of predicate algebras keyed by it.
//!
//! A [`Symbol`] is an interned, reference-counted string, the same
//! representation used throughout the predecessor automata crate this was
//! grown from: cloning a symbol is a pointer bump, and equality/ordering
//! fall back to ordinary string comparison.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::predicate::PredicateAlgebra;

pub type Symbol = Rc<str>;

/// A finite, deduplicated, sorted set of symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alphabet {
    symbols: Rc<[Symbol]>,
}

impl Alphabet {
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut symbols: Vec<Symbol> = symbols.into_iter().collect();
        symbols.sort();
        symbols.dedup();
        Self {
            symbols: Rc::from(symbols),
        }
    }

    pub fn from_strs<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(symbols.into_iter().map(Rc::from))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Index of a symbol within this alphabet, if present. Used to translate
    /// between textual formats and the index-based predicate representation.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.binary_search_by(|s| s.as_ref().cmp(symbol)).ok()
    }

    pub fn symbol(&self, idx: usize) -> &Symbol {
        &self.symbols[idx]
    }

    /// Union of two alphabets. Used during driver setup (§4.6) to merge the
    /// alphabets of `Init`, `Bad` and every `τᵢ` into one shared Σ.
    pub fn merge(&self, other: &Alphabet) -> Alphabet {
        Self::new(self.symbols.iter().cloned().chain(other.symbols.iter().cloned()))
    }

    pub fn is_subset_of(&self, other: &Alphabet) -> bool {
        self.symbols.iter().all(|s| other.index_of(s).is_some())
    }
}

/// Process-wide table mapping an alphabet to its canonical predicate algebra
/// (§3 "predicate algebras are shared"). Automata sharing Σ share one
/// algebra instance; the table is additive (never shrinks) and populated
/// lazily, so a `RefCell` is sufficient — the core is single-threaded (§5)
/// and the driver is the only writer, during setup, before the loop runs.
#[derive(Default)]
pub struct AlgebraRegistry {
    table: RefCell<HashMap<Alphabet, Rc<PredicateAlgebra>>>,
}

impl AlgebraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&self, alphabet: Alphabet) -> Rc<PredicateAlgebra> {
        if let Some(existing) = self.table.borrow().get(&alphabet) {
            return existing.clone();
        }
        let algebra = Rc::new(PredicateAlgebra::new(alphabet.clone()));
        self.table.borrow_mut().insert(alphabet, algebra.clone());
        algebra
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_dedups_and_sorts() {
        let a = Alphabet::from_strs(["b", "a"]);
        let b = Alphabet::from_strs(["a", "c"]);
        let merged = a.merge(&b);
        assert_eq!(
            merged.as_slice().iter().map(|s| s.as_ref()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn registry_shares_instances_for_equal_alphabets() {
        let registry = AlgebraRegistry::new();
        let a1 = registry.get_or_insert(Alphabet::from_strs(["a", "b"]));
        let a2 = registry.get_or_insert(Alphabet::from_strs(["b", "a"]));
        assert!(Rc::ptr_eq(&a1, &a2));
        assert_eq!(registry.len(), 1);
    }
}
