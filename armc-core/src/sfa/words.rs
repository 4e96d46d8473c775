//! Ambient diagnostic word enumeration (see SPEC_FULL.md §4.3 "Sample
//! words"), adapted from the predecessor crate's `nfa::words` module, which
//! enumerates accepted words via boolean-matrix reachability computed by
//! repeated squaring (Ackermann–Shallit). This is never on the CEGAR hot
//! path — it backs `--verbose` diagnostics and counterexample
//! pretty-printing only.

use nalgebra::DMatrix;
use num_traits::{One, Zero};
use std::ops::{Add, AddAssign, Mul, MulAssign};

use super::Sfa;
use crate::alphabet::Symbol;

/// A type equal to `bool` in bit pattern and size, implementing the num
/// traits matrix multiplication needs. Lifted verbatim from the
/// predecessor crate's own `NumBool`.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NumBool {
    False = 0,
    True = 1,
}
use NumBool::*;

impl Add for NumBool {
    type Output = NumBool;
    fn add(self, rhs: Self) -> Self::Output {
        if self == False && rhs == False {
            False
        } else {
            True
        }
    }
}
impl AddAssign for NumBool {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs
    }
}
impl Mul for NumBool {
    type Output = NumBool;
    fn mul(self, rhs: Self) -> Self::Output {
        if self == False || rhs == False {
            False
        } else {
            True
        }
    }
}
impl MulAssign for NumBool {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs
    }
}
impl One for NumBool {
    fn one() -> Self {
        True
    }
}
impl Zero for NumBool {
    fn zero() -> Self {
        False
    }
    fn is_zero(&self) -> bool {
        *self == False
    }
}
impl From<bool> for NumBool {
    fn from(value: bool) -> Self {
        if value {
            True
        } else {
            False
        }
    }
}

/// Enumerates a handful of shortest accepted words (as sequences of
/// concrete symbols) in non-decreasing length order, up to `max_len`. Finds
/// the minimal reaching length via boolean matrix powers, then greedily
/// reconstructs one witnessing symbol per step, always staying on a path
/// that still reaches an accepting state in the remaining budget.
pub struct Words<'a> {
    sfa: &'a Sfa,
    adjacency_pow: Vec<DMatrix<NumBool>>,
    next_len: usize,
    max_len: usize,
}

impl<'a> Words<'a> {
    pub fn new(sfa: &'a Sfa, max_len: usize) -> Self {
        let n = sfa.num_states();
        let identity = DMatrix::from_fn(n, n, |x, y| (x == y).into());
        let adjacency = DMatrix::from_fn(n, n, |from, to| {
            sfa.out_edges(from)
                .iter()
                .any(|(p, t)| *t == to && sfa.algebra().satisfiable(p))
                .into()
        });
        Self {
            sfa,
            adjacency_pow: vec![identity, adjacency],
            next_len: 0,
            max_len,
        }
    }

    fn matrix_for(&mut self, len: usize) -> DMatrix<NumBool> {
        while self.adjacency_pow.len() <= len {
            let next = &self.adjacency_pow[1] * self.adjacency_pow.last().unwrap();
            self.adjacency_pow.push(next);
        }
        self.adjacency_pow[len].clone()
    }

    fn reaches_accepting_in(&mut self, from: usize, len: usize) -> bool {
        let matrix = self.matrix_for(len);
        self.sfa.accepting_states().any(|f| matrix[(from, f)] == True)
    }

    fn reconstruct(&mut self, len: usize) -> Vec<Symbol> {
        let mut word = Vec::with_capacity(len);
        let mut current = self.sfa.initial_state();
        for step in 0..len {
            let remaining = len - step - 1;
            let witness = self.sfa.out_edges(current).iter().find_map(|(p, t)| {
                if !self.sfa.algebra().satisfiable(p) {
                    return None;
                }
                let ok = if remaining == 0 {
                    self.sfa.is_accepting(*t)
                } else {
                    self.reaches_accepting_in(*t, remaining)
                };
                ok.then_some((p.clone(), *t))
            });
            let (p, t) = witness.expect("matrix reachability guarantees a witnessing edge");
            let idx = *self
                .sfa
                .algebra()
                .inclusive_set(&p)
                .iter()
                .next()
                .expect("a satisfiable predicate has at least one element");
            word.push(self.sfa.algebra().alphabet().symbol(idx).clone());
            current = t;
        }
        word
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = Vec<Symbol>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_len <= self.max_len {
            let len = self.next_len;
            self.next_len += 1;
            if self.reaches_accepting_in(self.sfa.initial_state(), len) {
                return Some(self.reconstruct(len));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::predicate::PredicateAlgebra;
    use crate::sfa::{Sfa, SfaState};
    use std::rc::Rc;

    #[test]
    fn enumerates_words_of_increasing_length() {
        let algebra = Rc::new(PredicateAlgebra::new(Alphabet::from_strs(["a"])));
        let a = algebra.symbol(0);
        let states = vec![
            SfaState { name: None, accepting: true },
            SfaState { name: None, accepting: true },
        ];
        let transitions = vec![vec![(a.clone(), 1)], vec![(a, 0)]];
        let epsilon = vec![Vec::new(), Vec::new()];
        let sfa = Sfa::raw(algebra, 0, states, transitions, epsilon, None).unwrap();

        let words: Vec<_> = Words::new(&sfa, 3).collect();
        assert_eq!(words.len(), 4); // lengths 0..=3 all reach an accepting state
        assert_eq!(words[0], Vec::<Symbol>::new());
        assert_eq!(words[1].len(), 1);
    }
}
