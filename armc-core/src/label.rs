//! §4.2 label algebra: transducer edge labels, either an identity relation
//! over one predicate or an explicit input/output pair. Either predicate
//! may be absent, which is the explicit ε-marker required by §9 (never a
//! nullable predicate doing double duty as "no symbol" and "false").

use crate::predicate::{Predicate, PredicateAlgebra};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// `{(a,a) : a ∈ ⟦P⟧}`. `None` denotes the epsilon identity (no symbol
    /// consumed or produced).
    Identity(Option<Predicate>),
    /// `⟦Pᵢ⟧ × ⟦Pₒ⟧`. Either side may be `None`, denoting an empty input or
    /// empty output on this edge.
    Pair(Option<Predicate>, Option<Predicate>),
}

impl Label {
    pub fn identity(p: Predicate) -> Self {
        Label::Identity(Some(p))
    }

    pub fn pair(input: Option<Predicate>, output: Option<Predicate>) -> Self {
        Label::Pair(input, output)
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Label::Identity(_))
    }

    pub fn input(&self) -> Option<&Predicate> {
        match self {
            Label::Identity(p) => p.as_ref(),
            Label::Pair(i, _) => i.as_ref(),
        }
    }

    /// `out(L)` from §4.2: `Pₒ` for `PAIR(Pᵢ,Pₒ)`, else `Pᵢ` (identity acts
    /// as its own output predicate).
    pub fn out(&self) -> Option<&Predicate> {
        match self {
            Label::Identity(p) => p.as_ref(),
            Label::Pair(_, o) => o.as_ref(),
        }
    }

    /// Serial composition `Combine(L1, L2)`. Returns `None` for the `FALSE`
    /// label (unsatisfiable composite), matching the predicate algebra's own
    /// convention of representing "no match" as an absent/empty result
    /// rather than a sentinel value threaded through every caller.
    pub fn combine(algebra: &PredicateAlgebra, l1: &Label, l2: &Label) -> Option<Label> {
        match (l1.out(), l2.input()) {
            (Some(out1), Some(in2)) => {
                let mid = algebra.and(out1, in2);
                if !algebra.satisfiable(&mid) {
                    return None;
                }
                if l1.is_identity() && l2.is_identity() {
                    Some(Label::Identity(Some(algebra.and(l1.input().unwrap(), &mid))))
                } else {
                    Some(Label::Pair(l1.input().cloned(), l2.out().cloned()))
                }
            }
            (None, None) => {
                // Both sides are epsilon at the junction: the composite carries
                // whichever ends are non-epsilon.
                if l1.is_identity() && l2.is_identity() {
                    Some(Label::Identity(None))
                } else {
                    Some(Label::Pair(l1.input().cloned(), l2.out().cloned()))
                }
            }
            _ => None, // one side epsilon, the other not: they cannot align
        }
    }

    pub fn and(algebra: &PredicateAlgebra, l1: &Label, l2: &Label) -> Label {
        let input = match (l1.input(), l2.input()) {
            (Some(a), Some(b)) => Some(algebra.and(a, b)),
            (a, b) => a.or(b).cloned(),
        };
        if l1.is_identity() && l2.is_identity() {
            Label::Identity(input)
        } else {
            let output = match (l1.out(), l2.out()) {
                (Some(a), Some(b)) => Some(algebra.and(a, b)),
                (a, b) => a.or(b).cloned(),
            };
            Label::Pair(input, output)
        }
    }

    pub fn satisfiable(&self, algebra: &PredicateAlgebra) -> bool {
        let in_ok = self.input().map(|p| algebra.satisfiable(p)).unwrap_or(true);
        let out_ok = self.out().map(|p| algebra.satisfiable(p)).unwrap_or(true);
        in_ok && out_ok
    }

    /// Swap input/output, used by [`crate::sft::Sft::invert`]. Identity
    /// labels are their own inverse.
    pub fn inverted(&self) -> Label {
        match self {
            Label::Identity(p) => Label::Identity(p.clone()),
            Label::Pair(i, o) => Label::Pair(o.clone(), i.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn algebra() -> PredicateAlgebra {
        PredicateAlgebra::new(Alphabet::from_strs(["a", "b"]))
    }

    #[test]
    fn combine_drops_unsatisfiable_composites() {
        let alg = algebra();
        let l1 = Label::pair(Some(alg.symbol(0)), Some(alg.symbol(0)));
        let l2 = Label::pair(Some(alg.symbol(1)), Some(alg.symbol(1)));
        assert!(Label::combine(&alg, &l1, &l2).is_none());
    }

    #[test]
    fn combine_identity_chain_is_identity() {
        let alg = algebra();
        let l1 = Label::identity(alg.tru());
        let l2 = Label::identity(alg.symbol(0));
        let combined = Label::combine(&alg, &l1, &l2).unwrap();
        assert!(combined.is_identity());
    }

    #[test]
    fn inverted_swaps_input_output() {
        let alg = algebra();
        let l = Label::pair(Some(alg.symbol(0)), Some(alg.symbol(1)));
        let inv = l.inverted();
        assert_eq!(inv.input(), l.out());
        assert_eq!(inv.out(), l.input());
    }
}
