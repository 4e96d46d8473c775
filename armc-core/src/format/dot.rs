//! DOT format (§6): Graphviz `digraph` output for visualisation only. There
//! is no parser here — `format::read_sfa`/`read_sft` reject this format
//! before ever reaching this module.

use crate::label::Label;
use crate::predicate::{Kind, Predicate, PredicateAlgebra};
use crate::sfa::Sfa;
use crate::sft::Sft;

fn state_name(idx: usize) -> String {
    format!("q{idx}")
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn predicate_label(algebra: &PredicateAlgebra, p: &Predicate) -> String {
    let symbols: Vec<&str> = p.raw_set().iter().map(|&i| algebra.alphabet().symbol(i).as_ref()).collect();
    match p.kind() {
        Kind::In => symbols.join(","),
        Kind::NotIn => format!("¬{{{}}}", symbols.join(",")),
    }
}

fn predicate_or_eps_label(algebra: &PredicateAlgebra, p: Option<&Predicate>) -> String {
    p.map(|p| predicate_label(algebra, p)).unwrap_or_else(|| "ε".to_string())
}

fn label_text(algebra: &PredicateAlgebra, label: &Label) -> String {
    match label {
        Label::Identity(p) => predicate_or_eps_label(algebra, p.as_ref()),
        Label::Pair(i, o) => format!("{}/{}", predicate_or_eps_label(algebra, i.as_ref()), predicate_or_eps_label(algebra, o.as_ref())),
    }
}

fn render(
    name: &str,
    num_states: usize,
    initial: usize,
    is_accepting: impl Fn(usize) -> bool,
    edges: impl Iterator<Item = (usize, String, usize)>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph {name} {{\n"));
    out.push_str("    rankdir=LR;\n");
    out.push_str("    __start__ [shape=point];\n");
    for s in 0..num_states {
        let shape = if is_accepting(s) { "doublecircle" } else { "circle" };
        out.push_str(&format!("    {} [shape={}, label=\"{}\"];\n", state_name(s), shape, state_name(s)));
    }
    out.push_str(&format!("    __start__ -> {};\n", state_name(initial)));
    for (from, label, to) in edges {
        out.push_str(&format!(
            "    {} -> {} [label=\"{}\"];\n",
            state_name(from),
            state_name(to),
            escape(&label)
        ));
    }
    out.push_str("}\n");
    out
}

pub fn print_sfa(sfa: &Sfa) -> String {
    let algebra = sfa.algebra();
    let name = sfa.name().map(|n| n.to_string()).unwrap_or_else(|| "automaton".to_string());
    let mut edges = Vec::new();
    for s in 0..sfa.num_states() {
        for (p, t) in sfa.out_edges(s) {
            edges.push((s, predicate_label(algebra, p), *t));
        }
    }
    render(&name, sfa.num_states(), sfa.initial_state(), |s| sfa.is_accepting(s), edges.into_iter())
}

pub fn print_sft(sft: &Sft) -> String {
    let algebra = sft.algebra();
    let name = sft.name().map(|n| n.to_string()).unwrap_or_else(|| "transducer".to_string());
    let mut edges = Vec::new();
    for s in 0..sft.num_states() {
        for (label, t) in sft.out_edges(s) {
            edges.push((s, label_text(algebra, label), *t));
        }
    }
    render(&name, sft.num_states(), sft.initial_state(), |s| sft.is_accepting(s), edges.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::predicate::PredicateAlgebra;
    use crate::sfa::SfaState;
    use std::rc::Rc;

    fn star_of(algebra: &Rc<PredicateAlgebra>, sym_idx: usize) -> Sfa {
        let p = algebra.symbol(sym_idx);
        let states = vec![SfaState { name: None, accepting: true }];
        let transitions = vec![vec![(p, 0)]];
        Sfa::raw(algebra.clone(), 0, states, transitions, vec![Vec::new()], None).unwrap()
    }

    #[test]
    fn renders_a_digraph_with_a_start_pointer_and_one_edge() {
        let algebra = Rc::new(PredicateAlgebra::new(Alphabet::from_strs(["a"])));
        let sfa = star_of(&algebra, 0);
        let dot = print_sfa(&sfa);
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("__start__ -> q0"));
        assert!(dot.contains("doublecircle"));
        assert!(dot.contains("label=\"a\""));
    }
}
