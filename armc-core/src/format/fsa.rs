//! FSA textual format (§6): Prolog-style `fa(...)` facts, one per line,
//! terminated by `.`. Predicates are `in[a,b]` / `not_in[a,b]`; a
//! transducer label is `pair(In, Out)` or `identity(P)`, either half of a
//! pair (or the whole identity argument) may be `eps`.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::line_ending;
use nom::combinator::{all_consuming, map, opt, value};
use nom::multi::{many0, separated_list0};
use nom::sequence::{delimited, preceded, separated_pair, terminated, tuple};
use nom::{Finish, IResult};
use std::collections::{HashMap, HashSet};

use crate::error::ParserError;
use crate::label::Label;
use crate::predicate::{Kind, Predicate, PredicateAlgebra};
use crate::sfa::parse::{ParsedPredicate, ParsedSfa, ParsedSfaState, ParsedTransition};
use crate::sfa::Sfa;
use crate::sft::parse::{ParsedLabel, ParsedSft, ParsedSftState, ParsedTTransition};
use crate::sft::Sft;

use super::token;

const FORMAT: &str = "FSA";

fn syntax_error(e: nom::error::Error<&str>) -> ParserError {
    ParserError::Syntax {
        format: FORMAT,
        message: format!("{e:?}"),
    }
}

fn list(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(tag("["), separated_list0(tag(","), token), tag("]"))(input)
}

fn fact<'a, O>(head: &'static str, mut body: impl FnMut(&'a str) -> IResult<&'a str, O>) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    move |input: &'a str| terminated(preceded(tuple((tag("fa("), tag(head), tag("("))), |i| body(i)), tuple((tag(")).") , line_ending)))(input)
}

fn alphabet_fact(input: &str) -> IResult<&str, Vec<&str>> {
    fact("alphabet", list)(input)
}

fn states_fact(input: &str) -> IResult<&str, Vec<&str>> {
    fact("states", list)(input)
}

fn initial_fact(input: &str) -> IResult<&str, &str> {
    fact("initial", token)(input)
}

fn final_fact(input: &str) -> IResult<&str, Vec<&str>> {
    fact("final", list)(input)
}

fn predicate(input: &str) -> IResult<&str, ParsedPredicate> {
    alt((
        map(preceded(tag("in"), list), |s: Vec<&str>| ParsedPredicate::In(s.into_iter().map(String::from).collect())),
        map(preceded(tag("not_in"), list), |s: Vec<&str>| ParsedPredicate::NotIn(s.into_iter().map(String::from).collect())),
    ))(input)
}

fn predicate_or_eps(input: &str) -> IResult<&str, Option<ParsedPredicate>> {
    alt((value(None, tag("eps")), map(predicate, Some)))(input)
}

fn label(input: &str) -> IResult<&str, ParsedLabel> {
    alt((
        map(preceded(tag("identity"), delimited(tag("("), predicate_or_eps, tag(")"))), ParsedLabel::Identity),
        map(
            preceded(tag("pair"), delimited(tag("("), separated_pair(predicate_or_eps, tag(","), predicate_or_eps), tag(")"))),
            |(i, o)| ParsedLabel::Pair(i, o),
        ),
    ))(input)
}

fn sfa_transition_fact(input: &str) -> IResult<&str, (&str, ParsedPredicate, &str)> {
    fact(
        "transition",
        tuple((terminated(token, tag(",")), terminated(predicate, tag(",")), token)),
    )(input)
}

fn sft_transition_fact(input: &str) -> IResult<&str, (&str, ParsedLabel, &str)> {
    fact("transition", tuple((terminated(token, tag(",")), terminated(label, tag(",")), token)))(input)
}

struct Header<'a> {
    alphabet: Vec<&'a str>,
    states: Vec<&'a str>,
    initial: &'a str,
    finals: Vec<&'a str>,
}

fn header(input: &str) -> IResult<&str, Header<'_>> {
    map(tuple((alphabet_fact, states_fact, initial_fact, final_fact)), |(alphabet, states, initial, finals)| Header {
        alphabet,
        states,
        initial,
        finals,
    })(input)
}

fn full_sfa(input: &str) -> IResult<&str, ParsedSfa> {
    map(tuple((header, many0(sfa_transition_fact), many0(line_ending))), |(h, transitions, _)| build_sfa(h, transitions))(input)
}

fn full_sft(input: &str) -> IResult<&str, ParsedSft> {
    map(tuple((header, many0(sft_transition_fact), many0(line_ending))), |(h, transitions, _)| build_sft(h, transitions))(input)
}

fn build_sfa(h: Header<'_>, transitions: Vec<(&str, ParsedPredicate, &str)>) -> ParsedSfa {
    let finals: HashSet<&str> = h.finals.into_iter().collect();
    let mut by_state: HashMap<&str, Vec<ParsedTransition>> = h.states.iter().map(|s| (*s, Vec::new())).collect();
    for (from, predicate, to) in transitions {
        by_state.entry(from).or_default().push(ParsedTransition { predicate, target: to.to_string() });
    }
    let states = h
        .states
        .iter()
        .map(|s| ParsedSfaState {
            name: s.to_string(),
            initial: *s == h.initial,
            accepting: finals.contains(s),
            transitions: by_state.remove(s).unwrap_or_default(),
        })
        .collect();
    ParsedSfa {
        alphabet: h.alphabet.into_iter().map(String::from).collect(),
        states,
        automaton_name: None,
    }
}

fn build_sft(h: Header<'_>, transitions: Vec<(&str, ParsedLabel, &str)>) -> ParsedSft {
    let finals: HashSet<&str> = h.finals.into_iter().collect();
    let mut by_state: HashMap<&str, Vec<ParsedTTransition>> = h.states.iter().map(|s| (*s, Vec::new())).collect();
    for (from, label, to) in transitions {
        by_state.entry(from).or_default().push(ParsedTTransition { label, target: to.to_string() });
    }
    let states = h
        .states
        .iter()
        .map(|s| ParsedSftState {
            name: s.to_string(),
            initial: *s == h.initial,
            accepting: finals.contains(s),
            transitions: by_state.remove(s).unwrap_or_default(),
        })
        .collect();
    ParsedSft {
        alphabet: h.alphabet.into_iter().map(String::from).collect(),
        states,
        automaton_name: None,
    }
}

pub fn parse_sfa(input: &str) -> Result<ParsedSfa, ParserError> {
    all_consuming(full_sfa)(input).finish().map(|(_, parsed)| parsed).map_err(syntax_error)
}

pub fn parse_sft(input: &str) -> Result<ParsedSft, ParserError> {
    all_consuming(full_sft)(input).finish().map(|(_, parsed)| parsed).map_err(syntax_error)
}

fn state_name(idx: usize) -> String {
    format!("q{idx}")
}

fn print_list(items: &[impl AsRef<str>]) -> String {
    format!("[{}]", items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(","))
}

fn print_predicate(algebra: &PredicateAlgebra, p: &Predicate) -> String {
    let symbols: Vec<&str> = p.raw_set().iter().map(|&i| algebra.alphabet().symbol(i).as_ref()).collect();
    match p.kind() {
        Kind::In => format!("in{}", print_list(&symbols)),
        Kind::NotIn => format!("not_in{}", print_list(&symbols)),
    }
}

fn print_predicate_or_eps(algebra: &PredicateAlgebra, p: Option<&Predicate>) -> String {
    p.map(|p| print_predicate(algebra, p)).unwrap_or_else(|| "eps".to_string())
}

fn print_label(algebra: &PredicateAlgebra, label: &Label) -> String {
    match label {
        Label::Identity(p) => format!("identity({})", print_predicate_or_eps(algebra, p.as_ref())),
        Label::Pair(i, o) => format!(
            "pair({},{})",
            print_predicate_or_eps(algebra, i.as_ref()),
            print_predicate_or_eps(algebra, o.as_ref())
        ),
    }
}

pub fn print_sfa(sfa: &Sfa) -> String {
    let algebra = sfa.algebra();
    let alphabet: Vec<String> = algebra.alphabet().iter().map(|s| s.to_string()).collect();
    let names: Vec<String> = (0..sfa.num_states()).map(state_name).collect();
    let finals: Vec<String> = (0..sfa.num_states()).filter(|&s| sfa.is_accepting(s)).map(|s| names[s].clone()).collect();

    let mut out = String::new();
    out.push_str(&format!("fa(alphabet({})).\n", print_list(&alphabet)));
    out.push_str(&format!("fa(states({})).\n", print_list(&names)));
    out.push_str(&format!("fa(initial({})).\n", names[sfa.initial_state()]));
    out.push_str(&format!("fa(final({})).\n", print_list(&finals)));
    for s in 0..sfa.num_states() {
        for (p, t) in sfa.out_edges(s) {
            out.push_str(&format!("fa(transition({},{},{})).\n", names[s], print_predicate(algebra, p), names[*t]));
        }
    }
    out
}

pub fn print_sft(sft: &Sft) -> String {
    let algebra = sft.algebra();
    let alphabet: Vec<String> = algebra.alphabet().iter().map(|s| s.to_string()).collect();
    let names: Vec<String> = (0..sft.num_states()).map(state_name).collect();
    let finals: Vec<String> = (0..sft.num_states()).filter(|&s| sft.is_accepting(s)).map(|s| names[s].clone()).collect();

    let mut out = String::new();
    out.push_str(&format!("fa(alphabet({})).\n", print_list(&alphabet)));
    out.push_str(&format!("fa(states({})).\n", print_list(&names)));
    out.push_str(&format!("fa(initial({})).\n", names[sft.initial_state()]));
    out.push_str(&format!("fa(final({})).\n", print_list(&finals)));
    for s in 0..sft.num_states() {
        for (label, t) in sft.out_edges(s) {
            out.push_str(&format!("fa(transition({},{},{})).\n", names[s], print_label(algebra, label), names[*t]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        "fa(alphabet([a,b])).\nfa(states([q0,q1])).\nfa(initial(q0)).\nfa(final([q1])).\nfa(transition(q0,in[a],q1)).\n"
    }

    #[test]
    fn parses_a_minimal_sfa() {
        let parsed = parse_sfa(sample()).unwrap();
        let sfa: Sfa = parsed.try_into().unwrap();
        assert!(sfa.accepts(&[std::rc::Rc::from("a")]));
    }

    #[test]
    fn print_then_parse_round_trips() {
        let sfa: Sfa = parse_sfa(sample()).unwrap().try_into().unwrap();
        let printed = print_sfa(&sfa);
        let reparsed: Sfa = parse_sfa(&printed).unwrap().try_into().unwrap();
        assert_eq!(reparsed.accepts(&[std::rc::Rc::from("a")]), sfa.accepts(&[std::rc::Rc::from("a")]));
    }
}
