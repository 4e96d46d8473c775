//! Timbuk-style textual format (§6): a header block (`Ops`/`States`/
//! `Initial`/`Final`) followed by one `Transitions` line per edge, written
//! `from -[label]-> to`. A predicate is `in{a,b}`, `not_in{a,b}`, or a bare
//! symbol as an abbreviation for `in{symbol}`. A transducer label is either
//! `input/output` or `@predicate` for an identity edge; either half of a
//! pair may be the literal `eps`, denoting no symbol consumed/produced.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{line_ending, space1};
use nom::combinator::{all_consuming, map, opt, value};
use nom::multi::{many0, separated_list0, separated_list1};
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

const FORMAT: &str = "Timbuk";

fn syntax_error(e: nom::error::Error<&str>) -> ParserError {
    ParserError::Syntax {
        format: FORMAT,
        message: format!("{e:?}"),
    }
}

fn name_line(input: &str) -> IResult<&str, &str> {
    delimited(tuple((tag("Automaton"), space1)), token, line_ending)(input)
}

fn ops_line(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(tuple((tag("Ops"), space1)), separated_list1(space1, token), line_ending)(input)
}

fn states_line(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(tuple((tag("States"), space1)), separated_list1(space1, token), line_ending)(input)
}

fn initial_line(input: &str) -> IResult<&str, &str> {
    delimited(tuple((tag("Initial"), space1)), token, line_ending)(input)
}

fn final_line(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(tuple((tag("Final"), space1)), separated_list1(space1, token), line_ending)(input)
}

fn transitions_header(input: &str) -> IResult<&str, ()> {
    value((), tuple((tag("Transitions"), line_ending)))(input)
}

fn predicate(input: &str) -> IResult<&str, ParsedPredicate> {
    alt((
        map(delimited(tag("in{"), separated_list0(tag(","), token), tag("}")), |syms: Vec<&str>| {
            ParsedPredicate::In(syms.into_iter().map(String::from).collect())
        }),
        map(delimited(tag("not_in{"), separated_list0(tag(","), token), tag("}")), |syms: Vec<&str>| {
            ParsedPredicate::NotIn(syms.into_iter().map(String::from).collect())
        }),
        map(token, |s: &str| ParsedPredicate::In(vec![s.to_string()])),
    ))(input)
}

fn predicate_or_eps(input: &str) -> IResult<&str, Option<ParsedPredicate>> {
    alt((value(None, tag("eps")), map(predicate, Some)))(input)
}

fn label(input: &str) -> IResult<&str, ParsedLabel> {
    alt((
        map(preceded(tag("@"), predicate_or_eps), ParsedLabel::Identity),
        map(separated_pair(predicate_or_eps, tag("/"), predicate_or_eps), |(i, o)| ParsedLabel::Pair(i, o)),
    ))(input)
}

fn sfa_transition_line(input: &str) -> IResult<&str, (&str, ParsedPredicate, &str)> {
    terminated(tuple((token, delimited(tag(" -["), predicate, tag("]-> ")), token)), line_ending)(input)
}

fn sft_transition_line(input: &str) -> IResult<&str, (&str, ParsedLabel, &str)> {
    terminated(tuple((token, delimited(tag(" -["), label, tag("]-> ")), token)), line_ending)(input)
}

struct Header<'a> {
    name: Option<&'a str>,
    ops: Vec<&'a str>,
    states: Vec<&'a str>,
    initial: &'a str,
    finals: Vec<&'a str>,
}

fn header(input: &str) -> IResult<&str, Header<'_>> {
    map(
        tuple((opt(name_line), ops_line, states_line, initial_line, final_line)),
        |(name, ops, states, initial, finals)| Header { name, ops, states, initial, finals },
    )(input)
}

fn full_sfa(input: &str) -> IResult<&str, ParsedSfa> {
    map(
        tuple((header, transitions_header, many0(sfa_transition_line), many0(line_ending))),
        |(h, _, transitions, _)| build_parsed_sfa(h, transitions),
    )(input)
}

fn full_sft(input: &str) -> IResult<&str, ParsedSft> {
    map(
        tuple((header, transitions_header, many0(sft_transition_line), many0(line_ending))),
        |(h, _, transitions, _)| build_parsed_sft(h, transitions),
    )(input)
}

fn build_parsed_sfa(h: Header<'_>, transitions: Vec<(&str, ParsedPredicate, &str)>) -> ParsedSfa {
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
        alphabet: h.ops.into_iter().map(String::from).collect(),
        states,
        automaton_name: h.name.map(String::from),
    }
}

fn build_parsed_sft(h: Header<'_>, transitions: Vec<(&str, ParsedLabel, &str)>) -> ParsedSft {
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
        alphabet: h.ops.into_iter().map(String::from).collect(),
        states,
        automaton_name: h.name.map(String::from),
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

fn print_predicate(algebra: &PredicateAlgebra, p: &Predicate) -> String {
    let symbols: Vec<&str> = p.raw_set().iter().map(|&i| algebra.alphabet().symbol(i).as_ref()).collect();
    match p.kind() {
        Kind::In => format!("in{{{}}}", symbols.join(",")),
        Kind::NotIn => format!("not_in{{{}}}", symbols.join(",")),
    }
}

fn print_predicate_or_eps(algebra: &PredicateAlgebra, p: Option<&Predicate>) -> String {
    p.map(|p| print_predicate(algebra, p)).unwrap_or_else(|| "eps".to_string())
}

fn print_label(algebra: &PredicateAlgebra, label: &Label) -> String {
    match label {
        Label::Identity(p) => format!("@{}", print_predicate_or_eps(algebra, p.as_ref())),
        Label::Pair(i, o) => format!(
            "{}/{}",
            print_predicate_or_eps(algebra, i.as_ref()),
            print_predicate_or_eps(algebra, o.as_ref())
        ),
    }
}

pub fn print_sfa(sfa: &Sfa) -> String {
    let algebra = sfa.algebra();
    let alphabet: Vec<String> = algebra.alphabet().iter().map(|s| s.to_string()).collect();
    let names: Vec<String> = (0..sfa.num_states()).map(state_name).collect();
    let finals: Vec<&str> = (0..sfa.num_states())
        .filter(|&s| sfa.is_accepting(s))
        .map(|s| names[s].as_str())
        .collect();

    let mut out = String::new();
    if let Some(name) = sfa.name() {
        out.push_str(&format!("Automaton {name}\n"));
    }
    out.push_str(&format!("Ops {}\n", alphabet.join(" ")));
    out.push_str(&format!("States {}\n", names.join(" ")));
    out.push_str(&format!("Initial {}\n", names[sfa.initial_state()]));
    out.push_str(&format!("Final {}\n", finals.join(" ")));
    out.push_str("Transitions\n");
    for s in 0..sfa.num_states() {
        for (p, t) in sfa.out_edges(s) {
            out.push_str(&format!("{} -[{}]-> {}\n", names[s], print_predicate(algebra, p), names[*t]));
        }
    }
    out
}

pub fn print_sft(sft: &Sft) -> String {
    let algebra = sft.algebra();
    let alphabet: Vec<String> = algebra.alphabet().iter().map(|s| s.to_string()).collect();
    let names: Vec<String> = (0..sft.num_states()).map(state_name).collect();
    let finals: Vec<&str> = (0..sft.num_states())
        .filter(|&s| sft.is_accepting(s))
        .map(|s| names[s].as_str())
        .collect();

    let mut out = String::new();
    if let Some(name) = sft.name() {
        out.push_str(&format!("Automaton {name}\n"));
    }
    out.push_str(&format!("Ops {}\n", alphabet.join(" ")));
    out.push_str(&format!("States {}\n", names.join(" ")));
    out.push_str(&format!("Initial {}\n", names[sft.initial_state()]));
    out.push_str(&format!("Final {}\n", finals.join(" ")));
    out.push_str("Transitions\n");
    for s in 0..sft.num_states() {
        for (label, t) in sft.out_edges(s) {
            out.push_str(&format!("{} -[{}]-> {}\n", names[s], print_label(algebra, label), names[*t]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sfa_text() -> &'static str {
        "Ops a b\nStates q0 q1\nInitial q0\nFinal q1\nTransitions\nq0 -[in{a}]-> q1\nq1 -[not_in{b}]-> q1\n"
    }

    #[test]
    fn parses_a_simple_sfa() {
        let parsed = parse_sfa(sample_sfa_text()).unwrap();
        assert_eq!(parsed.alphabet, vec!["a", "b"]);
        assert_eq!(parsed.states.len(), 2);
        let sfa: Sfa = parsed.try_into().unwrap();
        assert!(sfa.accepts(&[std::rc::Rc::from("a")]));
    }

    #[test]
    fn print_then_parse_round_trips_a_minimal_sfa() {
        let parsed = parse_sfa(sample_sfa_text()).unwrap();
        let sfa: Sfa = parsed.try_into().unwrap();
        let printed = print_sfa(&sfa);
        let reparsed: Sfa = parse_sfa(&printed).unwrap().try_into().unwrap();
        assert_eq!(reparsed.accepts(&[std::rc::Rc::from("a")]), sfa.accepts(&[std::rc::Rc::from("a")]));
    }

    #[test]
    fn parses_an_identity_transducer_label() {
        let text = "Ops a\nStates q0\nInitial q0\nFinal q0\nTransitions\nq0 -[@in{a}]-> q0\n";
        let parsed = parse_sft(text).unwrap();
        let sft: Sft = parsed.try_into().unwrap();
        assert_eq!(sft.num_states(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_sfa("not a valid header\n").is_err());
    }
}
