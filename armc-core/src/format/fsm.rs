//! FSM textual format (§6): numeric columns rather than symbolic state
//! names — states are plain indices `0..n`, and transitions reference
//! alphabet symbols by index rather than by name. A predicate is `in:0,1`,
//! `notin:2`, or a bare index as an abbreviation for `in:<index>`. A
//! transducer label is `id:P` (identity) or `In/Out` (either half may be
//! `-`, denoting eps). The `final` line lists only genuinely accepting
//! states, never every state.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, line_ending, space1};
use nom::combinator::{all_consuming, map, map_res, value};
use nom::multi::{many0, separated_list0, separated_list1};
use nom::sequence::{delimited, preceded, separated_pair, terminated, tuple};
use nom::{Finish, IResult};
use std::collections::HashSet;

use crate::error::ParserError;
use crate::label::Label;
use crate::predicate::{Kind, Predicate};
use crate::sfa::parse::{ParsedPredicate, ParsedSfa, ParsedSfaState, ParsedTransition};
use crate::sfa::Sfa;
use crate::sft::parse::{ParsedLabel, ParsedSft, ParsedSftState, ParsedTTransition};
use crate::sft::Sft;

use super::token;

const FORMAT: &str = "FSM";

fn syntax_error(e: nom::error::Error<&str>) -> ParserError {
    ParserError::Syntax {
        format: FORMAT,
        message: format!("{e:?}"),
    }
}

fn index(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse)(input)
}

fn states_line(input: &str) -> IResult<&str, usize> {
    delimited(tuple((tag("states"), space1)), index, line_ending)(input)
}

fn symbols_line(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(tuple((tag("symbols"), space1)), separated_list1(space1, token), line_ending)(input)
}

fn initial_line(input: &str) -> IResult<&str, usize> {
    delimited(tuple((tag("initial"), space1)), index, line_ending)(input)
}

fn final_line(input: &str) -> IResult<&str, Vec<usize>> {
    delimited(tuple((tag("final"), space1)), separated_list0(space1, index), line_ending)(input)
}

fn transitions_header(input: &str) -> IResult<&str, ()> {
    value((), tuple((tag("transitions"), line_ending)))(input)
}

fn index_list(input: &str) -> IResult<&str, Vec<usize>> {
    separated_list1(tag(","), index)(input)
}

fn predicate(input: &str) -> IResult<&str, ParsedPredicate> {
    alt((
        map(preceded(tag("in:"), index_list), |v: Vec<usize>| ParsedPredicate::In(v.iter().map(usize::to_string).collect())),
        map(preceded(tag("notin:"), index_list), |v: Vec<usize>| ParsedPredicate::NotIn(v.iter().map(usize::to_string).collect())),
        map(index, |i: usize| ParsedPredicate::In(vec![i.to_string()])),
    ))(input)
}

fn predicate_or_eps(input: &str) -> IResult<&str, Option<ParsedPredicate>> {
    alt((value(None, tag("-")), map(predicate, Some)))(input)
}

fn label(input: &str) -> IResult<&str, ParsedLabel> {
    alt((
        map(preceded(tag("id:"), predicate_or_eps), ParsedLabel::Identity),
        map(separated_pair(predicate_or_eps, tag("/"), predicate_or_eps), |(i, o)| ParsedLabel::Pair(i, o)),
    ))(input)
}

fn sfa_transition_line(input: &str) -> IResult<&str, (usize, ParsedPredicate, usize)> {
    terminated(tuple((index, preceded(space1, predicate), preceded(space1, index))), line_ending)(input)
}

fn sft_transition_line(input: &str) -> IResult<&str, (usize, ParsedLabel, usize)> {
    terminated(tuple((index, preceded(space1, label), preceded(space1, index))), line_ending)(input)
}

struct Header<'a> {
    num_states: usize,
    symbols: Vec<&'a str>,
    initial: usize,
    finals: Vec<usize>,
}

fn header(input: &str) -> IResult<&str, Header<'_>> {
    map(tuple((states_line, symbols_line, initial_line, final_line)), |(num_states, symbols, initial, finals)| Header {
        num_states,
        symbols,
        initial,
        finals,
    })(input)
}

/// This numeric-index format indexes symbols the same way whether the
/// predicate abbreviates a single index or spells out `in:`/`notin:` — the
/// resolved index is reused verbatim as the alphabet index downstream, so
/// the only translation needed here is turning an index back into its
/// declared symbol name for the `ParsedPredicate` representation.
fn resolve_predicate(symbols: &[&str], predicate: ParsedPredicate) -> ParsedPredicate {
    let resolve = |indices: Vec<String>| -> Vec<String> {
        indices
            .iter()
            .map(|s| s.parse::<usize>().ok().and_then(|i| symbols.get(i)).map(|s| s.to_string()).unwrap_or_else(|| s.clone()))
            .collect()
    };
    match predicate {
        ParsedPredicate::In(v) => ParsedPredicate::In(resolve(v)),
        ParsedPredicate::NotIn(v) => ParsedPredicate::NotIn(resolve(v)),
    }
}

fn resolve_label(symbols: &[&str], label: ParsedLabel) -> ParsedLabel {
    match label {
        ParsedLabel::Identity(p) => ParsedLabel::Identity(p.map(|p| resolve_predicate(symbols, p))),
        ParsedLabel::Pair(i, o) => ParsedLabel::Pair(i.map(|p| resolve_predicate(symbols, p)), o.map(|p| resolve_predicate(symbols, p))),
    }
}

fn full_sfa(input: &str) -> IResult<&str, ParsedSfa> {
    map(tuple((header, transitions_header, many0(sfa_transition_line), many0(line_ending))), |(h, _, transitions, _)| {
        build_sfa(h, transitions)
    })(input)
}

fn full_sft(input: &str) -> IResult<&str, ParsedSft> {
    map(tuple((header, transitions_header, many0(sft_transition_line), many0(line_ending))), |(h, _, transitions, _)| {
        build_sft(h, transitions)
    })(input)
}

fn build_sfa(h: Header<'_>, transitions: Vec<(usize, ParsedPredicate, usize)>) -> ParsedSfa {
    let finals: HashSet<usize> = h.finals.into_iter().collect();
    let mut by_state: Vec<Vec<ParsedTransition>> = vec![Vec::new(); h.num_states];
    for (from, predicate, to) in transitions {
        by_state[from].push(ParsedTransition {
            predicate: resolve_predicate(&h.symbols, predicate),
            target: to.to_string(),
        });
    }
    let states = (0..h.num_states)
        .map(|idx| ParsedSfaState {
            name: idx.to_string(),
            initial: idx == h.initial,
            accepting: finals.contains(&idx),
            transitions: std::mem::take(&mut by_state[idx]),
        })
        .collect();
    ParsedSfa {
        alphabet: h.symbols.into_iter().map(String::from).collect(),
        states,
        automaton_name: None,
    }
}

fn build_sft(h: Header<'_>, transitions: Vec<(usize, ParsedLabel, usize)>) -> ParsedSft {
    let finals: HashSet<usize> = h.finals.into_iter().collect();
    let mut by_state: Vec<Vec<ParsedTTransition>> = vec![Vec::new(); h.num_states];
    for (from, label, to) in transitions {
        by_state[from].push(ParsedTTransition {
            label: resolve_label(&h.symbols, label),
            target: to.to_string(),
        });
    }
    let states = (0..h.num_states)
        .map(|idx| ParsedSftState {
            name: idx.to_string(),
            initial: idx == h.initial,
            accepting: finals.contains(&idx),
            transitions: std::mem::take(&mut by_state[idx]),
        })
        .collect();
    ParsedSft {
        alphabet: h.symbols.into_iter().map(String::from).collect(),
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

fn print_predicate(p: &Predicate) -> String {
    let indices: Vec<String> = p.raw_set().iter().map(usize::to_string).collect();
    match p.kind() {
        Kind::In => format!("in:{}", indices.join(",")),
        Kind::NotIn => format!("notin:{}", indices.join(",")),
    }
}

fn print_predicate_or_eps(p: Option<&Predicate>) -> String {
    p.map(print_predicate).unwrap_or_else(|| "-".to_string())
}

fn print_label(label: &Label) -> String {
    match label {
        Label::Identity(p) => format!("id:{}", print_predicate_or_eps(p.as_ref())),
        Label::Pair(i, o) => format!("{}/{}", print_predicate_or_eps(i.as_ref()), print_predicate_or_eps(o.as_ref())),
    }
}

pub fn print_sfa(sfa: &Sfa) -> String {
    let algebra = sfa.algebra();
    let symbols: Vec<String> = algebra.alphabet().iter().map(|s| s.to_string()).collect();
    // Only genuinely accepting states are listed, never every state.
    let finals: Vec<String> = (0..sfa.num_states()).filter(|&s| sfa.is_accepting(s)).map(|s| s.to_string()).collect();

    let mut out = String::new();
    out.push_str(&format!("states {}\n", sfa.num_states()));
    out.push_str(&format!("symbols {}\n", symbols.join(" ")));
    out.push_str(&format!("initial {}\n", sfa.initial_state()));
    out.push_str(&format!("final {}\n", finals.join(" ")));
    out.push_str("transitions\n");
    for s in 0..sfa.num_states() {
        for (p, t) in sfa.out_edges(s) {
            out.push_str(&format!("{} {} {}\n", s, print_predicate(p), t));
        }
    }
    out
}

pub fn print_sft(sft: &Sft) -> String {
    let algebra = sft.algebra();
    let symbols: Vec<String> = algebra.alphabet().iter().map(|s| s.to_string()).collect();
    let finals: Vec<String> = (0..sft.num_states()).filter(|&s| sft.is_accepting(s)).map(|s| s.to_string()).collect();

    let mut out = String::new();
    out.push_str(&format!("states {}\n", sft.num_states()));
    out.push_str(&format!("symbols {}\n", symbols.join(" ")));
    out.push_str(&format!("initial {}\n", sft.initial_state()));
    out.push_str(&format!("final {}\n", finals.join(" ")));
    out.push_str("transitions\n");
    for s in 0..sft.num_states() {
        for (label, t) in sft.out_edges(s) {
            out.push_str(&format!("{} {} {}\n", s, print_label(label), t));
        }
    }
    out
}
