//! §6 textual automaton-format parsers and printers: Timbuk, FSA, FSM and
//! DOT. Each parser builds a [`crate::sfa::parse::ParsedSfa`] /
//! [`crate::sft::parse::ParsedSft`] rather than an `Sfa`/`Sft` directly, so
//! validation stays in one place (§6 "collaborator contract") regardless of
//! which textual format produced it. DOT is write-only, used for
//! visualisation (§6).

pub mod dot;
pub mod fsa;
pub mod fsm;
pub mod timbuk;

use crate::config::AutomataFormat;
use crate::error::ParserError;
use crate::sfa::parse::ParsedSfa;
use crate::sfa::Sfa;
use crate::sft::parse::ParsedSft;
use crate::sft::Sft;

/// Parses `text` as an [`Sfa`] in the given format.
pub fn read_sfa(format: AutomataFormat, text: &str) -> Result<Sfa, ParserError> {
    let parsed: ParsedSfa = match format {
        AutomataFormat::Timbuk => timbuk::parse_sfa(text)?,
        AutomataFormat::Fsa => fsa::parse_sfa(text)?,
        AutomataFormat::Fsm => fsm::parse_sfa(text)?,
        AutomataFormat::Dot => return Err(ParserError::UnknownFormat("DOT (write-only)".to_string())),
    };
    Sfa::try_from(parsed).map_err(|e| ParserError::Syntax {
        format: format_name(format),
        message: e.to_string(),
    })
}

/// Parses `text` as an [`Sft`] in the given format.
pub fn read_sft(format: AutomataFormat, text: &str) -> Result<Sft, ParserError> {
    let parsed: ParsedSft = match format {
        AutomataFormat::Timbuk => timbuk::parse_sft(text)?,
        AutomataFormat::Fsa => fsa::parse_sft(text)?,
        AutomataFormat::Fsm => fsm::parse_sft(text)?,
        AutomataFormat::Dot => return Err(ParserError::UnknownFormat("DOT (write-only)".to_string())),
    };
    Sft::try_from(parsed).map_err(|e| ParserError::Syntax {
        format: format_name(format),
        message: e.to_string(),
    })
}

/// Prints `sfa` in the given format (DOT included, for visualisation).
pub fn write_sfa(format: AutomataFormat, sfa: &Sfa) -> String {
    match format {
        AutomataFormat::Timbuk => timbuk::print_sfa(sfa),
        AutomataFormat::Fsa => fsa::print_sfa(sfa),
        AutomataFormat::Fsm => fsm::print_sfa(sfa),
        AutomataFormat::Dot => dot::print_sfa(sfa),
    }
}

/// Prints `sft` in the given format (DOT included, for visualisation).
pub fn write_sft(format: AutomataFormat, sft: &Sft) -> String {
    match format {
        AutomataFormat::Timbuk => timbuk::print_sft(sft),
        AutomataFormat::Fsa => fsa::print_sft(sft),
        AutomataFormat::Fsm => fsm::print_sft(sft),
        AutomataFormat::Dot => dot::print_sft(sft),
    }
}

fn format_name(format: AutomataFormat) -> &'static str {
    match format {
        AutomataFormat::Timbuk => "Timbuk",
        AutomataFormat::Fsa => "FSA",
        AutomataFormat::Fsm => "FSM",
        AutomataFormat::Dot => "DOT",
    }
}

/// Shared token grammar used by every text-based parser below: a bare
/// identifier made of anything but whitespace and the punctuation the
/// surrounding grammar relies on (mirrors `parser::fa::state_name`).
pub(crate) fn token(input: &str) -> nom::IResult<&str, &str> {
    use nom::bytes::complete::take_till1;
    use nom::combinator::verify;
    verify(
        take_till1(|c: char| c.is_whitespace() || "(){}[]/,;".contains(c)),
        |s: &str| !s.is_empty(),
    )(input)
}
