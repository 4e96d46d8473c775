//! §6/§10 configuration: a line-based `KEY = value` file (blank lines and
//! `#` comments allowed), parsed with the same `nom` combinator idiom the
//! automaton-format parsers use (`parser::fa::space_comment_line`), then
//! validated into a [`Config`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_till1};
use nom::character::complete::{char, line_ending, not_line_ending, space0};
use nom::combinator::{eof, map, opt, recognize, value, verify};
use nom::multi::{many0, many1, separated_list0};
use nom::sequence::{delimited, separated_pair, terminated};
use nom::{Finish, IResult};

use crate::abstraction::finite_length::BoundIncrement;
use crate::abstraction::predicate_language::Heuristic;
use crate::abstraction::Direction;
use crate::driver::ComputationDirection;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomataFormat {
    Dot,
    Timbuk,
    Fsa,
    Fsm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Jpg,
    Pdf,
    Png,
    Svg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialPredicateSource {
    Init,
    Bad,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialBoundSource {
    One,
    Init,
    Bad,
}

/// The parameters of whichever abstraction family `PREDICATE_LANGUAGES` or
/// `FINITE_LENGTH_LANGUAGES` selects (§6: exactly one is set).
#[derive(Debug, Clone)]
pub enum AbstractionConfig {
    PredicateLanguage {
        languages: Vec<String>,
        initial_predicate: InitialPredicateSource,
        include_guard: bool,
        include_action: bool,
        heuristic: Option<Heuristic>,
    },
    FiniteLength {
        languages: Vec<String>,
        trace_languages: bool,
        initial_bound: InitialBoundSource,
        halve_initial_bound: bool,
        bound_increment: BoundIncrement,
        halve_bound_increment: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub init_file_path: PathBuf,
    pub bad_file_path: PathBuf,
    pub tau_file_paths: Vec<PathBuf>,
    pub computation_direction: ComputationDirection,
    pub language_direction: Direction,
    pub timeout: Option<Duration>,
    pub verbose: bool,
    pub print_automata: bool,
    pub automata_format: AutomataFormat,
    pub output_directory: PathBuf,
    pub image_format: Option<ImageFormat>,
    pub abstraction: AbstractionConfig,
}

impl Config {
    /// Parses and validates a configuration file's full text in one step.
    pub fn from_str(input: &str) -> Result<Config, ConfigError> {
        parse(input)?.try_into()
    }

    /// Backs `--generate-config`: a complete, commented, ready-to-edit file.
    pub fn default_template() -> String {
        concat!(
            "# armc configuration\n",
            "INIT_FILE_PATH = init.fsa\n",
            "BAD_FILE_PATH = bad.fsa\n",
            "TAU_FILE_PATHS = tau.fsa\n",
            "COMPUTATION_DIRECTION = Forward\n",
            "LANGUAGE_DIRECTION = Forward\n",
            "TIMEOUT = 00:05:00\n",
            "VERBOSE = NO\n",
            "PRINT_AUTOMATA = NO\n",
            "AUTOMATA_FORMAT = FSA\n",
            "OUTPUT_DIRECTORY = armc-output\n",
            "IMAGE_FORMAT = \n",
            "\n",
            "# exactly one of PREDICATE_LANGUAGES / FINITE_LENGTH_LANGUAGES must be set\n",
            "PREDICATE_LANGUAGES = bad.fsa\n",
            "INITIAL_PREDICATE = Bad\n",
            "INCLUDE_GUARD = NO\n",
            "INCLUDE_ACTION = NO\n",
            "HEURISTIC = \n",
        )
        .to_string()
    }
}

/// Parses the raw `KEY = value` entries, without validating them. Exposed so
/// the CLI can report a syntax error distinctly from a semantic one.
pub fn parse(input: &str) -> Result<Vec<(String, String)>, ConfigError> {
    nom::combinator::all_consuming(full_config)(input)
        .finish()
        .map(|(_, entries)| entries)
        .map_err(|e| ConfigError::BadLine(e.input.lines().next().unwrap_or_default().to_string()))
}

fn full_config(input: &str) -> IResult<&str, Vec<(String, String)>> {
    delimited(
        many0(blank_line),
        separated_list0(many1(blank_line), entry_line),
        many0(blank_line),
    )(input)
}

fn entry_line(input: &str) -> IResult<&str, (String, String)> {
    map(
        delimited(
            space0,
            separated_pair(key, delimited(space0, char('='), space0), raw_value),
            space_comment,
        ),
        |(k, v): (&str, &str)| (k.trim().to_string(), v.trim_end().to_string()),
    )(input)
}

fn key(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace() || c == '=')(input)
}

fn raw_value(input: &str) -> IResult<&str, &str> {
    recognize(take_till(|c: char| c == '#' || c == '\n' || c == '\r'))(input)
}

fn blank_line(input: &str) -> IResult<&str, ()> {
    value(
        (),
        verify(
            recognize(terminated(space_comment, alt((line_ending, eof)))),
            |consumed: &str| !consumed.is_empty(),
        ),
    )(input)
}

fn space_comment(input: &str) -> IResult<&str, ()> {
    value((), nom::sequence::pair(space0, opt(comment)))(input)
}

fn comment(input: &str) -> IResult<&str, ()> {
    value((), nom::sequence::pair(tag("#"), not_line_ending))(input)
}

/// `[d.]hh:mm:ss[.fffffff]`; zero disables the timeout (§6).
fn parse_timeout(raw: &str) -> Result<Option<Duration>, ConfigError> {
    let raw = raw.trim();
    let bad = || ConfigError::BadValue("TIMEOUT", raw.to_string());
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return Err(bad());
    }

    let (days, hours) = match parts[0].split_once('.') {
        Some((d, h)) => (d.parse::<u64>().map_err(|_| bad())?, h.parse::<u64>().map_err(|_| bad())?),
        None => (0, parts[0].parse::<u64>().map_err(|_| bad())?),
    };
    let minutes: u64 = parts[1].parse().map_err(|_| bad())?;
    let (seconds, nanos): (u64, u32) = match parts[2].split_once('.') {
        Some((s, f)) => {
            let mut frac = f.to_string();
            frac.truncate(9);
            while frac.len() < 9 {
                frac.push('0');
            }
            (s.parse().map_err(|_| bad())?, frac.parse().map_err(|_| bad())?)
        }
        None => (parts[2].parse().map_err(|_| bad())?, 0),
    };

    let total_seconds = ((days * 24 + hours) * 60 + minutes) * 60 + seconds;
    if total_seconds == 0 && nanos == 0 {
        Ok(None)
    } else {
        Ok(Some(Duration::new(total_seconds, nanos)))
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim() {
        "YES" => Ok(true),
        "NO" => Ok(false),
        other => Err(ConfigError::BadValue(key, other.to_string())),
    }
}

fn parse_direction(key: &'static str, raw: &str) -> Result<Direction, ConfigError> {
    match raw.trim() {
        "Forward" => Ok(Direction::Forward),
        "Backward" => Ok(Direction::Backward),
        other => Err(ConfigError::BadValue(key, other.to_string())),
    }
}

fn required<'a>(map: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, ConfigError> {
    map.get(key).map(|s| s.as_str()).ok_or(ConfigError::MissingKey(key))
}

fn path_list(raw: &str) -> Vec<PathBuf> {
    raw.split(std::path::MAIN_SEPARATOR).filter(|s| !s.is_empty()).map(PathBuf::from).collect()
}

impl TryFrom<Vec<(String, String)>> for Config {
    type Error = ConfigError;

    fn try_from(entries: Vec<(String, String)>) -> Result<Self, Self::Error> {
        let mut by_key: HashMap<String, String> = HashMap::with_capacity(entries.len());
        for (k, v) in entries {
            if by_key.insert(k.clone(), v).is_some() {
                return Err(ConfigError::DuplicateKey(k));
            }
        }

        let init_file_path = PathBuf::from(required(&by_key, "INIT_FILE_PATH")?);
        let bad_file_path = PathBuf::from(required(&by_key, "BAD_FILE_PATH")?);
        let tau_file_paths = path_list(required(&by_key, "TAU_FILE_PATHS")?);

        let computation_direction = match required(&by_key, "COMPUTATION_DIRECTION")?.trim() {
            "Forward" => ComputationDirection::Forward,
            "Backward" => ComputationDirection::Backward,
            other => return Err(ConfigError::BadValue("COMPUTATION_DIRECTION", other.to_string())),
        };
        let language_direction = parse_direction("LANGUAGE_DIRECTION", required(&by_key, "LANGUAGE_DIRECTION")?)?;
        let timeout = parse_timeout(required(&by_key, "TIMEOUT")?)?;
        let verbose = parse_bool("VERBOSE", required(&by_key, "VERBOSE")?)?;
        let print_automata = parse_bool("PRINT_AUTOMATA", required(&by_key, "PRINT_AUTOMATA")?)?;

        let automata_format = match required(&by_key, "AUTOMATA_FORMAT")?.trim() {
            "DOT" => AutomataFormat::Dot,
            "TIMBUK" => AutomataFormat::Timbuk,
            "FSA" => AutomataFormat::Fsa,
            "FSM" => AutomataFormat::Fsm,
            other => return Err(ConfigError::BadValue("AUTOMATA_FORMAT", other.to_string())),
        };
        let output_directory = PathBuf::from(required(&by_key, "OUTPUT_DIRECTORY")?);
        let image_format = match by_key.get("IMAGE_FORMAT").map(|s| s.trim()).unwrap_or("") {
            "" => None,
            "gif" => Some(ImageFormat::Gif),
            "jpg" => Some(ImageFormat::Jpg),
            "pdf" => Some(ImageFormat::Pdf),
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            other => return Err(ConfigError::BadValue("IMAGE_FORMAT", other.to_string())),
        };

        let has_predicate = by_key.contains_key("PREDICATE_LANGUAGES");
        let has_finite_length = by_key.contains_key("FINITE_LENGTH_LANGUAGES");
        let abstraction = match (has_predicate, has_finite_length) {
            (true, false) => AbstractionConfig::PredicateLanguage {
                languages: path_list(required(&by_key, "PREDICATE_LANGUAGES")?)
                    .into_iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
                initial_predicate: match by_key.get("INITIAL_PREDICATE").map(|s| s.trim()).unwrap_or("Bad") {
                    "Init" => InitialPredicateSource::Init,
                    "Bad" => InitialPredicateSource::Bad,
                    "Both" => InitialPredicateSource::Both,
                    other => return Err(ConfigError::BadValue("INITIAL_PREDICATE", other.to_string())),
                },
                include_guard: by_key
                    .get("INCLUDE_GUARD")
                    .map(|v| parse_bool("INCLUDE_GUARD", v))
                    .transpose()?
                    .unwrap_or(false),
                include_action: by_key
                    .get("INCLUDE_ACTION")
                    .map(|v| parse_bool("INCLUDE_ACTION", v))
                    .transpose()?
                    .unwrap_or(false),
                heuristic: match by_key.get("HEURISTIC").map(|s| s.trim()).unwrap_or("") {
                    "" => None,
                    "ImportantStates" => Some(Heuristic::ImportantStates),
                    "KeyStates" => Some(Heuristic::KeyStates),
                    other => return Err(ConfigError::BadValue("HEURISTIC", other.to_string())),
                },
            },
            (false, true) => AbstractionConfig::FiniteLength {
                languages: path_list(required(&by_key, "FINITE_LENGTH_LANGUAGES")?)
                    .into_iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
                trace_languages: by_key
                    .get("TRACE_LANGUAGES")
                    .map(|v| parse_bool("TRACE_LANGUAGES", v))
                    .transpose()?
                    .unwrap_or(false),
                initial_bound: match by_key.get("INITIAL_BOUND").map(|s| s.trim()).unwrap_or("One") {
                    "One" => InitialBoundSource::One,
                    "Init" => InitialBoundSource::Init,
                    "Bad" => InitialBoundSource::Bad,
                    other => return Err(ConfigError::BadValue("INITIAL_BOUND", other.to_string())),
                },
                halve_initial_bound: by_key
                    .get("HALVE_INITIAL_BOUND")
                    .map(|v| parse_bool("HALVE_INITIAL_BOUND", v))
                    .transpose()?
                    .unwrap_or(false),
                bound_increment: match by_key.get("BOUND_INCREMENT").map(|s| s.trim()).unwrap_or("One") {
                    "One" => BoundIncrement::One,
                    "X" => BoundIncrement::X,
                    "M" => BoundIncrement::M,
                    other => return Err(ConfigError::BadValue("BOUND_INCREMENT", other.to_string())),
                },
                halve_bound_increment: by_key
                    .get("HALVE_BOUND_INCREMENT")
                    .map(|v| parse_bool("HALVE_BOUND_INCREMENT", v))
                    .transpose()?
                    .unwrap_or(false),
            },
            _ => return Err(ConfigError::AbstractionSelectionConflict),
        };

        Ok(Config {
            init_file_path,
            bad_file_path,
            tau_file_paths,
            computation_direction,
            language_direction,
            timeout,
            verbose,
            print_automata,
            automata_format,
            output_directory,
            image_format,
            abstraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config_text() -> String {
        concat!(
            "INIT_FILE_PATH = init.fsa\n",
            "BAD_FILE_PATH = bad.fsa  # trailing comment\n",
            "TAU_FILE_PATHS = tau.fsa\n",
            "\n",
            "COMPUTATION_DIRECTION = Forward\n",
            "LANGUAGE_DIRECTION = Forward\n",
            "TIMEOUT = 00:00:00\n",
            "VERBOSE = NO\n",
            "PRINT_AUTOMATA = NO\n",
            "AUTOMATA_FORMAT = FSA\n",
            "OUTPUT_DIRECTORY = out\n",
            "PREDICATE_LANGUAGES = bad.fsa\n",
        )
        .to_string()
    }

    #[test]
    fn parses_key_value_pairs_ignoring_blanks_and_comments() {
        let entries = parse(&minimal_config_text()).unwrap();
        assert!(entries.contains(&("INIT_FILE_PATH".to_string(), "init.fsa".to_string())));
        assert!(entries.contains(&("BAD_FILE_PATH".to_string(), "bad.fsa".to_string())));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = Config::from_str(&minimal_config_text()).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut text = minimal_config_text();
        text.push_str("VERBOSE = YES\n");
        assert!(matches!(Config::from_str(&text), Err(ConfigError::DuplicateKey(_))));
    }

    #[test]
    fn rejects_setting_both_abstraction_families() {
        let mut text = minimal_config_text();
        text.push_str("FINITE_LENGTH_LANGUAGES = bad.fsa\n");
        assert!(matches!(Config::from_str(&text), Err(ConfigError::AbstractionSelectionConflict)));
    }

    #[test]
    fn rejects_missing_required_key() {
        let text = "INIT_FILE_PATH = init.fsa\n".to_string();
        assert!(matches!(Config::from_str(&text), Err(ConfigError::MissingKey("BAD_FILE_PATH"))));
    }

    #[test]
    fn nonzero_timeout_parses_hms() {
        let mut text = minimal_config_text();
        text = text.replace("TIMEOUT = 00:00:00\n", "TIMEOUT = 00:05:30\n");
        let config = Config::from_str(&text).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(5 * 60 + 30)));
    }

    #[test]
    fn default_template_round_trips_through_parse() {
        let template = Config::default_template();
        // The template's abstraction section is commented except for one key;
        // parsing it must still succeed as raw entries even before validation.
        assert!(parse(&template).is_ok());
    }
}
