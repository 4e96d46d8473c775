use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use armc_core::abstraction::finite_length::{FiniteLengthAbstraction, LanguageFlavor};
use armc_core::abstraction::predicate_language::PredicateLanguageAbstraction;
use armc_core::abstraction::Abstraction;
use armc_core::config::{AbstractionConfig, AutomataFormat, Config, InitialBoundSource};
use armc_core::driver::{Counterexample, Driver, VerifyResult};
use armc_core::error::{ArmcError, ConfigError, ParserError};
use armc_core::format;
use armc_core::sfa::words::Words;
use armc_core::sfa::Sfa;
use armc_core::sft::Sft;
use clap::Parser;
use thiserror::Error;

const SAMPLE_WORD_COUNT: usize = 3;
const SAMPLE_WORD_MAX_LEN: usize = 6;

/// Abstract regular model checking: proves `post*(Init) ∩ Bad = ∅` for a
/// transition system `τ` over a finite alphabet, or reports a
/// counterexample.
#[derive(Debug, Parser)]
#[command(name = "armc", version, about)]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = "armc.properties")]
    config: PathBuf,

    /// Override INIT_FILE_PATH.
    #[arg(short, long)]
    init: Option<PathBuf>,

    /// Override BAD_FILE_PATH.
    #[arg(short, long)]
    bad: Option<PathBuf>,

    /// Override TAU_FILE_PATHS with a single path.
    #[arg(short, long)]
    tau: Option<PathBuf>,

    /// Write a default configuration file and exit.
    #[arg(short = 'g', long)]
    generate_config: bool,

    /// Raise the log filter to debug for this run.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Armc(#[from] ArmcError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            use clap::error::ErrorKind;
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                print!("{e}");
                return ExitCode::SUCCESS;
            }
            eprintln!("Error - {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error - {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    if verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();
}

fn run(args: Args) -> Result<(), CliError> {
    if args.generate_config {
        fs::write(&args.config, Config::default_template())?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    let mut config = Config::from_str(&fs::read_to_string(&args.config)?)?;
    if let Some(init) = args.init {
        config.init_file_path = init;
    }
    if let Some(bad) = args.bad {
        config.bad_file_path = bad;
    }
    if let Some(tau) = args.tau {
        config.tau_file_paths = vec![tau];
    }

    let init = read_sfa(&config.init_file_path, config.automata_format)?;
    let bad = read_sfa(&config.bad_file_path, config.automata_format)?;
    let transducers: Vec<Sft> = config
        .tau_file_paths
        .iter()
        .map(|p| read_sft(p, config.automata_format))
        .collect::<Result<_, CliError>>()?;

    if config.print_automata {
        print!("{}", format::write_sfa(config.automata_format, &init));
        print!("{}", format::write_sfa(config.automata_format, &bad));
        for tau in &transducers {
            print!("{}", format::write_sft(config.automata_format, tau));
        }
    }

    prepare_output_directory(&config.output_directory)?;
    write_input_dump(&config, &init, &bad, &transducers)?;

    let abstraction = build_abstraction(&config, &init, &bad, &transducers)?;
    let direction = config.computation_direction;
    let mut driver = Driver::new(init, bad, transducers, abstraction, direction, config.timeout)?;

    match driver.verify() {
        Ok(VerifyResult::Holds) => {
            println!("HOLDS (after {} outer loop iterations)", driver.loops());
            Ok(())
        }
        Ok(VerifyResult::Violated(counterexample)) => {
            println!("VIOLATED (after {} outer loop iterations)", driver.loops());
            write_counterexample(&config, &counterexample)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn read_sfa(path: &Path, format: AutomataFormat) -> Result<Sfa, CliError> {
    let text = fs::read_to_string(path)?;
    Ok(format::read_sfa(format, &text)?)
}

fn read_sft(path: &Path, format: AutomataFormat) -> Result<Sft, CliError> {
    let text = fs::read_to_string(path)?;
    Ok(format::read_sft(format, &text)?)
}

/// Builds the driver's `Box<dyn Abstraction>` from the config's selected
/// family (§4.5). `PREDICATE_LANGUAGES` entries name which of `Init`, `Bad`,
/// or a transducer's `Dom`/`Range` seed the predicate family; any entry that
/// doesn't match one of those tokens is silently ignored.
fn build_abstraction(config: &Config, init: &Sfa, bad: &Sfa, transducers: &[Sft]) -> Result<Box<dyn Abstraction>, CliError> {
    match &config.abstraction {
        AbstractionConfig::PredicateLanguage {
            languages,
            heuristic,
            ..
        } => {
            let seed = seed_predicates(languages, init, bad, transducers);
            Ok(Box::new(PredicateLanguageAbstraction::new(seed, config.language_direction, *heuristic)))
        }
        AbstractionConfig::FiniteLength {
            trace_languages,
            initial_bound,
            halve_initial_bound,
            bound_increment,
            halve_bound_increment,
            ..
        } => {
            let flavor = if *trace_languages { LanguageFlavor::Trace } else { LanguageFlavor::State };
            let raw_bound = match initial_bound {
                InitialBoundSource::One => 1,
                InitialBoundSource::Init => init.num_states(),
                InitialBoundSource::Bad => bad.num_states(),
            };
            let bound = if *halve_initial_bound { (raw_bound / 2).max(1) } else { raw_bound };
            Ok(Box::new(FiniteLengthAbstraction::new(
                bound,
                flavor,
                config.language_direction,
                *bound_increment,
                *halve_bound_increment,
            )))
        }
    }
}

fn seed_predicates(languages: &[String], init: &Sfa, bad: &Sfa, transducers: &[Sft]) -> Vec<Sfa> {
    let mut seed = Vec::new();
    for token in languages {
        match token.as_str() {
            "Init" => seed.push(init.clone()),
            "Bad" => seed.push(bad.clone()),
            "Dom" => seed.extend(transducers.iter().map(Sft::domain)),
            "Range" => seed.extend(transducers.iter().map(Sft::range)),
            other => log::warn!("ignoring unrecognised PREDICATE_LANGUAGES entry {other:?}"),
        }
    }
    seed
}

fn prepare_output_directory(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

fn write_input_dump(config: &Config, init: &Sfa, bad: &Sfa, transducers: &[Sft]) -> std::io::Result<()> {
    let dir = config.output_directory.join("armc-input");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("init.{}", extension(config.automata_format))), format::write_sfa(config.automata_format, init))?;
    fs::write(dir.join(format!("bad.{}", extension(config.automata_format))), format::write_sfa(config.automata_format, bad))?;
    for (i, tau) in transducers.iter().enumerate() {
        fs::write(
            dir.join(format!("tau-{i}.{}", extension(config.automata_format))),
            format::write_sft(config.automata_format, tau),
        )?;
    }
    Ok(())
}

fn write_counterexample(config: &Config, counterexample: &Counterexample) -> std::io::Result<()> {
    let dir = config.output_directory.join("armc-counterexample");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("loop-index.txt"), format!("{}\n", counterexample.loop_index))?;
    for (i, m) in counterexample.trace.iter().enumerate() {
        fs::write(dir.join(format!("step-{i}.{}", extension(config.automata_format))), format::write_sfa(config.automata_format, m))?;
        if let Some(word) = m.shortest_accepted_word() {
            let rendered: Vec<&str> = word.iter().map(|s| s.as_ref()).collect();
            log::info!("step {i}: witness word [{}]", rendered.join(", "));
        }
    }
    if config.verbose {
        if let Some(last) = counterexample.trace.last() {
            for word in Words::new(last, SAMPLE_WORD_MAX_LEN).take(SAMPLE_WORD_COUNT) {
                let rendered: Vec<&str> = word.iter().map(|s| s.as_ref()).collect();
                println!("sample word: [{}]", rendered.join(", "));
            }
        }
    }
    Ok(())
}

fn extension(format: AutomataFormat) -> &'static str {
    match format {
        AutomataFormat::Dot => "dot",
        AutomataFormat::Timbuk => "timbuk",
        AutomataFormat::Fsa => "fsa",
        AutomataFormat::Fsm => "fsm",
    }
}
