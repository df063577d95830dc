//! CLI driver (spec §6 EXTERNAL INTERFACES). Parses one or more input
//! files, runs the termination pipeline (or a query/rewrite mode) over
//! each, and writes proof text to the configured sink.

use afsmterm::error::{Answer, ParseError};
use afsmterm::first_order::{ExternalFirstOrderProver, FirstOrderProver, NoFirstOrderProver};
use afsmterm::framework::prove_termination;
use afsmterm::output::{ProofSink, Style};
use afsmterm::parser::{self, Format, ParsedSystem};
use afsmterm::policy::Policy;
use afsmterm::reduction_pair::PolynomialInterpretation;
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::time::Duration;

/// Answers a structural question about a parsed system instead of
/// proving termination (spec §6 `--query=<name>`; ported from the
/// original `wanda` binary's query mode, carried per SPEC_FULL.md E.6).
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Prove,
    Query(String),
    Rewrite,
}

#[derive(Parser, Debug)]
#[command(name = "afsmterm", about = "Dependency pair framework for proving termination of AFSMs")]
struct Config {
    /// Input files to analyze.
    files: Vec<String>,

    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    #[arg(short = 'i', long = "firstorder")]
    firstorder: Option<String>,

    #[arg(short = 'n', long = "firstordernon")]
    firstordernon: Option<String>,

    #[arg(short = 'd', long = "disable", default_value = "")]
    disable: String,

    #[arg(short = 'q', long = "query")]
    query: Option<String>,

    #[arg(short = 'r', long = "rewrite", default_value_t = false)]
    rewrite: bool,

    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    #[arg(long = "style", default_value = "plain")]
    style: String,

    #[arg(long = "verbose", default_value_t = false)]
    verbose: bool,

    #[arg(long = "silent", default_value_t = false)]
    silent: bool,

    #[arg(long = "debug", default_value_t = false)]
    debug: bool,

    #[arg(short = 'l', long = "formal", default_value_t = false)]
    formal: bool,
}

fn init_logging(cfg: &Config) {
    let level = if cfg.debug {
        log::LevelFilter::Debug
    } else if cfg.verbose {
        log::LevelFilter::Info
    } else if cfg.silent {
        log::LevelFilter::Off
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn mode_of(cfg: &Config) -> Mode {
    if let Some(q) = &cfg.query {
        Mode::Query(q.clone())
    } else if cfg.rewrite {
        Mode::Rewrite
    } else {
        Mode::Prove
    }
}

fn load_file(path: &str, format_flag: Option<&str>) -> Result<ParsedSystem, ParseError> {
    let format = format_flag
        .and_then(Format::from_flag)
        .or_else(|| Format::detect(path))
        .unwrap_or(Format::Afsm);
    let text = fs::read_to_string(path).map_err(|e| ParseError::new("io", 0, 0, format!("{path}: {e}")))?;
    parser::parse(format, &text)
}

/// Handles `--query=<name>`: a handful of structural yes/no questions
/// over the parsed system (spec §6; carried from the original's query
/// mode per SPEC_FULL.md E.6).
fn answer_query(name: &str, system: &ParsedSystem) -> String {
    match name {
        "leftlinear" => {
            let props = afsmterm::analysis::properties::RuleProperties::analyze(&system.rules);
            props.left_linear.to_string()
        }
        "fullyextended" => {
            let props = afsmterm::analysis::properties::RuleProperties::analyze(&system.rules);
            props.fully_extended.to_string()
        }
        "arity" => system
            .signature
            .symbols()
            .map(|s| format!("{s}:{}", system.signature.arity_of(s)))
            .collect::<Vec<_>>()
            .join(", "),
        "rulecount" => system.rules.len().to_string(),
        other => format!("unknown query '{other}'"),
    }
}

/// A single outermost rewrite step over `term`, trying each rule's
/// left-hand side against the whole term (no congruence descent — this
/// is a REPL convenience, not a normalizer).
fn rewrite_step(term: &afsmterm::term::Term, rules: &afsmterm::rule::Ruleset) -> Option<afsmterm::term::Term> {
    for rule in rules {
        if let Some(subst) = match_pattern(&rule.left, term) {
            if let Ok(result) = rule.right.instantiate(&subst) {
                return Some(result);
            }
        }
    }
    None
}

/// Matches a rule's (meta-variable) left-hand side against a closed
/// term, collecting a [`afsmterm::term::subst::MetaSubstitution`].
fn match_pattern(pattern: &afsmterm::term::Term, target: &afsmterm::term::Term) -> Option<afsmterm::term::subst::MetaSubstitution> {
    let mut subst = afsmterm::term::subst::MetaSubstitution::new();
    if match_into(pattern, target, &mut subst) {
        Some(subst)
    } else {
        None
    }
}

fn match_into(pattern: &afsmterm::term::Term, target: &afsmterm::term::Term, subst: &mut afsmterm::term::subst::MetaSubstitution) -> bool {
    use afsmterm::term::Term;
    match pattern {
        Term::MetaApp { meta, args } if args.is_empty() => {
            subst.bindings.insert(meta.index, (vec![], target.clone()));
            true
        }
        Term::Const { name: pn, .. } => matches!(target, Term::Const { name: tn, .. } if tn == pn),
        Term::Apply(pf, pa) => match target {
            Term::Apply(tf, ta) => match_into(pf, tf, subst) && match_into(pa, ta, subst),
            _ => false,
        },
        _ => pattern == target,
    }
}

fn run_rewrite_repl(system: &ParsedSystem) -> Result<()> {
    println!("rewrite REPL: type a term per line (spec §6 `--rewrite`); Ctrl-D to quit");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        line.clear();
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        match parse_repl_term(text, system) {
            Ok(mut term) => {
                let mut steps = 0;
                while let Some(next) = rewrite_step(&term, &system.rules) {
                    term = next;
                    steps += 1;
                    if steps > 10_000 {
                        println!("(stopped after 10000 steps, possibly non-terminating)");
                        break;
                    }
                }
                println!("{steps} step(s) -> {term:?}");
            }
            Err(e) => println!("parse error: {e}"),
        }
    }
    Ok(())
}

fn parse_repl_term(text: &str, system: &ParsedSystem) -> Result<afsmterm::term::Term, ParseError> {
    parser::afsm::parse_term(text, &system.signature)
}

fn main() -> Result<()> {
    let cfg = Config::parse();
    init_logging(&cfg);

    let style = Style::parse(&cfg.style).unwrap_or(Style::Plain);
    let policy = Policy::from_disable_csv(&cfg.disable);
    let mode = mode_of(&cfg);

    let fo_prover: Box<dyn FirstOrderProver> = match cfg.firstorder.as_deref().or(cfg.firstordernon.as_deref()) {
        Some(binary) => Box::new(ExternalFirstOrderProver::new(binary)),
        None => Box::new(NoFirstOrderProver),
    };

    if cfg.files.is_empty() {
        anyhow::bail!("no input files given");
    }

    let mut out: Box<dyn Write> = match &cfg.output {
        Some(path) => Box::new(fs::File::create(path).with_context(|| format!("opening output file {path}"))?),
        None => Box::new(io::stdout()),
    };

    let mut total_yes = 0usize;
    let mut total_no = 0usize;
    let mut total_maybe = 0usize;
    let mut any_parse_error = false;

    for path in &cfg.files {
        let system = match load_file(path, cfg.format.as_deref()) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{path}: {e}");
                writeln!(out, "ERROR ({path}): {e}")?;
                any_parse_error = true;
                continue;
            }
        };

        match &mode {
            Mode::Query(name) => {
                writeln!(out, "{path}: {}", answer_query(name, &system))?;
            }
            Mode::Rewrite => {
                run_rewrite_repl(&system)?;
            }
            Mode::Prove => {
                let mut sig = system.signature.clone();
                let engine = PolynomialInterpretation::new();
                let result = prove_termination(&system.rules, &mut sig, &policy, &engine, fo_prover.as_ref(), Duration::from_secs(60));
                match result.answer {
                    Answer::Yes => total_yes += 1,
                    Answer::No => total_no += 1,
                    Answer::Maybe => total_maybe += 1,
                }
                if cfg.files.len() > 1 {
                    writeln!(out, "=== {path} ===")?;
                }
                let mut sink = ProofSink::new(&mut out, style, cfg.formal);
                sink.write_result(&result)?;
            }
        }
    }

    if cfg.files.len() > 1 && mode == Mode::Prove {
        writeln!(out, "--- totals: {total_yes} yes, {total_no} no, {total_maybe} maybe ---")?;
    }

    if any_parse_error {
        std::process::exit(1);
    }
    Ok(())
}
