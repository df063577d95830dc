//! Format-converter binary (spec §6; the `--convert` functionality of
//! the original `wanda` binary, split into its own `[[bin]]` target per
//! SPEC_FULL.md E.1). Reads any supported input format and writes the
//! parsed system back out in AFSM's native surface syntax, the one
//! format every reader in `parser/` can also read back in.

use afsmterm::parser::{self, Format, ParsedSystem};
use afsmterm::term::{MetaVar, Term, Type};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::io::Write;

#[derive(Parser, Debug)]
#[command(name = "afsmterm-convert", about = "Converts a rewriting system between surface formats")]
struct Args {
    input: String,

    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    #[arg(short = 'o', long = "output")]
    output: Option<String>,
}

fn render_type(ty: &Type) -> String {
    match ty {
        Type::Base(name) => name.clone(),
        Type::Arrow(domain, codomain) => format!("{} -> {}", render_type(domain), render_type(codomain)),
        Type::Var(index) => format!("?{index}"),
    }
}

fn render_term(term: &Term) -> String {
    match term {
        Term::Var { index, .. } => format!("x{index}"),
        Term::Const { name, .. } => name.clone(),
        Term::Apply(func, arg) => format!("{}({})", render_term(func), render_term(arg)),
        Term::Abs { var, var_ty, body } => format!("\\x{var}:{}.{}", render_type(var_ty), render_term(body)),
        Term::MetaApp { meta, args } => render_meta(meta, args),
    }
}

fn render_meta(meta: &MetaVar, args: &[Term]) -> String {
    if args.is_empty() {
        meta.name.clone()
    } else {
        let rendered: Vec<String> = args.iter().map(render_term).collect();
        format!("{}[{}]", meta.name, rendered.join(","))
    }
}

fn render_afsm(system: &ParsedSystem) -> String {
    let mut out = String::new();
    for name in system.signature.symbols() {
        let ty = system.signature.type_of(name).expect("declared symbol has a type");
        out.push_str(&format!("{name} : {}\n", render_type(ty)));
    }
    out.push('\n');
    for rule in &system.rules {
        out.push_str(&format!("{} => {}\n", render_term(&rule.left), render_term(&rule.right)));
    }
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let format = args
        .format
        .as_deref()
        .and_then(Format::from_flag)
        .or_else(|| Format::detect(&args.input))
        .with_context(|| format!("could not determine input format for '{}'; pass --format", args.input))?;

    let text = fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input))?;
    let system = parser::parse(format, &text).map_err(|e| anyhow::anyhow!("{e}"))?;

    if format == Format::Afsm {
        bail!("input is already in AFSM format; nothing to convert");
    }

    let rendered = render_afsm(&system);
    match args.output {
        Some(path) => fs::File::create(&path)
            .with_context(|| format!("creating {path}"))?
            .write_all(rendered.as_bytes())
            .with_context(|| format!("writing {path}"))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
