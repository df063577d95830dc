//! First-order splitter (spec §4.10).
//!
//! Grounded on `original_source/src/firstorder.h`/`.cpp`'s TFO/PHO
//! closure rule; the external prover is an injectable trait per spec
//! §9's note that `determine_termination`'s dead sort-split branch is
//! not authoritative — only the live classify-then-delegate path is
//! ported.

use crate::error::Answer;
use crate::rule::{MatchRule, Ruleset};
use crate::signature::Alphabet;
use crate::term::{MetaVar, Term, Type};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Truly first-order.
    Tfo,
    /// Potentially higher-order.
    Pho,
}

/// Whether a type is "composed": contains an arrow type nested inside
/// an argument position (i.e. not a flat `o1 -> o2 -> ... -> out` of
/// base types).
fn is_composed(ty: &Type) -> bool {
    let (args, output) = ty.uncurry();
    args.iter().any(|a| !matches!(a, Type::Base(_))) || matches!(output, Type::Var(_))
}

/// Classifies every declared symbol into `TFO`/`PHO` by the fixed-point
/// closure rule (spec §4.10).
pub fn classify_symbols(sig: &Alphabet, rules: &Ruleset) -> std::collections::HashMap<String, Classification> {
    let mut class: std::collections::HashMap<String, Classification> =
        sig.symbols().map(|s| (s.to_string(), Classification::Tfo)).collect();

    for name in sig.symbols() {
        if let Some(ty) = sig.type_of(name) {
            if is_composed(ty) {
                class.insert(name.to_string(), Classification::Pho);
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            let Some(head) = rule.left.head_symbol() else { continue };
            if class.get(head) == Some(&Classification::Pho) {
                continue;
            }
            let lhs_composed = rule.left.ty();
            if is_composed(&lhs_composed) {
                class.insert(head.to_string(), Classification::Pho);
                changed = true;
                continue;
            }
            let mut mentioned = HashSet::new();
            mentions_symbols(&rule.right, &mut mentioned);
            if mentioned.iter().any(|s| class.get(s) == Some(&Classification::Pho)) {
                class.insert(head.to_string(), Classification::Pho);
                changed = true;
            }
        }
    }
    class
}

fn mentions_symbols(term: &Term, out: &mut HashSet<String>) {
    match term {
        Term::Var { .. } => {}
        Term::Const { name, .. } => {
            out.insert(name.clone());
        }
        Term::Apply(f, a) => {
            mentions_symbols(f, out);
            mentions_symbols(a, out);
        }
        Term::Abs { body, .. } => mentions_symbols(body, out),
        Term::MetaApp { args, .. } => {
            for a in args {
                mentions_symbols(a, out);
            }
        }
    }
}

fn is_first_order_term(term: &Term, class: &std::collections::HashMap<String, Classification>) -> bool {
    match term {
        Term::Var { ty, .. } => matches!(ty, Type::Base(_)),
        Term::Const { name, ty } => matches!(ty, Type::Base(_) | Type::Arrow(..)) && class.get(name).copied() != Some(Classification::Pho),
        Term::Apply(f, a) => is_first_order_term(f, class) && is_first_order_term(a, class),
        Term::Abs { .. } => false,
        Term::MetaApp { args, .. } => args.is_empty() && term.is_meta_headed(),
    }
}

/// A rule is first-order iff both sides are first-order terms: no
/// meta-applications with arguments, no composed types, all heads in
/// `TFO` (spec §4.10).
pub fn is_first_order_rule(rule: &MatchRule, class: &std::collections::HashMap<String, Classification>) -> bool {
    is_first_order_term(&rule.left, class) && is_first_order_term(&rule.right, class)
}

/// Splits `rules` into its first-order and higher-order parts.
pub fn split(rules: &Ruleset, sig: &Alphabet) -> (Ruleset, Ruleset) {
    let class = classify_symbols(sig, rules);
    let mut fo = Vec::new();
    let mut ho = Vec::new();
    for rule in rules {
        if is_first_order_rule(rule, &class) {
            fo.push(rule.clone());
        } else {
            ho.push(rule.clone());
        }
    }
    (fo, ho)
}

/// An injectable external first-order terminator (spec §6: "delegation
/// to an external first-order prover"). Implementations may shell out to
/// a subprocess; the trait boundary keeps that detail out of this crate.
pub trait FirstOrderProver {
    fn prove(&self, rules: &Ruleset, timeout: Duration) -> Answer;
}

/// A prover that always reports `MAYBE`, used when no real first-order
/// backend is configured.
pub struct NoFirstOrderProver;

impl FirstOrderProver for NoFirstOrderProver {
    fn prove(&self, _rules: &Ruleset, _timeout: Duration) -> Answer {
        Answer::Maybe
    }
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

/// Renders `rules` into the flat `l => r` text an external first-order
/// prover reads from `resources/system.trs` (spec §9's temp-file
/// protocol, grounded on `original_source/dpframework.h` §6 "Persisted
/// state").
fn render_trs(rules: &Ruleset) -> String {
    let mut out = String::new();
    for rule in rules {
        out.push_str(&render_term(&rule.left));
        out.push_str(" => ");
        out.push_str(&render_term(&rule.right));
        out.push('\n');
    }
    out
}

/// A `resources/system.trs`-style temp file, written on construction and
/// removed by its `Drop` impl so it is cleaned up even when the caller
/// returns early via `?` (`original_source/dpframework.h` §6 "Persisted
/// state"; ported as `first_order::TempTrsFile`).
pub struct TempTrsFile {
    path: PathBuf,
}

impl TempTrsFile {
    pub fn write(path: impl Into<PathBuf>, rules: &Ruleset) -> std::io::Result<Self> {
        let path = path.into();
        let mut file = std::fs::File::create(&path)?;
        file.write_all(render_trs(rules).as_bytes())?;
        Ok(TempTrsFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempTrsFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Shells out to an external first-order terminator binary, writing the
/// rules to a [`TempTrsFile`] and polling the child process for
/// `timeout` before killing it and reporting `MAYBE` (spec §6
/// `--firstorder=<path>`; ported from the original `wanda` binary's
/// invocation of an external prover, carried per SPEC_FULL.md E.6's
/// temp-file protocol). The subprocess is expected to print `YES` or
/// `NO` on its first line of stdout; any other output, or a non-zero
/// exit without such a line, is `MAYBE`.
pub struct ExternalFirstOrderProver {
    binary: PathBuf,
    work_dir: PathBuf,
}

impl ExternalFirstOrderProver {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        ExternalFirstOrderProver { binary: binary.into(), work_dir: std::env::temp_dir() }
    }

    fn poll_child(&self, mut child: std::process::Child, timeout: Duration) -> Answer {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_status)) => {
                    let Ok(output) = child.wait_with_output() else { return Answer::Maybe };
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    return match stdout.lines().next().map(str::trim) {
                        Some("YES") => Answer::Yes,
                        Some("NO") => Answer::No,
                        _ => Answer::Maybe,
                    };
                }
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Answer::Maybe;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(_) => return Answer::Maybe,
            }
        }
    }
}

impl FirstOrderProver for ExternalFirstOrderProver {
    fn prove(&self, rules: &Ruleset, timeout: Duration) -> Answer {
        let trs_path = self.work_dir.join("system.trs");
        let Ok(trs) = TempTrsFile::write(&trs_path, rules) else { return Answer::Maybe };
        let Ok(child) = Command::new(&self.binary)
            .arg(trs.path())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
        else {
            return Answer::Maybe;
        };
        self.poll_child(child, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_composed_type_marks_pho() {
        let mut sig = Alphabet::new();
        sig.declare("apply", Type::curry([Type::arrow(o(), o()), o()], o()));
        let class = classify_symbols(&sig, &vec![]);
        assert_eq!(class.get("apply"), Some(&Classification::Pho));
    }

    #[test]
    fn test_first_order_rule_detection() {
        let mut sig = Alphabet::new();
        sig.declare("f", Type::curry([o()], o()));
        sig.declare("g", Type::curry([o()], o()));
        let x = Term::var(0, o());
        let left = Term::apply(Term::constant("f", Type::curry([o()], o())), x.clone());
        let right = Term::apply(Term::constant("g", Type::curry([o()], o())), x);
        let rule = MatchRule::new_unchecked(left, right);
        let class = classify_symbols(&sig, &vec![rule.clone()]);
        assert!(is_first_order_rule(&rule, &class));
    }

    #[test]
    fn test_temp_trs_file_writes_and_cleans_up() {
        let a = Term::constant("a", o());
        let b = Term::constant("b", o());
        let rule = MatchRule::new_unchecked(a, b);
        let path = std::env::temp_dir().join("afsmterm_test_system.trs");
        let path_copy = path.clone();
        {
            let trs = TempTrsFile::write(&path, &vec![rule]).expect("writing temp trs file");
            assert!(path_copy.exists());
            assert_eq!(trs.path(), path_copy.as_path());
            let contents = std::fs::read_to_string(trs.path()).expect("reading temp trs file");
            assert_eq!(contents, "a => b\n");
        }
        assert!(!path_copy.exists());
    }

    #[test]
    fn test_no_first_order_prover_never_invoked_for_external() {
        let prover = ExternalFirstOrderProver::new("/nonexistent/afsmterm-fo-prover-binary");
        let answer = prover.prove(&vec![], Duration::from_millis(100));
        assert_eq!(answer, Answer::Maybe);
    }
}
