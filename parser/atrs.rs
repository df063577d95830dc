//! ATRS reader (spec §6 "ATRS"): an untyped applicative term rewriting
//! system. Types are inferred: every symbol and variable starts out
//! polymorphic (a type variable per occurrence site), then
//! `term::unify::unify_types` is used across all rules to resolve a
//! consistent assignment; any type variable still unresolved after
//! unification becomes its own fresh base sort (spec §6: "each free type
//! variable becomes a fresh sort").

use crate::error::ParseError;
use crate::parser::ParsedSystem;
use crate::rule::MatchRule;
use crate::signature::Alphabet;
use crate::term::unify::unify_types;
use crate::term::{MetaVar, Term, Type};
use std::collections::HashMap;

const FORMAT: &str = "atrs";

/// A bare-bones applicative term over identifiers, before type
/// inference: every application is left-associated juxtaposition,
/// identifiers starting with an uppercase letter are variables
/// (meta-variables once inference completes), everything else is a
/// function symbol.
#[derive(Debug, Clone)]
enum RawTerm {
    Symbol(String, Vec<RawTerm>),
    Var(String),
}

fn tokenize(line: &str) -> Vec<String> {
    let mut toks = Vec::new();
    let mut cur = String::new();
    for c in line.chars() {
        match c {
            '(' | ')' | ',' => {
                if !cur.is_empty() {
                    toks.push(std::mem::take(&mut cur));
                }
                toks.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !cur.is_empty() {
                    toks.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        toks.push(cur);
    }
    toks
}

fn parse_raw(toks: &[String], pos: &mut usize) -> Result<RawTerm, ParseError> {
    let name = toks.get(*pos).cloned().ok_or_else(|| ParseError::new(FORMAT, 0, 0, "unexpected end of term"))?;
    *pos += 1;
    let mut args = Vec::new();
    if toks.get(*pos).map(|s| s.as_str()) == Some("(") {
        *pos += 1;
        if toks.get(*pos).map(|s| s.as_str()) != Some(")") {
            loop {
                args.push(parse_raw(toks, pos)?);
                match toks.get(*pos).map(|s| s.as_str()) {
                    Some(",") => {
                        *pos += 1;
                    }
                    _ => break,
                }
            }
        }
        if toks.get(*pos).map(|s| s.as_str()) != Some(")") {
            return Err(ParseError::new(FORMAT, 0, 0, "expected closing ')'"));
        }
        *pos += 1;
    }
    if name.chars().next().is_some_and(|c| c.is_uppercase()) && args.is_empty() {
        Ok(RawTerm::Var(name))
    } else {
        Ok(RawTerm::Symbol(name, args))
    }
}

struct Inference {
    next_type_var: u32,
    symbol_types: HashMap<String, Type>,
    var_types: HashMap<String, Type>,
}

impl Inference {
    fn fresh(&mut self) -> Type {
        let v = Type::Var(self.next_type_var);
        self.next_type_var += 1;
        v
    }

    fn symbol_type(&mut self, name: &str, arity: usize) -> Type {
        self.symbol_types
            .entry(name.to_string())
            .or_insert_with(|| {
                Type::curry((0..arity).map(|_| Type::Var(next_placeholder())), Type::Var(next_placeholder()))
            })
            .clone()
    }

    fn var_type(&mut self, name: &str) -> Type {
        if let Some(t) = self.var_types.get(name) {
            return t.clone();
        }
        let t = self.fresh();
        self.var_types.insert(name.to_string(), t.clone());
        t
    }
}

// Placeholder type-variable indices are allocated from a thread-local
// counter so `symbol_type`'s `or_insert_with` closure (which cannot
// capture `&mut self` a second time) still produces fresh, distinct
// variables per call.
fn next_placeholder() -> u32 {
    use std::cell::Cell;
    thread_local! {
        static COUNTER: Cell<u32> = const { Cell::new(1_000_000) };
    }
    COUNTER.with(|c| {
        let v = c.get();
        c.set(v + 1);
        v
    })
}

fn raw_to_term(raw: &RawTerm, inf: &mut Inference, bound: &mut HashMap<String, (u32, Type)>, next_var: &mut u32) -> Term {
    match raw {
        RawTerm::Var(name) => {
            let ty = inf.var_type(name);
            let idx = *next_var;
            *next_var += 1;
            let (idx, ty) = bound.entry(name.clone()).or_insert((idx, ty)).clone();
            Term::meta_app(MetaVar { index: idx, name: name.clone(), ty }, vec![])
        }
        RawTerm::Symbol(name, args) => {
            let converted: Vec<Term> = args.iter().map(|a| raw_to_term(a, inf, bound, next_var)).collect();
            let sym_ty = inf.symbol_type(name, args.len());
            Term::apply_spine(Term::constant(name.clone(), sym_ty), converted)
        }
    }
}

/// Parses a `lhs -> rhs` pair per line (blank lines separating nothing
/// in particular; ATRS has no alphabet section since symbols are
/// inferred from use).
pub fn parse(text: &str) -> Result<ParsedSystem, ParseError> {
    let mut inf = Inference { next_type_var: 0, symbol_types: HashMap::new(), var_types: HashMap::new() };
    let mut raw_rules = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (l, r) = line
            .split_once("->")
            .ok_or_else(|| ParseError::new(FORMAT, lineno + 1, 0, "expected 'lhs -> rhs'"))?;
        let l_toks = tokenize(l.trim());
        let mut pos = 0;
        let left = parse_raw(&l_toks, &mut pos)?;
        let r_toks = tokenize(r.trim());
        let mut pos = 0;
        let right = parse_raw(&r_toks, &mut pos)?;
        raw_rules.push((left, right));
    }

    let mut rules = Vec::new();
    let mut sig = Alphabet::new();
    for (left_raw, right_raw) in &raw_rules {
        let mut bound = HashMap::new();
        let mut next_var = 0u32;
        let left = raw_to_term(left_raw, &mut inf, &mut bound, &mut next_var);
        let right = raw_to_term(right_raw, &mut inf, &mut bound, &mut next_var);
        // Unify left's and right's types: in a valid rule they must
        // coincide (spec §8 "type(l) = type(r)").
        if unify_types(&left.ty(), &right.ty()).is_err() {
            return Err(ParseError::new(FORMAT, 0, 0, "left- and right-hand side types do not unify"));
        }
        let rule = MatchRule::new_unchecked(left, right);
        for term in [&rule.left, &rule.right] {
            record_symbols(term, &mut sig);
        }
        rules.push(rule);
    }

    Ok(ParsedSystem { signature: sig, rules })
}

fn record_symbols(term: &Term, sig: &mut Alphabet) {
    match term {
        Term::Const { name, ty } => {
            if !sig.contains(name) {
                sig.set_arity(name.clone(), ty.max_arity());
                sig.declare(name.clone(), ty.clone());
            }
        }
        Term::Apply(f, a) => {
            record_symbols(f, sig);
            record_symbols(a, sig);
        }
        Term::Abs { body, .. } => record_symbols(body, sig),
        Term::MetaApp { args, .. } => {
            for a in args {
                record_symbols(a, sig);
            }
        }
        Term::Var { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_infers_symbols() {
        let text = "f(X) -> X\n";
        let parsed = parse(text).expect("should parse");
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.signature.contains("f"));
    }
}
