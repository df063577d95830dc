//! ARI reader (spec §6 "ARI"): the S-expression based format used by
//! the termination-competition's newer format family —
//! `(format ...)`, `(sort ...)`, `(fun name type)`, `(rule lhs rhs)`,
//! with `(-> arg1 arg2 ... out)` type trees.

use crate::error::ParseError;
use crate::parser::ParsedSystem;
use crate::rule::MatchRule;
use crate::signature::Alphabet;
use crate::term::{MetaVar, Term, Type};
use std::collections::HashMap;

const FORMAT: &str = "ari";

#[derive(Debug, Clone)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn tokenize(text: &str) -> Vec<String> {
    let mut toks = Vec::new();
    let mut cur = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
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

fn parse_sexp(toks: &[String], pos: &mut usize) -> Result<Sexp, ParseError> {
    match toks.get(*pos).map(|s| s.as_str()) {
        Some("(") => {
            *pos += 1;
            let mut items = Vec::new();
            while toks.get(*pos).map(|s| s.as_str()) != Some(")") {
                if *pos >= toks.len() {
                    return Err(ParseError::new(FORMAT, 0, 0, "unterminated s-expression"));
                }
                items.push(parse_sexp(toks, pos)?);
            }
            *pos += 1;
            Ok(Sexp::List(items))
        }
        Some(")") => Err(ParseError::new(FORMAT, 0, 0, "unexpected ')'")),
        Some(tok) => {
            *pos += 1;
            Ok(Sexp::Atom(tok.to_string()))
        }
        None => Err(ParseError::new(FORMAT, 0, 0, "unexpected end of input")),
    }
}

fn parse_all(text: &str) -> Result<Vec<Sexp>, ParseError> {
    let toks = tokenize(text);
    let mut pos = 0;
    let mut forms = Vec::new();
    while pos < toks.len() {
        forms.push(parse_sexp(&toks, &mut pos)?);
    }
    Ok(forms)
}

/// Reads a `(-> a b ... out)` tree, or a bare atom for a 0-ary sort.
fn parse_type(sexp: &Sexp) -> Result<Type, ParseError> {
    match sexp {
        Sexp::Atom(name) => Ok(Type::base(name.clone())),
        Sexp::List(items) => {
            if items.is_empty() {
                return Err(ParseError::new(FORMAT, 0, 0, "empty type expression"));
            }
            match &items[0] {
                Sexp::Atom(arrow) if arrow == "->" => {
                    let parts: Result<Vec<Type>, ParseError> = items[1..].iter().map(parse_type).collect();
                    let mut parts = parts?;
                    let output = parts.pop().ok_or_else(|| ParseError::new(FORMAT, 0, 0, "'->' needs an output sort"))?;
                    Ok(Type::curry(parts, output))
                }
                _ => Err(ParseError::new(FORMAT, 0, 0, "expected '->' type constructor")),
            }
        }
    }
}

struct RuleBuilder<'a> {
    sig: &'a Alphabet,
    bound: HashMap<String, (u32, Type)>,
    next_meta: u32,
}

impl<'a> RuleBuilder<'a> {
    fn term_of(&mut self, sexp: &Sexp) -> Result<Term, ParseError> {
        match sexp {
            Sexp::Atom(name) => {
                if let Some((idx, ty)) = self.bound.get(name).cloned() {
                    return Ok(Term::meta_app(MetaVar { index: idx, name: name.clone(), ty }, vec![]));
                }
                if let Some(ty) = self.sig.type_of(name) {
                    return Ok(Term::constant(name.clone(), ty.clone()));
                }
                let idx = self.next_meta;
                self.next_meta += 1;
                let ty = Type::base("o");
                self.bound.insert(name.clone(), (idx, ty.clone()));
                Ok(Term::meta_app(MetaVar { index: idx, name: name.clone(), ty }, vec![]))
            }
            Sexp::List(items) => {
                if items.is_empty() {
                    return Err(ParseError::new(FORMAT, 0, 0, "empty application"));
                }
                let head_name = match &items[0] {
                    Sexp::Atom(n) => n.clone(),
                    _ => return Err(ParseError::new(FORMAT, 0, 0, "application head must be an identifier")),
                };
                let args: Result<Vec<Term>, ParseError> = items[1..].iter().map(|s| self.term_of(s)).collect();
                let args = args?;
                if let Some((idx, ty)) = self.bound.get(&head_name).cloned() {
                    return Ok(Term::meta_app(MetaVar { index: idx, name: head_name, ty }, args));
                }
                let ty = self
                    .sig
                    .type_of(&head_name)
                    .cloned()
                    .ok_or_else(|| ParseError::new(FORMAT, 0, 0, format!("undeclared symbol '{head_name}'")))?;
                Ok(Term::apply_spine(Term::constant(head_name, ty), args))
            }
        }
    }
}

/// Parses a sequence of `(format ...)`, `(sort ...)`, `(fun name type)`
/// and `(rule lhs rhs)` top-level forms. Unknown top-level forms are
/// skipped, matching competition tooling's tolerance of metadata forms
/// (`(meta-info ...)`, comments, etc).
pub fn parse(text: &str) -> Result<ParsedSystem, ParseError> {
    let forms = parse_all(text)?;
    let mut sig = Alphabet::new();
    let mut rule_forms = Vec::new();

    for form in &forms {
        let items = match form {
            Sexp::List(items) if !items.is_empty() => items,
            _ => continue,
        };
        let keyword = match &items[0] {
            Sexp::Atom(k) => k.as_str(),
            _ => continue,
        };
        match keyword {
            "sort" => {
                if let Some(Sexp::Atom(name)) = items.get(1) {
                    sig.declare(name.clone(), Type::base(name.clone()));
                }
            }
            "fun" => {
                let name = match items.get(1) {
                    Some(Sexp::Atom(n)) => n.clone(),
                    _ => return Err(ParseError::new(FORMAT, 0, 0, "'fun' needs a name")),
                };
                let ty_sexp = items
                    .get(2)
                    .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "'fun' needs a type"))?;
                let ty = parse_type(ty_sexp)?;
                sig.set_arity(name.clone(), ty.max_arity());
                sig.declare(name, ty);
            }
            "rule" => {
                let lhs = items.get(1).ok_or_else(|| ParseError::new(FORMAT, 0, 0, "'rule' needs a left-hand side"))?;
                let rhs = items.get(2).ok_or_else(|| ParseError::new(FORMAT, 0, 0, "'rule' needs a right-hand side"))?;
                rule_forms.push((lhs.clone(), rhs.clone()));
            }
            _ => {}
        }
    }

    let mut rules = Vec::new();
    for (lhs, rhs) in &rule_forms {
        let mut builder = RuleBuilder { sig: &sig, bound: HashMap::new(), next_meta: 0 };
        let left = builder.term_of(lhs)?;
        let right = builder.term_of(rhs)?;
        let rule = MatchRule::new(left, right)
            .map_err(|e| ParseError::new(FORMAT, 0, 0, format!("invalid rule: {e}")))?;
        rules.push(rule);
    }

    Ok(ParsedSystem { signature: sig, rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_sort_fun_and_rule() {
        let text = "(format trs)\n(sort o)\n(fun f (-> o o))\n(rule (f x) x)\n";
        let parsed = parse(text).expect("should parse");
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.signature.contains("f"));
    }

    #[test]
    fn test_arrow_type_tree() {
        let ty = parse_type(&Sexp::List(vec![
            Sexp::Atom("->".to_string()),
            Sexp::Atom("o".to_string()),
            Sexp::Atom("o".to_string()),
            Sexp::Atom("o".to_string()),
        ]))
        .unwrap();
        assert_eq!(ty.max_arity(), 2);
    }
}
