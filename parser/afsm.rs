//! AFSM reader (spec §6 "AFSM"): alphabet (`symbol : type`, one per
//! line), a blank line, then rules (`lhs => rhs`), terminated by a
//! blank line or end of input.
//!
//! This is the native surface syntax, so it also hosts the shared
//! recursive-descent term/type grammar the other readers reuse for
//! their own term fragments (`afs.rs`, `atrs.rs`).

use crate::error::ParseError;
use crate::parser::ParsedSystem;
use crate::rule::MatchRule;
use crate::signature::Alphabet;
use crate::term::{MetaVar, Term, Type};
use std::collections::HashMap;

const FORMAT: &str = "afsm";

struct Tokenizer<'a> {
    rest: &'a str,
    line: usize,
    col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Ident(String),
    Colon,
    Arrow,
    FatArrow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Backslash,
    Dot,
    Eof,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Tokenizer { rest: input, line: 1, col: 1 }
    }

    fn advance(&mut self, n: usize) {
        for c in self.rest[..n].chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.rest = &self.rest[n..];
    }

    fn skip_inline_space(&mut self) {
        while let Some(c) = self.rest.chars().next() {
            if c == ' ' || c == '\t' {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    /// True if the remaining input (after only inline whitespace) is a
    /// blank-line boundary.
    fn at_blank_line(&self) -> bool {
        self.rest.trim_start_matches([' ', '\t']).starts_with('\n') || self.rest.trim_start_matches([' ', '\t']).is_empty()
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, remainder) = match self.rest.find('\n') {
            Some(i) => (&self.rest[..i], &self.rest[i + 1..]),
            None => (self.rest, ""),
        };
        self.line += 1;
        self.rest = remainder;
        Some(line)
    }

    fn next_tok(&mut self) -> Tok {
        loop {
            self.skip_inline_space();
            match self.rest.chars().next() {
                None => return Tok::Eof,
                Some('\n') => {
                    self.advance(1);
                    self.line += 1;
                    self.col = 1;
                    continue;
                }
                Some(':') => {
                    self.advance(1);
                    return Tok::Colon;
                }
                Some('(') => {
                    self.advance(1);
                    return Tok::LParen;
                }
                Some(')') => {
                    self.advance(1);
                    return Tok::RParen;
                }
                Some('[') => {
                    self.advance(1);
                    return Tok::LBracket;
                }
                Some(']') => {
                    self.advance(1);
                    return Tok::RBracket;
                }
                Some(',') => {
                    self.advance(1);
                    return Tok::Comma;
                }
                Some('\\') => {
                    self.advance(1);
                    return Tok::Backslash;
                }
                Some('.') => {
                    self.advance(1);
                    return Tok::Dot;
                }
                Some('-') if self.rest.starts_with("->") => {
                    self.advance(2);
                    return Tok::Arrow;
                }
                Some('=') if self.rest.starts_with("=>") => {
                    self.advance(2);
                    return Tok::FatArrow;
                }
                Some(c) if c.is_alphanumeric() || c == '_' || c == '#' || c == '\'' => {
                    let mut len = 0;
                    for c in self.rest.chars() {
                        if c.is_alphanumeric() || c == '_' || c == '#' || c == '\'' {
                            len += c.len_utf8();
                        } else {
                            break;
                        }
                    }
                    let word = self.rest[..len].to_string();
                    self.advance(len);
                    return Tok::Ident(word);
                }
                Some(c) => {
                    // A stray single character outside the accepted
                    // identifier/punctuation set; surfaced as an
                    // identifier token so the caller's parser reports a
                    // normal "expected a term"-style error rather than
                    // the tokenizer itself failing.
                    self.advance(c.len_utf8());
                    return Tok::Ident(c.to_string());
                }
            }
        }
    }
}

/// Parses a type: `Base`, `Base -> Base`, or parenthesized, right
/// associative.
fn parse_type_str(s: &str) -> Result<Type, ParseError> {
    let mut tz = Tokenizer::new(s);
    let toks = collect_tokens(&mut tz);
    let mut pos = 0;
    let ty = parse_type_from_slice(&toks, &mut pos)?;
    Ok(ty)
}

fn collect_tokens(tz: &mut Tokenizer) -> Vec<Tok> {
    let mut out = Vec::new();
    loop {
        let t = tz.next_tok();
        if t == Tok::Eof {
            break;
        }
        out.push(t);
    }
    out
}

fn parse_type_from_slice(toks: &[Tok], pos: &mut usize) -> Result<Type, ParseError> {
    let left = parse_type_atom(toks, pos)?;
    if matches!(toks.get(*pos), Some(Tok::Arrow)) {
        *pos += 1;
        let right = parse_type_from_slice(toks, pos)?;
        return Ok(Type::arrow(left, right));
    }
    Ok(left)
}

fn parse_type_atom(toks: &[Tok], pos: &mut usize) -> Result<Type, ParseError> {
    match toks.get(*pos) {
        Some(Tok::Ident(name)) => {
            *pos += 1;
            Ok(Type::base(name.clone()))
        }
        Some(Tok::LParen) => {
            *pos += 1;
            let inner = parse_type_from_slice(toks, pos)?;
            match toks.get(*pos) {
                Some(Tok::RParen) => {
                    *pos += 1;
                    Ok(inner)
                }
                _ => Err(ParseError::new(FORMAT, 0, 0, "expected closing ')' in type")),
            }
        }
        other => Err(ParseError::new(FORMAT, 0, 0, format!("expected a type, found {other:?}"))),
    }
}

/// Parses a term given a pre-declared alphabet (for head classification:
/// declared symbols are constants, capitalized identifiers not in the
/// alphabet are meta-variables, everything else is a bound variable).
struct TermParser<'a> {
    toks: Vec<Tok>,
    pos: usize,
    sig: &'a Alphabet,
    bound: HashMap<String, (u32, Type)>,
    metas: &'a mut HashMap<String, u32>,
    next_meta: &'a mut u32,
    next_var: &'a mut u32,
}

impl<'a> TermParser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.toks.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        if matches!(self.peek(), Some(Tok::Backslash)) {
            self.bump();
            let name = match self.bump() {
                Some(Tok::Ident(n)) => n,
                other => return Err(ParseError::new(FORMAT, 0, 0, format!("expected binder name, found {other:?}"))),
            };
            if !matches!(self.bump(), Some(Tok::Colon)) {
                return Err(ParseError::new(FORMAT, 0, 0, "expected ':' after binder name"));
            }
            let ty_toks = self.collect_until_dot()?;
            let mut p = 0;
            let ty = parse_type_from_slice(&ty_toks, &mut p)?;
            if !matches!(self.bump(), Some(Tok::Dot)) {
                return Err(ParseError::new(FORMAT, 0, 0, "expected '.' after binder type"));
            }
            let idx = *self.next_var;
            *self.next_var += 1;
            self.bound.insert(name, (idx, ty.clone()));
            let body = self.parse_term()?;
            Ok(Term::abs(idx, ty, body))
        } else {
            self.parse_application()
        }
    }

    fn collect_until_dot(&mut self) -> Result<Vec<Tok>, ParseError> {
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(Tok::Dot) | None => break,
                _ => out.push(self.bump().unwrap()),
            }
        }
        Ok(out)
    }

    fn parse_application(&mut self) -> Result<Term, ParseError> {
        let mut term = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Tok::Ident(_)) | Some(Tok::LParen) | Some(Tok::Backslash) => {
                    let arg = self.parse_atom()?;
                    term = Term::apply(term, arg);
                }
                _ => break,
            }
        }
        Ok(term)
    }

    fn parse_atom(&mut self) -> Result<Term, ParseError> {
        match self.bump() {
            Some(Tok::LParen) => {
                let inner = self.parse_term()?;
                if !matches!(self.bump(), Some(Tok::RParen)) {
                    return Err(ParseError::new(FORMAT, 0, 0, "expected closing ')'"));
                }
                Ok(inner)
            }
            Some(Tok::Ident(name)) => {
                if let Some((idx, ty)) = self.bound.get(&name) {
                    return Ok(Term::var(*idx, ty.clone()));
                }
                if self.sig.contains(&name) {
                    let ty = self.sig.type_of(&name).cloned().unwrap();
                    return Ok(Term::constant(name, ty));
                }
                // Meta-variable: `Z` or `Z[arg1,...,argn]`.
                let args = if matches!(self.peek(), Some(Tok::LBracket)) {
                    self.bump();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Some(Tok::RBracket)) {
                        loop {
                            args.push(self.parse_term()?);
                            if matches!(self.peek(), Some(Tok::Comma)) {
                                self.bump();
                            } else {
                                break;
                            }
                        }
                    }
                    if !matches!(self.bump(), Some(Tok::RBracket)) {
                        return Err(ParseError::new(FORMAT, 0, 0, "expected closing ']'"));
                    }
                    args
                } else {
                    Vec::new()
                };
                let idx = *self.metas.entry(name.clone()).or_insert_with(|| {
                    let v = *self.next_meta;
                    *self.next_meta += 1;
                    v
                });
                let arg_tys: Vec<Type> = args.iter().map(|a| a.ty()).collect();
                let meta_ty = Type::curry(arg_tys, Type::base("o"));
                Ok(Term::meta_app(MetaVar { index: idx, name, ty: meta_ty }, args))
            }
            other => Err(ParseError::new(FORMAT, 0, 0, format!("expected a term, found {other:?}"))),
        }
    }
}

/// Parses a single term against an already-declared alphabet, with no
/// surrounding rule/alphabet syntax — used by `--rewrite`'s REPL to read
/// each line the user types (spec §6 "Interactive rewriting REPL").
pub fn parse_term(text: &str, sig: &Alphabet) -> Result<Term, ParseError> {
    let mut metas = HashMap::new();
    let mut next_meta = 0u32;
    let mut next_var = 0u32;
    let mut tz = Tokenizer::new(text.trim());
    let toks = collect_tokens(&mut tz);
    let mut parser =
        TermParser { toks, pos: 0, sig, bound: HashMap::new(), metas: &mut metas, next_meta: &mut next_meta, next_var: &mut next_var };
    parser.parse_term()
}

/// Parses a complete AFSM-format system (spec §6 "AFSM").
pub fn parse(text: &str) -> Result<ParsedSystem, ParseError> {
    let mut sig = Alphabet::new();
    let mut lines = text.lines().enumerate().peekable();

    // Alphabet section: `name : type`, terminated by a blank line.
    while let Some(&(lineno, line)) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
            break;
        }
        lines.next();
        let (name, ty_str) = line
            .split_once(':')
            .ok_or_else(|| ParseError::new(FORMAT, lineno + 1, 0, "expected 'name : type' in alphabet section"))?;
        let ty = parse_type_str(ty_str.trim())?;
        sig.set_arity(name.trim(), ty.max_arity());
        sig.declare(name.trim(), ty);
    }

    let mut rules = Vec::new();
    for (lineno, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (lhs_str, rhs_str) = line
            .split_once("=>")
            .ok_or_else(|| ParseError::new(FORMAT, lineno + 1, 0, "expected 'lhs => rhs' in rules section"))?;
        let mut metas = HashMap::new();
        let mut next_meta = 0u32;
        let mut next_var = 0u32;
        let mut tz = Tokenizer::new(lhs_str.trim());
        let lhs_toks = collect_tokens(&mut tz);
        let mut lhs_parser =
            TermParser { toks: lhs_toks, pos: 0, sig: &sig, bound: HashMap::new(), metas: &mut metas, next_meta: &mut next_meta, next_var: &mut next_var };
        let left = lhs_parser.parse_term()?;
        let lhs_bound = lhs_parser.bound.clone();

        let mut tz = Tokenizer::new(rhs_str.trim());
        let rhs_toks = collect_tokens(&mut tz);
        let mut rhs_parser = TermParser {
            toks: rhs_toks,
            pos: 0,
            sig: &sig,
            bound: lhs_bound,
            metas: &mut metas,
            next_meta: &mut next_meta,
            next_var: &mut next_var,
        };
        let right = rhs_parser.parse_term()?;

        let rule = MatchRule::new(left, right)
            .map_err(|e| ParseError::new(FORMAT, lineno + 1, 0, format!("invalid rule: {e}")))?;
        rules.push(rule);
    }

    Ok(ParsedSystem { signature: sig, rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_simple_system() {
        let text = "f : o -> o\ng : o\n\nf(g) => g\n";
        let parsed = parse(text).expect("should parse");
        assert!(parsed.signature.contains("f"));
        assert!(parsed.signature.contains("g"));
        assert_eq!(parsed.rules.len(), 1);
    }

    #[test]
    fn test_parses_meta_variable_rule() {
        let text = "f : o -> o\n\nf(Z) => Z\n";
        let parsed = parse(text).expect("should parse");
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.rules[0].right.is_meta_headed());
    }

    #[test]
    fn test_rejects_malformed_alphabet_line() {
        let text = "not-a-declaration\n\n";
        assert!(parse(text).is_err());
    }
}
