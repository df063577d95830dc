//! First-order TRS reader (spec §6 "First-order TRS"): the competition
//! textual format — `(VAR x y ...)`, `(RULES l1 -> r1 ... ln -> rn)`, and
//! an optional `(STRATEGY INNERMOST)` declaration. Sorts are not given
//! explicitly; every symbol and variable is assigned the same base sort
//! `o`, which is sound whenever the system is orthogonal (spec §6: "sort
//! annotations may be inferred when orthogonal/innermost").

use crate::error::ParseError;
use crate::parser::ParsedSystem;
use crate::rule::MatchRule;
use crate::signature::Alphabet;
use crate::term::{MetaVar, Term, Type};
use std::collections::HashSet;

const FORMAT: &str = "fo_trs";

fn tokenize(text: &str) -> Vec<String> {
    let mut toks = Vec::new();
    let mut cur = String::new();
    for c in text.chars() {
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

/// A `(KEYWORD ...)` block's raw token span, with the keyword itself
/// stripped off.
fn collect_blocks(toks: &[String]) -> Result<Vec<(String, Vec<String>)>, ParseError> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos < toks.len() {
        if toks[pos] != "(" {
            return Err(ParseError::new(FORMAT, 0, 0, format!("expected '(' at top level, found '{}'", toks[pos])));
        }
        pos += 1;
        let keyword = toks
            .get(pos)
            .cloned()
            .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "expected a keyword after '('"))?;
        pos += 1;
        let mut depth = 1;
        let start = pos;
        while depth > 0 {
            match toks.get(pos).map(|s| s.as_str()) {
                Some("(") => depth += 1,
                Some(")") => depth -= 1,
                Some(_) => {}
                None => return Err(ParseError::new(FORMAT, 0, 0, "unterminated block")),
            }
            pos += 1;
        }
        let body = toks[start..pos - 1].to_vec();
        blocks.push((keyword, body));
    }
    Ok(blocks)
}

fn parse_term_tokens(toks: &[String], pos: &mut usize, vars: &HashSet<String>, sig: &mut Alphabet) -> Result<Term, ParseError> {
    let name = toks
        .get(*pos)
        .cloned()
        .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "unexpected end of term"))?;
    *pos += 1;
    let mut args = Vec::new();
    if toks.get(*pos).map(|s| s.as_str()) == Some("(") {
        *pos += 1;
        if toks.get(*pos).map(|s| s.as_str()) != Some(")") {
            loop {
                args.push(parse_term_tokens(toks, pos, vars, sig)?);
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

    if vars.contains(&name) && args.is_empty() {
        let idx = name
            .chars()
            .fold(0u32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32));
        let ty = Type::base("o");
        return Ok(Term::meta_app(MetaVar { index: idx, name, ty }, vec![]));
    }

    if !sig.contains(&name) {
        let ty = Type::curry((0..args.len()).map(|_| Type::base("o")), Type::base("o"));
        sig.set_arity(name.clone(), args.len());
        sig.declare(name.clone(), ty);
    }
    let ty = sig.type_of(&name).cloned().unwrap_or(Type::base("o"));
    Ok(Term::apply_spine(Term::constant(name, ty), args))
}

/// Parses the `(VAR ...)`/`(RULES ...)` block format. `(STRATEGY ...)`
/// and any other block is accepted and ignored (spec §6: strategy
/// annotation affects solver policy elsewhere, not term construction).
pub fn parse(text: &str) -> Result<ParsedSystem, ParseError> {
    let toks = tokenize(text);
    let blocks = collect_blocks(&toks)?;

    let mut vars = HashSet::new();
    for (keyword, body) in &blocks {
        if keyword == "VAR" {
            for tok in body {
                if tok != "(" && tok != ")" {
                    vars.insert(tok.clone());
                }
            }
        }
    }

    let mut sig = Alphabet::new();
    let mut rules = Vec::new();
    for (keyword, body) in &blocks {
        if keyword != "RULES" {
            continue;
        }
        let mut pos = 0;
        while pos < body.len() {
            let left = parse_term_tokens(body, &mut pos, &vars, &mut sig)?;
            if body.get(pos).map(|s| s.as_str()) != Some("->") {
                return Err(ParseError::new(FORMAT, 0, 0, "expected '->' between left- and right-hand side"));
            }
            pos += 1;
            let right = parse_term_tokens(body, &mut pos, &vars, &mut sig)?;
            let rule = MatchRule::new(left, right)
                .map_err(|e| ParseError::new(FORMAT, 0, 0, format!("invalid rule: {e}")))?;
            rules.push(rule);
        }
    }

    Ok(ParsedSystem { signature: sig, rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_var_and_rules_blocks() {
        let text = "(VAR x)\n(RULES f(x) -> x)\n";
        let parsed = parse(text).expect("should parse");
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.signature.contains("f"));
    }

    #[test]
    fn test_ignores_strategy_block() {
        let text = "(VAR x)\n(STRATEGY INNERMOST)\n(RULES f(x) -> x)\n";
        let parsed = parse(text).expect("should parse");
        assert_eq!(parsed.rules.len(), 1);
    }
}
