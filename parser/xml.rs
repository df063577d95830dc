//! XML reader (spec §6 "XML"): the termination-competition schema
//! (`<problem><trs><rules>...<signature>...`). Built as a generic event
//! tree over `quick_xml::Reader` first, then interpreted the way
//! `ari.rs` interprets its S-expression tree — the two readers share the
//! same "parse into a generic nested form, then walk it" shape.

use crate::error::ParseError;
use crate::parser::ParsedSystem;
use crate::rule::MatchRule;
use crate::signature::Alphabet;
use crate::term::{MetaVar, Term, Type};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashMap;

const FORMAT: &str = "xml";

#[derive(Debug, Clone)]
enum Node {
    Element(String, Vec<Node>),
    Text(String),
}

impl Node {
    fn name(&self) -> Option<&str> {
        match self {
            Node::Element(n, _) => Some(n.as_str()),
            Node::Text(_) => None,
        }
    }

    fn children(&self) -> &[Node] {
        match self {
            Node::Element(_, c) => c,
            Node::Text(_) => &[],
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.name() == Some(name))
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children().iter().filter(move |c| c.name() == Some(name))
    }

    fn text(&self) -> String {
        self.children()
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string()
    }
}

fn parse_tree(text: &str) -> Result<Node, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<(String, Vec<Node>)> = vec![("#root".to_string(), Vec::new())];
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                stack.push((name, Vec::new()));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let node = Node::Element(name, Vec::new());
                stack.last_mut().unwrap().1.push(node);
            }
            Ok(Event::End(_)) => {
                if stack.len() == 1 {
                    return Err(ParseError::new(FORMAT, 0, 0, "unmatched closing tag"));
                }
                let (name, children) = stack.pop().unwrap();
                stack.last_mut().unwrap().1.push(Node::Element(name, children));
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| ParseError::new(FORMAT, 0, 0, e.to_string()))?.to_string();
                if !text.trim().is_empty() {
                    stack.last_mut().unwrap().1.push(Node::Text(text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ParseError::new(FORMAT, 0, 0, format!("xml error: {e}"))),
        }
    }
    let (_, roots) = stack.pop().unwrap();
    roots
        .into_iter()
        .find(|n| matches!(n, Node::Element(..)))
        .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "no root element"))
}

/// Reads a `<type>` tree: `<type><type>o</type><arrow/><type>o</type></type>`
/// style nesting for higher-order signatures, or a bare `<basic>name</basic>`
/// / text sort name for first-order ones.
fn parse_type_node(node: &Node) -> Result<Type, ParseError> {
    match node.name() {
        Some("type") => {
            let parts: Vec<&Node> = node.children_named("type").collect();
            if parts.len() >= 2 {
                let mut tys = Vec::new();
                for p in &parts {
                    tys.push(parse_type_node(p)?);
                }
                let output = tys.pop().unwrap();
                return Ok(Type::curry(tys, output));
            }
            let text = node.text();
            if text.is_empty() {
                Err(ParseError::new(FORMAT, 0, 0, "empty <type> element"))
            } else {
                Ok(Type::base(text))
            }
        }
        Some("basic") | Some("sort") => Ok(Type::base(node.text())),
        _ => Ok(Type::base(node.text())),
    }
}

struct TermBuilder<'a> {
    sig: &'a Alphabet,
    bound: HashMap<String, (u32, Type)>,
    next_meta: u32,
}

impl<'a> TermBuilder<'a> {
    fn build(&mut self, node: &Node) -> Result<Term, ParseError> {
        match node.name() {
            Some("var") => {
                let name = node.text();
                let ty = self.bound.get(&name).map(|(_, t)| t.clone()).unwrap_or_else(|| Type::base("o"));
                let idx = self.bound.get(&name).map(|(i, _)| *i).unwrap_or_else(|| {
                    let idx = self.next_meta;
                    self.next_meta += 1;
                    idx
                });
                self.bound.insert(name.clone(), (idx, ty.clone()));
                Ok(Term::meta_app(MetaVar { index: idx, name, ty }, vec![]))
            }
            Some("funapp") => {
                let name = node.child("name").map(|n| n.text()).ok_or_else(|| ParseError::new(FORMAT, 0, 0, "<funapp> missing <name>"))?;
                let args: Result<Vec<Term>, ParseError> = node.children_named("arg").map(|a| self.build_single_child(a)).collect();
                let args = args?;
                let ty = self
                    .sig
                    .type_of(&name)
                    .cloned()
                    .ok_or_else(|| ParseError::new(FORMAT, 0, 0, format!("undeclared symbol '{name}'")))?;
                Ok(Term::apply_spine(Term::constant(name, ty), args))
            }
            other => Err(ParseError::new(FORMAT, 0, 0, format!("unsupported term element: {other:?}"))),
        }
    }

    fn build_single_child(&mut self, wrapper: &Node) -> Result<Term, ParseError> {
        let inner = wrapper
            .children()
            .iter()
            .find(|c| matches!(c, Node::Element(..)))
            .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "<arg> has no term child"))?;
        self.build(inner)
    }
}

/// Parses a `<problem><trs>` document: `<signature>` declares symbols
/// (via `<funcsym><name>/<arity>` for first-order arity-only entries,
/// or `<type>` trees for higher-order ones), `<rules><rule><lhs>/<rhs>`
/// gives the rewrite rules.
pub fn parse(text: &str) -> Result<ParsedSystem, ParseError> {
    let root = parse_tree(text)?;
    let trs = find_descendant(&root, "trs").unwrap_or(&root);

    let mut sig = Alphabet::new();
    if let Some(signature) = find_descendant(trs, "signature").or_else(|| find_descendant(trs, "higherOrderSignature")) {
        for funcsym in signature.children_named("funcsym") {
            let name = funcsym.child("name").map(|n| n.text()).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let ty = if let Some(type_node) = funcsym.child("typeDeclaration").and_then(|t| t.child("type")) {
                parse_type_node(type_node)?
            } else if let Some(arity_node) = funcsym.child("arity") {
                let arity: usize = arity_node.text().parse().unwrap_or(0);
                Type::curry((0..arity).map(|_| Type::base("o")), Type::base("o"))
            } else {
                Type::base("o")
            };
            sig.set_arity(name.clone(), ty.max_arity());
            sig.declare(name, ty);
        }
    }

    let mut rules = Vec::new();
    if let Some(rules_node) = find_descendant(trs, "rules") {
        for rule_node in rules_node.children_named("rule") {
            let lhs_node = rule_node.child("lhs").ok_or_else(|| ParseError::new(FORMAT, 0, 0, "<rule> missing <lhs>"))?;
            let rhs_node = rule_node.child("rhs").ok_or_else(|| ParseError::new(FORMAT, 0, 0, "<rule> missing <rhs>"))?;
            let lhs_term = lhs_node
                .children()
                .iter()
                .find(|c| matches!(c, Node::Element(..)))
                .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "<lhs> has no term"))?;
            let rhs_term = rhs_node
                .children()
                .iter()
                .find(|c| matches!(c, Node::Element(..)))
                .ok_or_else(|| ParseError::new(FORMAT, 0, 0, "<rhs> has no term"))?;

            let mut builder = TermBuilder { sig: &sig, bound: HashMap::new(), next_meta: 0 };
            let left = builder.build(lhs_term)?;
            let right = builder.build(rhs_term)?;
            let rule = MatchRule::new(left, right)
                .map_err(|e| ParseError::new(FORMAT, 0, 0, format!("invalid rule: {e}")))?;
            rules.push(rule);
        }
    }

    Ok(ParsedSystem { signature: sig, rules })
}

fn find_descendant<'a>(node: &'a Node, name: &str) -> Option<&'a Node> {
    if node.name() == Some(name) {
        return Some(node);
    }
    for child in node.children() {
        if let Some(found) = find_descendant(child, name) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_simple_xml_trs() {
        let text = r#"
        <problem>
          <trs>
            <signature>
              <funcsym><name>f</name><arity>1</arity></funcsym>
            </signature>
            <rules>
              <rule>
                <lhs><funapp><name>f</name><arg><var>x</var></arg></funapp></lhs>
                <rhs><var>x</var></rhs>
              </rule>
            </rules>
          </trs>
        </problem>
        "#;
        let parsed = parse(text).expect("should parse");
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.signature.contains("f"));
    }
}
