//! Formative and usable rules restrictions (spec §4.6).

use crate::analysis::properties::RuleProperties;
use crate::dependency_pair::DpSet;
use crate::rule::{MatchRule, Ruleset};
use crate::term::{Term, Type};
use std::collections::HashMap;

const MAX_TYPES_PER_SYMBOL: usize = 20;

/// `symbol -> set-of-required-output-types`, capped at
/// `MAX_TYPES_PER_SYMBOL` per symbol (spec §4.6: "over cap collapses to
/// the topmost type variable").
#[derive(Debug, Clone, Default)]
struct TypeDemand {
    demand: HashMap<String, Vec<Type>>,
}

impl TypeDemand {
    fn record(&mut self, symbol: &str, ty: Type) -> bool {
        let entry = self.demand.entry(symbol.to_string()).or_default();
        if entry.contains(&ty) {
            return false;
        }
        if entry.len() >= MAX_TYPES_PER_SYMBOL {
            let collapsed = Type::Var(0);
            if !entry.contains(&collapsed) {
                entry.clear();
                entry.push(collapsed);
                return true;
            }
            return false;
        }
        entry.push(ty);
        true
    }

    fn contains(&self, symbol: &str, ty: &Type) -> bool {
        self.demand.get(symbol).is_some_and(|types| types.contains(ty) || types.contains(&Type::Var(0)))
    }
}

/// Whether `term`'s spine head/type is already in `demand`.
fn head_type_demanded(term: &Term, demand: &TypeDemand) -> bool {
    let (head, _) = term.spine();
    match head.head_symbol() {
        Some(name) => demand.contains(name, &term.ty()),
        None => false,
    }
}

/// Computes the formative rule set of `(dps, rules)` (spec §4.6),
/// falling back to the full rule set when the precondition (every DP
/// left-linear and fully extended) fails.
pub fn formative_rules(dps: &DpSet, rules: &Ruleset) -> Ruleset {
    let dp_rules: Ruleset = dps.iter().map(|p| MatchRule::new_unchecked(p.left.clone(), p.right.clone())).collect();
    let props = RuleProperties::analyze(&dp_rules);
    if !(props.left_linear && props.fully_extended) {
        return rules.clone();
    }

    let mut demand = TypeDemand::default();
    for p in dps {
        let (head, _) = p.left.spine();
        if let Some(name) = head.head_symbol() {
            demand.record(name, p.left.ty());
        }
    }

    let mut included = vec![false; rules.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for (i, rule) in rules.iter().enumerate() {
            if included[i] {
                continue;
            }
            if head_type_demanded(&rule.right, &demand) {
                let (head, _) = rule.left.spine();
                if let Some(name) = head.head_symbol() {
                    if demand.record(name, rule.left.ty()) {
                        changed = true;
                    }
                }
                included[i] = true;
                changed = true;
            }
        }
    }

    rules.iter().zip(included).filter_map(|(r, keep)| keep.then(|| r.clone())).collect()
}

/// Computes the usable rules for a DP problem (spec §4.6): symbols
/// reachable from any DP's right-hand side via the rewrite relation.
/// Collapsing DPs disable the restriction (fall back to all rules), as
/// do DPs whose right-hand side's head type cannot be pinned down.
pub fn usable_rules(dps: &DpSet, rules: &Ruleset) -> Ruleset {
    if dps.iter().any(|p| p.is_collapsing()) {
        return rules.clone();
    }
    let mut reachable: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut frontier: Vec<String> = dps.iter().filter_map(|p| p.right_head().map(|s| s.to_string())).collect();
    while let Some(symbol) = frontier.pop() {
        if !reachable.insert(symbol.clone()) {
            continue;
        }
        for rule in rules {
            if rule.left.head_symbol() == Some(symbol.as_str()) {
                collect_heads(&rule.right, &mut frontier, &reachable);
            }
        }
    }
    rules.iter().filter(|r| r.left.head_symbol().is_some_and(|h| reachable.contains(h))).cloned().collect()
}

fn collect_heads(term: &Term, frontier: &mut Vec<String>, seen: &std::collections::HashSet<String>) {
    let (head, args) = term.spine();
    if let Some(name) = head.head_symbol() {
        if !seen.contains(name) {
            frontier.push(name.to_string());
        }
    }
    for a in args {
        collect_heads(a, frontier, seen);
    }
}
