//! Non-eating position table (spec §4.4 "Non-eating table").
//!
//! `non_eating_pos[f][k]` starts `true` for every argument position of
//! every defined symbol `f` and is iteratively falsified whenever a rule
//! shows argument `k` can be discarded by some reduction.

use crate::rule::Ruleset;
use crate::signature::Alphabet;
use crate::term::Term;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct NonEatingTable {
    /// `table[symbol][k]` true iff position `k` is known non-eating.
    table: HashMap<String, Vec<bool>>,
}

impl NonEatingTable {
    pub fn is_non_eating(&self, symbol: &str, pos: usize) -> bool {
        self.table.get(symbol).and_then(|v| v.get(pos)).copied().unwrap_or(true)
    }

    fn set_eating(&mut self, symbol: &str, pos: usize) -> bool {
        if let Some(v) = self.table.get_mut(symbol) {
            if pos < v.len() && v[pos] {
                v[pos] = false;
                return true;
            }
        }
        false
    }

    /// Computes the table's fixed point for the given rule set and
    /// alphabet (arities drive the initial `true` vector lengths).
    pub fn compute(rules: &Ruleset, sig: &Alphabet) -> Self {
        let mut table = NonEatingTable::default();
        for name in sig.symbols() {
            let arity = sig.arity_of(name).max(sig.type_of(name).map(|t| t.max_arity()).unwrap_or(0));
            table.table.insert(name.to_string(), vec![true; arity]);
        }

        let max_iters = sig.symbols().count().max(1) * rules.len().max(1);
        for _ in 0..max_iters {
            let mut changed = false;
            for rule in rules {
                let Some(head) = rule.left.head_symbol() else { continue };
                let (_, args) = rule.left.spine();
                for (k, arg) in args.iter().enumerate() {
                    if let Term::MetaApp { meta, .. } = arg {
                        if meta_survives_non_eating(&rule.right, meta.index, &table) {
                            // Occurs at a currently non-eating position in
                            // the RHS: k stays safe this round.
                        } else if meta_occurs(&rule.right, meta.index) {
                            if table.set_eating(head, k) {
                                changed = true;
                            }
                        }
                    } else if table.set_eating(head, k) {
                        // Non-meta-variable argument positions are always
                        // "eaten" by structural decomposition of the head.
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        table
    }
}

fn meta_occurs(term: &Term, idx: u32) -> bool {
    term.free_meta_vars().contains(&idx)
}

/// Whether every occurrence of meta-variable `idx` in `term` sits at a
/// position all of whose ancestor argument slots are currently believed
/// non-eating (an approximation: descending through an abstraction body
/// or a meta-application's own arguments is always considered safe,
/// since those are not argument positions of a named symbol).
fn meta_survives_non_eating(term: &Term, idx: u32, table: &NonEatingTable) -> bool {
    match term {
        Term::Var { .. } | Term::Const { .. } => false,
        Term::MetaApp { meta, args } => {
            if meta.index == idx && args.is_empty() {
                return true;
            }
            args.iter().all(|a| !meta_occurs(a, idx) || meta_survives_non_eating(a, idx, table))
        }
        Term::Abs { body, .. } => meta_survives_non_eating(body, idx, table),
        Term::Apply(..) => {
            let (head, args) = term.spine();
            let head_name = head.head_symbol();
            args.iter().enumerate().all(|(k, a)| {
                if !meta_occurs(a, idx) {
                    return true;
                }
                let at_non_eating = match head_name {
                    Some(name) => table.is_non_eating(name, k),
                    None => true,
                };
                at_non_eating && meta_survives_non_eating(a, idx, table)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{MetaVar, Type};

    #[test]
    fn test_discarded_argument_marked_eating() {
        let o = Type::base("o");
        let mut sig = Alphabet::new();
        sig.declare("f", Type::curry([o.clone(), o.clone()], o.clone()));
        sig.set_arity("f", 2);
        let z = MetaVar { index: 0, name: "Z".into(), ty: o.clone() };
        let left = Term::apply_spine(
            Term::constant("f", Type::curry([o.clone(), o.clone()], o.clone())),
            [Term::meta_app(z.clone(), vec![]), Term::constant("c", o.clone())],
        );
        // f(Z, c) -> Z: argument 1 (c) is discarded entirely.
        let right = Term::meta_app(z, vec![]);
        let rule = crate::rule::MatchRule::new_unchecked(left, right);
        let table = NonEatingTable::compute(&vec![rule], &sig);
        assert!(!table.is_non_eating("f", 1));
    }
}
