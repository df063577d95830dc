//! `can_reduce_to` table (spec §4.4 "Reduce-to table"): a transitively
//! closed relation over symbol heads (plus the pseudo-heads `#ABS`,
//! `#VAR`), seeded from each rule's LHS-head -> RHS-head pair.

use crate::rule::Ruleset;
use crate::signature::Head;
use crate::term::Term;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ReduceToTable {
    heads: Vec<Head>,
    edges: HashSet<(usize, usize)>,
}

fn head_of(term: &Term) -> Head {
    match term.spine().0 {
        Term::Const { name, .. } => Head::Symbol(name.clone()),
        Term::Abs { .. } => Head::Abs,
        Term::Var { .. } => Head::Var,
        Term::MetaApp { .. } => Head::Var,
        Term::Apply(..) => unreachable!("spine() always strips applications"),
    }
}

impl ReduceToTable {
    fn index_of(&mut self, head: &Head) -> usize {
        if let Some(i) = self.heads.iter().position(|h| h == head) {
            return i;
        }
        self.heads.push(head.clone());
        self.heads.len() - 1
    }

    /// Builds the table from a rule set's LHS-head -> RHS-head pairs and
    /// transitively closes it.
    pub fn build(rules: &Ruleset) -> Self {
        let mut table = ReduceToTable::default();
        for rule in rules {
            let l = head_of(&rule.left);
            let r = head_of(&rule.right);
            let li = table.index_of(&l);
            let ri = table.index_of(&r);
            table.edges.insert((li, ri));
        }
        let n = table.heads.len();
        for i in 0..n {
            table.edges.insert((i, i));
        }
        // Floyd–Warshall-style transitive closure over a small relation.
        loop {
            let mut added = Vec::new();
            for &(i, j) in &table.edges {
                for &(j2, k) in &table.edges {
                    if j == j2 && !table.edges.contains(&(i, k)) {
                        added.push((i, k));
                    }
                }
            }
            if added.is_empty() {
                break;
            }
            for e in added {
                table.edges.insert(e);
            }
        }
        table
    }

    pub fn can_reduce_to(&self, from: &Head, to: &Head) -> bool {
        let (Some(i), Some(j)) = (self.heads.iter().position(|h| h == from), self.heads.iter().position(|h| h == to))
        else {
            return from == to;
        };
        self.edges.contains(&(i, j))
    }
}

/// Convenience for the common case of asking whether one named symbol's
/// rewrite relation can ever reach another named symbol.
pub fn symbols_can_reduce(table: &ReduceToTable, from: &str, to: &str) -> bool {
    table.can_reduce_to(&Head::Symbol(from.to_string()), &Head::Symbol(to.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::MatchRule;
    use crate::term::Type;

    #[test]
    fn test_direct_and_transitive_reduce_to() {
        let o = Type::base("o");
        let f = Term::constant("f", o.clone());
        let g = Term::constant("g", o.clone());
        let h = Term::constant("h", o.clone());
        let r1 = MatchRule::new_unchecked(f.clone(), g.clone());
        let r2 = MatchRule::new_unchecked(g, h.clone());
        let table = ReduceToTable::build(&vec![r1, r2]);
        assert!(symbols_can_reduce(&table, "f", "h"));
        assert!(!symbols_can_reduce(&table, "h", "f"));
    }
}
