//! Plain-function-passing (PFP) and sort-ordering accessibility (spec
//! §4.2 "PFP / accessibility"). A SAT solver searches for a compatible
//! total preorder on base sorts so that every free meta-variable of a
//! rule's right-hand side is accessible in some argument of the
//! left-hand side.

use crate::rule::Ruleset;
use crate::sat::{Cnf, Literal};
use crate::term::{Term, Type};
use std::collections::{HashMap, HashSet};

/// A total preorder on base sorts, `ge(a, b)` iff `a >= b`, read off a
/// SAT model. Used directly by the static subterm criterion's accessible
/// variant (spec §4.5 "Accessible variant").
#[derive(Debug, Clone, Default)]
pub struct SortOrdering {
    sorts: Vec<String>,
    /// `order[(i, j)]` true iff `sorts[i] >= sorts[j]`.
    order: HashMap<(usize, usize), bool>,
}

impl SortOrdering {
    fn index_of(&self, sort: &str) -> Option<usize> {
        self.sorts.iter().position(|s| s == sort)
    }

    pub fn ge(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.order.get(&(i, j)).copied().unwrap_or(false),
            _ => false,
        }
    }

    pub fn gt(&self, a: &str, b: &str) -> bool {
        self.ge(a, b) && !self.ge(b, a)
    }
}

/// Polarity of an occurrence within a type, used to determine
/// accessibility: positive occurrences require `kappa >= kappa'`,
/// negative occurrences require `kappa > kappa'` (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    fn flip(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Collects, for each base sort reachable in `ty` at each polarity, the
/// pair `(sort, polarity)`.
fn collect_polarities(ty: &Type, polarity: Polarity, out: &mut Vec<(String, Polarity)>) {
    match ty {
        Type::Base(b) => out.push((b.clone(), polarity)),
        Type::Var(_) => {}
        Type::Arrow(dom, cod) => {
            collect_polarities(dom, polarity.flip(), out);
            collect_polarities(cod, polarity, out);
        }
    }
}

/// Attempts to find a sort ordering under which every rule
/// `f(s1,...,sn) -> r` is PFP: every free meta-variable of `r` is
/// accessible at position `i` of `si`'s output sort, i.e. on every path
/// from the root of `si`'s type to the target, positive occurrences obey
/// `kappa >= kappa'` and negative occurrences obey `kappa > kappa'`.
pub fn search_sort_ordering(rules: &Ruleset) -> Option<SortOrdering> {
    let sorts = collect_base_sorts(rules);
    if sorts.is_empty() {
        return Some(SortOrdering { sorts, order: HashMap::new() });
    }
    let n = sorts.len();
    let mut cnf = Cnf::new();
    // ge_vars[(i,j)] true iff sorts[i] >= sorts[j].
    let mut ge_vars: HashMap<(usize, usize), u32> = HashMap::new();
    for i in 0..n {
        for j in 0..n {
            ge_vars.insert((i, j), cnf.fresh_var());
        }
    }
    // Reflexivity.
    for i in 0..n {
        cnf.add_clause(vec![Literal::pos(ge_vars[&(i, i)])]);
    }
    // Transitivity: ge(i,j) & ge(j,k) -> ge(i,k).
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                cnf.add_clause(vec![
                    Literal::neg(ge_vars[&(i, j)]),
                    Literal::neg(ge_vars[&(j, k)]),
                    Literal::pos(ge_vars[&(i, k)]),
                ]);
            }
        }
    }
    // Totality: ge(i,j) or ge(j,i).
    for i in 0..n {
        for j in (i + 1)..n {
            cnf.add_clause(vec![Literal::pos(ge_vars[&(i, j)]), Literal::pos(ge_vars[&(j, i)])]);
        }
    }

    // Per-rule PFP constraints: for every free meta-variable Z of r that
    // occurs in some argument s_i at output sort kappa_i, require that
    // kappa_i accessibility obtains for every occurrence of the target
    // base sort of Z along the path from s_i's root, per polarity.
    for rule in rules {
        let (head, args) = rule.left.spine();
        if head.head_symbol().is_none() {
            continue;
        }
        for meta_idx in rule.right.free_meta_vars() {
            let Some(target_sort) = meta_target_sort(&rule.right, meta_idx) else { continue };
            let mut accessible_somewhere = false;
            let mut local_clauses: Vec<Vec<Literal>> = Vec::new();
            for arg in &args {
                if !term_mentions_meta(arg, meta_idx) {
                    continue;
                }
                let mut occurrences = Vec::new();
                collect_polarities(&arg.ty(), Polarity::Positive, &mut occurrences);
                let mut arg_ok_lits = Vec::new();
                for (sort, polarity) in occurrences {
                    let Some(si) = sorts.iter().position(|s| s == &sort) else { continue };
                    let Some(ti) = sorts.iter().position(|s| s == &target_sort) else { continue };
                    accessible_somewhere = true;
                    match polarity {
                        Polarity::Positive => arg_ok_lits.push(Literal::pos(ge_vars[&(si, ti)])),
                        Polarity::Negative => {
                            // kappa > kappa' encoded as ge(si,ti) & !ge(ti,si);
                            // approximate with a fresh gt variable tied to both.
                            let gt_var = cnf.fresh_var();
                            cnf.add_clause(vec![Literal::neg(gt_var), Literal::pos(ge_vars[&(si, ti)])]);
                            cnf.add_clause(vec![Literal::neg(gt_var), Literal::neg(ge_vars[&(ti, si)])]);
                            arg_ok_lits.push(Literal::pos(gt_var));
                        }
                    }
                }
                if !arg_ok_lits.is_empty() {
                    local_clauses.push(arg_ok_lits);
                }
            }
            if accessible_somewhere {
                // Every occurrence along the argument's type must satisfy
                // its polarity constraint: conjunction of all produced
                // literals (each already individually required, so add
                // them as unit-ish "all must hold" by requiring each).
                for lits in local_clauses {
                    for lit in lits {
                        cnf.add_clause(vec![lit]);
                    }
                }
            }
        }
    }

    let model = crate::sat::solve(&cnf)?;
    let mut order = HashMap::new();
    for i in 0..n {
        for j in 0..n {
            order.insert((i, j), model.get(&ge_vars[&(i, j)]).copied().unwrap_or(false));
        }
    }
    Some(SortOrdering { sorts, order })
}

fn collect_base_sorts(rules: &Ruleset) -> Vec<String> {
    let mut set = HashSet::new();
    for rule in rules {
        collect_sorts_from_term(&rule.left, &mut set);
        collect_sorts_from_term(&rule.right, &mut set);
    }
    let mut v: Vec<String> = set.into_iter().collect();
    v.sort();
    v
}

fn collect_sorts_from_term(term: &Term, set: &mut HashSet<String>) {
    fn collect_sorts_from_type(ty: &Type, set: &mut HashSet<String>) {
        match ty {
            Type::Base(b) => {
                set.insert(b.clone());
            }
            Type::Var(_) => {}
            Type::Arrow(d, c) => {
                collect_sorts_from_type(d, set);
                collect_sorts_from_type(c, set);
            }
        }
    }
    match term {
        Term::Var { ty, .. } | Term::Const { ty, .. } => collect_sorts_from_type(ty, set),
        Term::Apply(f, a) => {
            collect_sorts_from_term(f, set);
            collect_sorts_from_term(a, set);
        }
        Term::Abs { var_ty, body, .. } => {
            collect_sorts_from_type(var_ty, set);
            collect_sorts_from_term(body, set);
        }
        Term::MetaApp { meta, args } => {
            collect_sorts_from_type(&meta.ty, set);
            for a in args {
                collect_sorts_from_term(a, set);
            }
        }
    }
}

fn term_mentions_meta(term: &Term, idx: u32) -> bool {
    term.free_meta_vars().contains(&idx)
}

fn meta_target_sort(term: &Term, idx: u32) -> Option<String> {
    match term {
        Term::MetaApp { meta, args } if meta.index == idx => match meta.ty.output() {
            Type::Base(b) => Some(b.clone()),
            _ => None,
        },
        Term::MetaApp { args, .. } => args.iter().find_map(|a| meta_target_sort(a, idx)),
        Term::Apply(f, a) => meta_target_sort(f, idx).or_else(|| meta_target_sort(a, idx)),
        Term::Abs { body, .. } => meta_target_sort(body, idx),
        _ => None,
    }
}

/// Whether the rule set is plain-function-passing under the given
/// ordering: every free variable of functional type occurring in a
/// left-hand side occurs only at accessible positions.
pub fn is_pfp(rules: &Ruleset) -> bool {
    search_sort_ordering(rules).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::MetaVar;

    #[test]
    fn test_trivial_system_is_pfp() {
        let o = Type::base("o");
        let a = Term::constant("a", o.clone());
        let rule = crate::rule::MatchRule::new_unchecked(a.clone(), a);
        assert!(is_pfp(&vec![rule]));
    }

    #[test]
    fn test_accessible_meta_variable() {
        let o = Type::base("o");
        let f = Term::constant("f", Type::curry([o.clone()], o.clone()));
        let z = MetaVar { index: 0, name: "Z".into(), ty: o.clone() };
        let left = Term::apply(f, Term::meta_app(z.clone(), vec![]));
        let right = Term::meta_app(z, vec![]);
        let rule = crate::rule::MatchRule::new_unchecked(left, right);
        assert!(search_sort_ordering(&vec![rule]).is_some());
    }
}
