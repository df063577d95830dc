//! Subterm criterion processor (spec §4.5).
//!
//! Searches, via a SAT encoding, for a simple projection orienting every
//! dependency pair non-strictly and at least one strictly.

use crate::analysis::pfp::SortOrdering;
use crate::dependency_pair::DpSet;
use crate::sat::{Cnf, Literal};
use crate::term::Term;
use std::collections::HashMap;

/// A simple projection: defined symbol name -> chosen argument position
/// (1-indexed per spec §4.5, stored 0-indexed internally).
#[derive(Debug, Clone, Default)]
pub struct SimpleProjection {
    positions: HashMap<String, usize>,
}

impl SimpleProjection {
    pub fn position_of(&self, symbol: &str) -> Option<usize> {
        self.positions.get(symbol).copied()
    }

    fn project<'a>(&self, term: &'a Term) -> Option<&'a Term> {
        let (head, args) = term.spine();
        let name = head.head_symbol()?;
        let pos = self.position_of(name)?;
        args.get(pos).copied()
    }
}

/// Outcome of a subterm-criterion search: the pairs indices that could
/// be oriented strictly survive removal; the rest must remain.
pub struct SubtermResult {
    pub projection: SimpleProjection,
    pub strict: Vec<usize>,
}

/// Collects, per defined head symbol appearing in `pairs`, its curried
/// arity (the number of arguments it is applied to in these pairs).
fn symbol_arities(pairs: &DpSet) -> HashMap<String, usize> {
    let mut arities = HashMap::new();
    for p in pairs {
        for term in [&p.left, &p.right] {
            let (head, args) = term.spine();
            if let Some(name) = head.head_symbol() {
                let entry = arities.entry(name.to_string()).or_insert(0usize);
                *entry = (*entry).max(args.len());
            }
        }
    }
    arities
}

/// Strict superterm test `s ⊵ t` restricted to immediate structural
/// containment used by the `s_i = t_j` / `s_i ⋬ t_j` syntactic tests
/// (spec §4.5): equal terms, or `t` occurring verbatim as a subterm of
/// `s` reachable by repeated projection, is approximated here by plain
/// structural equality plus a direct-subterm scan.
fn is_superterm(s: &Term, t: &Term) -> bool {
    if s == t {
        return true;
    }
    match s {
        Term::Apply(f, a) => is_superterm(f, t) || is_superterm(a, t),
        Term::Abs { body, .. } => is_superterm(body, t),
        Term::MetaApp { args, .. } => args.iter().any(|a| is_superterm(a, t)),
        _ => false,
    }
}

/// Runs the (non-collapsing) subterm criterion over `pairs`, not
/// consulting accessibility: every candidate pair must be
/// non-collapsing, matching spec §4.5's precondition.
pub fn search(pairs: &DpSet) -> Option<SubtermResult> {
    if pairs.iter().any(|p| p.is_collapsing()) {
        return None;
    }
    let arities = symbol_arities(pairs);
    if arities.is_empty() {
        return None;
    }
    let mut cnf = Cnf::new();
    let mut x_vars: HashMap<(String, usize), u32> = HashMap::new();
    for (symbol, arity) in &arities {
        let vars: Vec<u32> = (0..*arity).map(|_| cnf.fresh_var()).collect();
        for (i, &v) in vars.iter().enumerate() {
            x_vars.insert((symbol.clone(), i), v);
        }
        cnf.exactly_one(&vars);
    }
    let y_vars: Vec<u32> = pairs.iter().map(|_| cnf.fresh_var()).collect();
    cnf.at_least_one(&y_vars);

    for (k, pair) in pairs.iter().enumerate() {
        let (lh, largs) = pair.left.spine();
        let (rh, rargs) = pair.right.spine();
        let (Some(f), Some(g)) = (lh.head_symbol(), rh.head_symbol()) else { continue };
        for (i, si) in largs.iter().enumerate() {
            for (j, tj) in rargs.iter().enumerate() {
                let Some(&xfi) = x_vars.get(&(f.to_string(), i)) else { continue };
                let Some(&xgj) = x_vars.get(&(g.to_string(), j)) else { continue };
                if !is_superterm(si, tj) {
                    cnf.add_clause(vec![Literal::neg(xfi), Literal::neg(xgj)]);
                } else if **si == **tj {
                    cnf.add_clause(vec![Literal::neg(xfi), Literal::neg(xgj), Literal::neg(y_vars[k])]);
                }
            }
        }
    }

    let model = crate::sat::solve(&cnf)?;
    let mut positions = HashMap::new();
    for ((symbol, i), var) in &x_vars {
        if model.get(var).copied().unwrap_or(false) {
            positions.insert(symbol.clone(), *i);
        }
    }
    let projection = SimpleProjection { positions };
    let mut strict = Vec::new();
    for (k, pair) in pairs.iter().enumerate() {
        let l_proj = projection.project(&pair.left);
        let r_proj = projection.project(&pair.right);
        if let (Some(l), Some(r)) = (l_proj, r_proj) {
            if l != r && model.get(&y_vars[k]).copied().unwrap_or(false) {
                strict.push(k);
            }
        }
    }
    Some(SubtermResult { projection, strict })
}

/// The accessible variant (spec §4.5 "Accessible variant", used when
/// `static_flag = 2`): identical search, but the syntactic
/// `s_i ⋬ t_j` test is replaced by an accessibility test against the
/// supplied sort ordering. Collapsing pairs are still rejected, matching
/// the plain variant's precondition.
pub fn search_accessible(pairs: &DpSet, ordering: &SortOrdering) -> Option<SubtermResult> {
    if pairs.iter().any(|p| p.is_collapsing()) {
        return None;
    }
    let arities = symbol_arities(pairs);
    if arities.is_empty() {
        return None;
    }
    let mut cnf = Cnf::new();
    let mut x_vars: HashMap<(String, usize), u32> = HashMap::new();
    for (symbol, arity) in &arities {
        let vars: Vec<u32> = (0..*arity).map(|_| cnf.fresh_var()).collect();
        for (i, &v) in vars.iter().enumerate() {
            x_vars.insert((symbol.clone(), i), v);
        }
        cnf.exactly_one(&vars);
    }
    let y_vars: Vec<u32> = pairs.iter().map(|_| cnf.fresh_var()).collect();
    cnf.at_least_one(&y_vars);

    for (k, pair) in pairs.iter().enumerate() {
        let (lh, largs) = pair.left.spine();
        let (rh, rargs) = pair.right.spine();
        let (Some(f), Some(g)) = (lh.head_symbol(), rh.head_symbol()) else { continue };
        for (i, si) in largs.iter().enumerate() {
            for (j, tj) in rargs.iter().enumerate() {
                let Some(&xfi) = x_vars.get(&(f.to_string(), i)) else { continue };
                let Some(&xgj) = x_vars.get(&(g.to_string(), j)) else { continue };
                let accessible = match (base_sort(si), base_sort(tj)) {
                    (Some(a), Some(b)) => ordering.ge(&a, &b),
                    _ => is_superterm(si, tj),
                };
                if !accessible {
                    cnf.add_clause(vec![Literal::neg(xfi), Literal::neg(xgj)]);
                } else if **si == **tj {
                    cnf.add_clause(vec![Literal::neg(xfi), Literal::neg(xgj), Literal::neg(y_vars[k])]);
                }
            }
        }
    }

    let model = crate::sat::solve(&cnf)?;
    let mut positions = HashMap::new();
    for ((symbol, i), var) in &x_vars {
        if model.get(var).copied().unwrap_or(false) {
            positions.insert(symbol.clone(), *i);
        }
    }
    let projection = SimpleProjection { positions };
    let mut strict = Vec::new();
    for (k, pair) in pairs.iter().enumerate() {
        if let (Some(l), Some(r)) = (projection.project(&pair.left), projection.project(&pair.right)) {
            if l != r && model.get(&y_vars[k]).copied().unwrap_or(false) {
                strict.push(k);
            }
        }
    }
    Some(SubtermResult { projection, strict })
}

fn base_sort(term: &Term) -> Option<String> {
    match term.ty() {
        crate::term::Type::Base(b) => Some(b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency_pair::{DependencyPair, DpStyle};
    use crate::term::Type;

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_finds_decreasing_projection() {
        // f#(s(x)) -> f#(x): projecting to argument 0 strictly decreases.
        let fsharp_ty = Type::curry([o()], o());
        let s_ty = Type::curry([o()], o());
        let x = Term::var(0, o());
        let sx = Term::apply(Term::constant("s", s_ty), x.clone());
        let left = Term::apply(Term::constant("f#", fsharp_ty.clone()), sx);
        let right = Term::apply(Term::constant("f#", fsharp_ty), x);
        let dp = DependencyPair::new(left, right, DpStyle::Normal);
        let result = search(&vec![dp]).expect("expected a satisfying projection");
        assert_eq!(result.strict, vec![0]);
    }

    #[test]
    fn test_rejects_collapsing_set() {
        use crate::term::MetaVar;
        let z = MetaVar { index: 0, name: "Z".into(), ty: o() };
        let dp = DependencyPair::new(Term::constant("a", o()), Term::meta_app(z, vec![]), DpStyle::Normal);
        assert!(search(&vec![dp]).is_none());
    }
}
