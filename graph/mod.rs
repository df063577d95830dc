//! Dependency graph approximation (spec §4.4).
//!
//! Grounded on `original_source/dependencygraph.h`'s field shape
//! (`graph`, `reachable`, `noneatingpos`, `can_reduce_to`) and its
//! `connection_possible`/`reduction_possible`/`get_sccs` comments, using
//! `petgraph` (as in the `teeaychem-otter_sat` manifest) for the
//! adjacency storage and SCC extraction rather than a hand-rolled
//! Tarjan pass.

pub mod noneating;
pub mod reduce_to;

use crate::dependency_pair::DpSet;
use crate::term::{Term, Type};
use noneating::NonEatingTable;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use reduce_to::ReduceToTable;

/// The over-approximated graph on a dependency-pair set's indices, plus
/// its transitive closure (spec §4.4 "`reachable[i][j]`").
pub struct DependencyGraph {
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
    reachable: Vec<Vec<bool>>,
}

impl DependencyGraph {
    /// Builds the graph for `pairs`: an edge `i -> j` iff
    /// `connection_possible(pairs[i], pairs[j])`.
    pub fn build(pairs: &DpSet, noneating: &NonEatingTable, reduce_to: &ReduceToTable) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..pairs.len()).map(|i| graph.add_node(i)).collect();
        for (i, p1) in pairs.iter().enumerate() {
            for (j, p2) in pairs.iter().enumerate() {
                if connection_possible(p1, p2, noneating, reduce_to) {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }
        let reachable = compute_reachable(&graph, &nodes);
        DependencyGraph { graph, nodes, reachable }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn reachable(&self, i: usize, j: usize) -> bool {
        self.reachable.get(i).and_then(|row| row.get(j)).copied().unwrap_or(false)
    }

    /// Extracts strongly connected components with at least one internal
    /// edge (spec §4.4 "SCC extraction"): singleton nodes with no
    /// self-loop are not considered a cycle and are dropped, matching
    /// the original's "find `reachable[i][i]`" loop rather than
    /// `petgraph`'s definition (which reports every node as its own
    /// trivial SCC).
    pub fn get_sccs(&self) -> Vec<Vec<usize>> {
        let components = tarjan_scc(&self.graph);
        let mut sccs: Vec<Vec<usize>> = Vec::new();
        for comp in components {
            if comp.len() > 1 {
                let mut indices: Vec<usize> = comp.iter().map(|&n| self.graph[n]).collect();
                indices.sort_unstable();
                sccs.push(indices);
            } else if comp.len() == 1 {
                let n = comp[0];
                if self.graph.contains_edge(n, n) {
                    sccs.push(vec![self.graph[n]]);
                }
            }
        }
        // Ascending by smallest member index, for deterministic problem
        // replacement ordering (spec §4.8 "Ordering guarantees").
        sccs.sort_by_key(|scc| scc[0]);
        sccs
    }
}

fn compute_reachable(graph: &DiGraph<usize, ()>, nodes: &[NodeIndex]) -> Vec<Vec<bool>> {
    let n = nodes.len();
    let mut reach = vec![vec![false; n]; n];
    for i in 0..n {
        reach[i][i] = true;
    }
    for edge in graph.edge_indices() {
        let (a, b) = graph.edge_endpoints(edge).unwrap();
        let i = graph[a];
        let j = graph[b];
        reach[i][j] = true;
    }
    // Floyd–Warshall closure; workbenches are small enough (one DP set
    // per termination problem) that cubic closure is not a concern.
    for k in 0..n {
        for i in 0..n {
            if reach[i][k] {
                for j in 0..n {
                    if reach[k][j] {
                        reach[i][j] = true;
                    }
                }
            }
        }
    }
    reach
}

use crate::dependency_pair::DependencyPair;

/// `connection_possible(p1, p2)` (spec §4.4): true iff an instance of
/// `p1`'s right-hand side might rewrite to an instance of `p2`'s
/// left-hand side.
pub fn connection_possible(
    p1: &DependencyPair,
    p2: &DependencyPair,
    noneating: &NonEatingTable,
    reduce_to: &ReduceToTable,
) -> bool {
    if p1.right.is_meta_headed() {
        return true;
    }
    let (h1, args1) = p1.right.spine();
    let (h2, args2) = p2.left.spine();
    let (Term::Const { name: n1, .. }, Term::Const { name: n2, .. }) = (h1, h2) else {
        return true;
    };
    if n1 != n2 {
        return false;
    }
    if h1.ty() != h2.ty() {
        return false;
    }
    // Headmost semantics: a shorter spine may be extended with the
    // longer one's extra trailing arguments; only the shared prefix is
    // compared.
    let shared = args1.len().min(args2.len());
    for k in 0..shared {
        if !reduction_possible(args1[k], args2[k], noneating, reduce_to) {
            return false;
        }
    }
    true
}

/// `reduction_possible(s, t)` (spec §4.4): a recursive over-approximation
/// of "an instance of `s` might reduce to an instance of `t`".
pub fn reduction_possible(s: &Term, t: &Term, noneating: &NonEatingTable, reduce_to: &ReduceToTable) -> bool {
    if s.ty() != t.ty() {
        return false;
    }
    match t {
        Term::MetaApp { meta, args } if args.is_empty() => {
            let fv_s = s.free_vars();
            let bound: std::collections::BTreeSet<u32> = Default::default();
            let _ = meta;
            fv_s.iter().all(|v| bound.contains(v) || var_at_non_eating_position(s, *v, noneating))
        }
        Term::Abs { var, var_ty, body } => match s {
            Term::Abs { var: sv, body: sbody, .. } => {
                let renamed = sbody.substitute(*sv, &Term::var(*var, var_ty.clone())).unwrap_or_else(|_| (**sbody).clone());
                reduction_possible(&renamed, body, noneating, reduce_to)
            }
            _ => false,
        },
        _ => {
            let (th, targs) = t.spine();
            match (s.spine().0, th) {
                (Term::Const { name: sn, .. }, Term::Const { name: tn, .. }) if sn == tn => {
                    let sargs = s.spine().1;
                    sargs.len() == targs.len()
                        && sargs.iter().zip(targs.iter()).all(|(a, b)| reduction_possible(a, b, noneating, reduce_to))
                }
                (Term::Const { name: sn, .. }, Term::Const { name: tn, .. }) => {
                    reduce_to::symbols_can_reduce(reduce_to, sn, tn)
                }
                _ => true,
            }
        }
    }
}

fn var_at_non_eating_position(term: &Term, var: u32, noneating: &NonEatingTable) -> bool {
    match term {
        Term::Var { index, .. } => *index == var,
        Term::Const { .. } => false,
        Term::Abs { body, .. } => var_at_non_eating_position(body, var, noneating),
        Term::MetaApp { args, .. } => args.iter().any(|a| var_at_non_eating_position(a, var, noneating)),
        Term::Apply(..) => {
            let (head, args) = term.spine();
            let name = head.head_symbol();
            args.iter().enumerate().any(|(k, a)| {
                if !a.free_vars().contains(&var) {
                    return false;
                }
                let eaten_ok = match name {
                    Some(n) => noneating.is_non_eating(n, k),
                    None => true,
                };
                eaten_ok && var_at_non_eating_position(a, var, noneating)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency_pair::DpStyle;
    use crate::rule::MatchRule;
    use crate::signature::Alphabet;

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_scc_detects_simple_cycle() {
        let mut sig = Alphabet::new();
        sig.declare("f", Type::curry([o()], o()));
        let f = Term::constant("f", Type::curry([o()], o()));
        let fsharp = sig.upped_symbol("f");
        let fsharp_ty = sig.type_of(&fsharp).cloned().unwrap();
        let x = Term::var(0, o());
        let left = Term::apply(Term::constant(fsharp.clone(), fsharp_ty.clone()), x.clone());
        let right = Term::apply(Term::constant(fsharp, fsharp_ty), x);
        let dp = DependencyPair::new(left, right, DpStyle::Normal);
        let rule = MatchRule::new_unchecked(Term::apply(f.clone(), Term::var(0, o())), Term::apply(f, Term::var(0, o())));
        let noneating = NonEatingTable::compute(&vec![rule.clone()], &sig);
        let reduce_to = ReduceToTable::build(&vec![rule]);
        let graph = DependencyGraph::build(&vec![dp], &noneating, &reduce_to);
        let sccs = graph.get_sccs();
        assert_eq!(sccs, vec![vec![0]]);
    }

    #[test]
    fn test_no_connection_on_different_heads() {
        let mut sig = Alphabet::new();
        sig.declare("f", Type::curry([o()], o()));
        sig.declare("g", Type::curry([o()], o()));
        let fsharp = sig.upped_symbol("f");
        let gsharp = sig.upped_symbol("g");
        let fsharp_ty = sig.type_of(&fsharp).cloned().unwrap();
        let gsharp_ty = sig.type_of(&gsharp).cloned().unwrap();
        let x = Term::var(0, o());
        let dp1 = DependencyPair::new(
            Term::apply(Term::constant(fsharp, fsharp_ty), x.clone()),
            Term::apply(Term::constant(gsharp.clone(), gsharp_ty.clone()), x.clone()),
            DpStyle::Normal,
        );
        let dp2 = DependencyPair::new(
            Term::apply(Term::constant(gsharp, gsharp_ty), x.clone()),
            Term::constant("c", o()),
            DpStyle::Normal,
        );
        let noneating = NonEatingTable::compute(&vec![], &sig);
        let reduce_to = ReduceToTable::build(&vec![]);
        let graph = DependencyGraph::build(&vec![dp1, dp2], &noneating, &reduce_to);
        assert!(graph.reachable(0, 1));
        assert!(!graph.reachable(1, 0));
    }
}
