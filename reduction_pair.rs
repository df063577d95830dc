//! Reduction-pair processor (spec §4.7).
//!
//! `OrderingProblem` packages a DP problem's requirements for an
//! ordering engine; `ReductionPairEngine` is the injectable boundary
//! (spec §1 scopes out SAT/encoding internals of concrete engines —
//! HORPO and polynomial interpretations are implemented only behind this
//! trait, with one concrete reference engine below).

use crate::dependency_pair::DpSet;
use crate::rule::{MatchRule, Ruleset};
use crate::signature::Alphabet;
use crate::term::{Term, Type};
use std::collections::HashMap;

/// One `l >= r` or `l > r` requirement handed to an ordering engine.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub left: Term,
    pub right: Term,
    pub strict_required: bool,
}

/// Bundles everything a reduction-pair engine needs to attempt an
/// orientation (spec §4.7): the per-DP strict requirements, the
/// per-usable-rule non-strict requirements, the alphabet, and a
/// tagged/untagged flag.
pub struct OrderingProblem<'a> {
    pub strict: Vec<Requirement>,
    pub weak: Vec<Requirement>,
    pub alphabet: &'a Alphabet,
    /// Tagged when the system is abstraction-simple and the formative
    /// flag holds (spec §4.7); tagging changes how an engine may treat
    /// abstraction subterms, but is opaque to this interface.
    pub tagged: bool,
}

impl<'a> OrderingProblem<'a> {
    pub fn from_dp_problem(dps: &DpSet, usable: &Ruleset, alphabet: &'a Alphabet, tagged: bool) -> Self {
        let strict = dps.iter().map(|p| Requirement { left: p.left.clone(), right: p.right.clone(), strict_required: true }).collect();
        let weak = usable
            .iter()
            .map(|r| Requirement { left: r.left.clone(), right: r.right.clone(), strict_required: false })
            .collect();
        OrderingProblem { strict, weak, alphabet, tagged }
    }

    /// Adds usable-rules-with-respect-to requirements when the `uwrt`
    /// flag is on (spec §4.7): non-strict requirements for every rule
    /// reachable from the DP set's right-hand sides through `extra`.
    pub fn with_usable_wrt(mut self, extra: &Ruleset) -> Self {
        self.weak.extend(
            extra.iter().map(|r| Requirement { left: r.left.clone(), right: r.right.clone(), strict_required: false }),
        );
        self
    }
}

/// Outcome of a reduction-pair attempt: the indices (into the original
/// `strict` slice, i.e. the DP set) that were oriented strictly.
#[derive(Debug, Clone, Default)]
pub struct OrientationResult {
    pub strictly_oriented: Vec<usize>,
}

/// The injectable ordering-engine boundary (spec §4.7). A concrete
/// implementation decides, for a given `OrderingProblem`, which strict
/// requirements it can orient while keeping every weak requirement
/// non-strict.
pub trait ReductionPairEngine {
    fn orient(&self, problem: &OrderingProblem) -> OrientationResult;
}

/// A linear polynomial interpretation `[f](x1,...,xn) = c0 + c1*x1 + ... + cn*xn`
/// over naturals, one monomial set per symbol.
#[derive(Debug, Clone)]
pub struct PolynomialInterpretation {
    coefficients: HashMap<String, (u64, Vec<u64>)>,
}

impl PolynomialInterpretation {
    pub fn new() -> Self {
        PolynomialInterpretation { coefficients: HashMap::new() }
    }

    pub fn set(&mut self, symbol: impl Into<String>, constant: u64, linear: Vec<u64>) {
        self.coefficients.insert(symbol.into(), (constant, linear));
    }

    fn eval(&self, term: &Term, env: &HashMap<u32, u64>) -> u64 {
        match term {
            Term::Var { index, .. } => env.get(index).copied().unwrap_or(1),
            Term::Const { name, .. } => self.coefficients.get(name).map(|(c, _)| *c).unwrap_or(1),
            Term::Apply(..) => {
                let (head, args) = term.spine();
                let vals: Vec<u64> = args.iter().map(|a| self.eval(a, env)).collect();
                match head {
                    Term::Const { name, .. } => match self.coefficients.get(name) {
                        Some((c, coeffs)) => {
                            let mut acc = *c;
                            for (coef, v) in coeffs.iter().zip(vals.iter()) {
                                acc += coef.saturating_mul(*v);
                            }
                            acc
                        }
                        None => vals.iter().sum::<u64>() + 1,
                    },
                    _ => vals.iter().sum::<u64>() + 1,
                }
            }
            Term::Abs { body, .. } => self.eval(body, env),
            Term::MetaApp { args, .. } => args.iter().map(|a| self.eval(a, env)).sum::<u64>() + 1,
        }
    }

    /// Every free variable defaults to interpretation `1`, the minimum
    /// value of the naturals ordering used here.
    fn env_for(term: &Term) -> HashMap<u32, u64> {
        term.free_vars().into_iter().map(|v| (v, 1)).collect()
    }
}

impl Default for PolynomialInterpretation {
    fn default() -> Self {
        Self::new()
    }
}

impl ReductionPairEngine for PolynomialInterpretation {
    fn orient(&self, problem: &OrderingProblem) -> OrientationResult {
        for weak in &problem.weak {
            let env = Self::env_for(&weak.left);
            let l = self.eval(&weak.left, &env);
            let r = self.eval(&weak.right, &env);
            if l < r {
                return OrientationResult::default();
            }
        }
        let mut strictly_oriented = Vec::new();
        for (i, req) in problem.strict.iter().enumerate() {
            let env = Self::env_for(&req.left);
            let l = self.eval(&req.left, &env);
            let r = self.eval(&req.right, &env);
            if l > r {
                strictly_oriented.push(i);
            } else if l < r {
                return OrientationResult { strictly_oriented: Vec::new() };
            }
        }
        OrientationResult { strictly_oriented }
    }
}

/// Extracts the closed-form match rules the dynamic rule-removal pass
/// (spec §4.8 "(a) tries rule removal via reduction pairs") operates
/// over: plain `MatchRule`s are not `Requirement`s, so this adapts them.
pub fn rules_as_requirements(rules: &Ruleset) -> Vec<Requirement> {
    rules.iter().map(|r| Requirement { left: r.left.clone(), right: r.right.clone(), strict_required: false }).collect()
}

pub fn requirement_rules(reqs: &[Requirement]) -> Ruleset {
    reqs.iter().map(|r| MatchRule::new_unchecked(r.left.clone(), r.right.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency_pair::{DependencyPair, DpStyle};

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_polynomial_orients_decreasing_pair() {
        let s_ty = Type::curry([o()], o());
        let x = Term::var(0, o());
        let left = Term::apply(Term::constant("s#", s_ty.clone()), Term::apply(Term::constant("s", s_ty.clone()), x.clone()));
        let right = Term::apply(Term::constant("s#", s_ty), x);
        let dp = DependencyPair::new(left, right, DpStyle::Normal);
        let sig = Alphabet::new();
        let mut poly = PolynomialInterpretation::new();
        poly.set("s", 1, vec![1]);
        poly.set("s#", 0, vec![1]);
        let problem = OrderingProblem::from_dp_problem(&vec![dp], &vec![], &sig, false);
        let result = poly.orient(&problem);
        assert_eq!(result.strictly_oriented, vec![0]);
    }
}
