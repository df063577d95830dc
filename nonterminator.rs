//! Non-termination heuristics (spec §4.9).
//!
//! Grounded on `original_source/nonterminator.h`'s description of the
//! syntactic "does `r` eventually contain a renamed instance of `l`"
//! search and the `lambda_calculus` self-application check.

use crate::rule::{MatchRule, Ruleset};
use crate::term::Term;

/// A non-termination witness: the looping rule and the chain of
/// meta-variable instantiations (abstractly, just the rule here — a
/// full witness reconstruction is out of scope per spec §1's "omits...
/// counter-example / witness generation for non-termination beyond a
/// yes/no/maybe verdict", this still records the triggering rule for
/// diagnostic output).
#[derive(Debug, Clone)]
pub struct LoopWitness {
    pub rule: MatchRule,
}

/// Whether `r` contains a subterm that is an instance of pattern `l`:
/// some substitution of `l`'s meta-variables (and bound variables, which
/// only match themselves) makes it syntactically equal to that subterm.
/// A bare meta-variable matches anything, so `l` itself being a bare
/// meta-variable makes this unconditionally true — the variable-headed
/// left-hand-side case.
fn contains_instance_of(r: &Term, l: &Term) -> bool {
    if matches_pattern(l, r) {
        return true;
    }
    match r {
        Term::Apply(f, a) => contains_instance_of(f, l) || contains_instance_of(a, l),
        Term::Abs { body, .. } => contains_instance_of(body, l),
        Term::MetaApp { args, .. } => args.iter().any(|a| contains_instance_of(a, l)),
        _ => false,
    }
}

/// Whether `target` is an instance of `pattern`, i.e. some substitution
/// of `pattern`'s meta-variables makes it syntactically equal to
/// `target`. Bound variables only match bound variables of the same
/// index; this does not build or check a consistent substitution across
/// repeated occurrences of the same meta-variable, which only widens
/// the set of "instances" found — acceptable since this feeds a search
/// for non-termination witnesses, never a soundness-critical positive.
fn matches_pattern(pattern: &Term, target: &Term) -> bool {
    match pattern {
        Term::MetaApp { args, .. } if args.is_empty() => true,
        Term::Const { name: pn, .. } => matches!(target, Term::Const { name: tn, .. } if tn == pn),
        Term::Var { index: pi, .. } => matches!(target, Term::Var { index: ti, .. } if pi == ti),
        Term::Apply(pf, pa) => matches!(target, Term::Apply(tf, ta) if matches_pattern(pf, tf) && matches_pattern(pa, ta)),
        Term::Abs { var_ty: pty, body: pbody, .. } => {
            matches!(target, Term::Abs { var_ty: tty, body: tbody, .. } if pty == tty && matches_pattern(pbody, tbody))
        }
        Term::MetaApp { meta: pmeta, args: pargs } => matches!(
            target,
            Term::MetaApp { meta: tmeta, args: targs }
                if pmeta.index == tmeta.index && pargs.len() == targs.len()
                    && pargs.iter().zip(targs).all(|(p, t)| matches_pattern(p, t))
        ),
    }
}

/// Searches for a rule `l -> r` where `r` already contains (syntactically,
/// modulo the approximation above) an instance headed the same way as
/// `l`, i.e. repeatedly applying the rule to its own output can recreate
/// an `l`-shaped redex without termination (spec §4.9).
pub fn find_self_looping_rule(rules: &Ruleset) -> Option<LoopWitness> {
    rules.iter().find(|r| contains_instance_of(&r.right, &r.left)).map(|r| LoopWitness { rule: r.clone() })
}

/// Detects rules that encode untyped lambda-calculus β-reduction: a
/// rule whose left-hand side applies a meta-variable to an abstraction
/// over another meta-variable, in the shape `Z[\x.Y[x]] -> Y[Z[...]]`'s
/// self-application pattern — concretely, a meta-application applied to
/// itself through an abstraction boundary (spec §4.9
/// "`lambda_calculus` predicate").
pub fn is_lambda_calculus_encoding(rules: &Ruleset) -> bool {
    rules.iter().any(|r| encodes_self_application(&r.left) && encodes_self_application(&r.right))
}

fn encodes_self_application(term: &Term) -> bool {
    match term {
        Term::Apply(f, a) => matches!(f.as_ref(), Term::Abs { .. }) || encodes_self_application(f) || encodes_self_application(a),
        Term::MetaApp { args, .. } => args.iter().any(is_abstraction_applying_meta),
        Term::Abs { body, .. } => encodes_self_application(body),
        _ => false,
    }
}

fn is_abstraction_applying_meta(term: &Term) -> bool {
    matches!(term, Term::Abs { body, .. } if matches!(body.as_ref(), Term::MetaApp { .. } | Term::Apply(..)))
}

/// Runs every non-termination heuristic in order, returning the first
/// positive result.
pub fn search(rules: &Ruleset) -> Option<LoopWitness> {
    if is_lambda_calculus_encoding(rules) {
        return rules.first().map(|r| LoopWitness { rule: r.clone() });
    }
    find_self_looping_rule(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{MetaVar, Type};

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_detects_self_looping_rule() {
        let f = Term::constant("f", Type::curry([o()], o()));
        let x = Term::var(0, o());
        let left = Term::apply(f.clone(), x.clone());
        let right = Term::apply(f.clone(), Term::apply(f, x));
        let rule = MatchRule::new_unchecked(left, right);
        assert!(find_self_looping_rule(&vec![rule]).is_some());
    }

    #[test]
    fn test_no_loop_for_simple_constructor_rule() {
        let a = Term::constant("a", o());
        let b = Term::constant("b", o());
        let rule = MatchRule::new_unchecked(a, b);
        assert!(find_self_looping_rule(&vec![rule]).is_none());
    }

    #[test]
    fn test_lambda_calculus_detection() {
        let o_ = o();
        let z = MetaVar { index: 0, name: "Z".into(), ty: Type::curry([o_.clone()], o_.clone()) };
        let y = MetaVar { index: 1, name: "Y".into(), ty: o_.clone() };
        let left = Term::meta_app(z.clone(), vec![Term::abs(0, o_.clone(), Term::meta_app(y.clone(), vec![]))]);
        let right = Term::apply(Term::abs(0, o_.clone(), Term::meta_app(y, vec![])), Term::meta_app(z, vec![]));
        let rule = MatchRule::new_unchecked(left, right);
        assert!(is_lambda_calculus_encoding(&vec![rule]));
    }
}
