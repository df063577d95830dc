//! Encoded-application simplification (spec §4.2).
//!
//! Detects function symbols `f` whose only defining rule is
//! `f Z x1 ... xn -> Z x1 ... xn` (with the `xi` distinct bound
//! variables) and rewrites them out by replacing `f Z s1 ... sn` with
//! `Z[s1,...,sn]` throughout. Disables non-termination detection when it
//! fires, since the simplification is only known to preserve first-order
//! termination (spec §4.2, §8).

use crate::rule::{MatchRule, Ruleset};
use crate::term::{MetaVar, Term};
use std::collections::HashSet;

pub struct EncodedApplicationResult {
    pub rules: Ruleset,
    pub fired: bool,
}

/// Finds and eliminates encoded-application symbols.
pub fn simplify(rules: &Ruleset) -> EncodedApplicationResult {
    let candidates: Vec<String> = rules
        .iter()
        .filter_map(|r| encoded_application_symbol(r))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if candidates.is_empty() {
        return EncodedApplicationResult { rules: rules.clone(), fired: false };
    }

    // Only eliminate a candidate if its sole defining rule is the
    // encoded-application shape (no other rule is headed by it).
    let mut eliminable = Vec::new();
    for name in candidates {
        let defining: Vec<&MatchRule> = rules.iter().filter(|r| r.left.head_symbol() == Some(name.as_str())).collect();
        if defining.len() == 1 && encoded_application_symbol(defining[0]).as_deref() == Some(name.as_str()) {
            eliminable.push(name);
        }
    }

    if eliminable.is_empty() {
        return EncodedApplicationResult { rules: rules.clone(), fired: false };
    }

    let new_rules: Ruleset = rules
        .iter()
        .filter(|r| !matches!(r.left.head_symbol(), Some(h) if eliminable.iter().any(|e| e == h)))
        .map(|r| MatchRule::new_unchecked(rewrite_out(&r.left, &eliminable), rewrite_out(&r.right, &eliminable)))
        .collect();

    EncodedApplicationResult { rules: new_rules, fired: true }
}

/// If `rule` has the shape `f Z x1 ... xn -> Z x1 ... xn` with `xi`
/// distinct bound variables, returns `f`'s name.
fn encoded_application_symbol(rule: &MatchRule) -> Option<String> {
    let (head, args) = rule.left.spine();
    let name = head.head_symbol()?;
    if args.is_empty() {
        return None;
    }
    let (z, z_args) = match &args[0] {
        Term::MetaApp { meta, args } if args.is_empty() => (meta.clone(), &args[..]),
        _ => return None,
    };
    let rest = &args[1..];
    let mut seen = HashSet::new();
    let mut bound_vars = Vec::new();
    for a in rest {
        match a {
            Term::Var { index, .. } => {
                if !seen.insert(*index) {
                    return None;
                }
                bound_vars.push(*index);
            }
            _ => return None,
        }
    }
    let expected_right = Term::apply_spine(
        Term::meta_app(z.clone(), z_args.to_vec()),
        bound_vars.iter().map(|&v| Term::var(v, rule.left.ty())),
    );
    if rule.right.spine().0.head_symbol().is_some() {
        return None;
    }
    // Compare shape loosely: right must be `Z x1 ... xn` in the same
    // order, with Z the same meta-variable index.
    let (rhead, rargs) = rule.right.spine();
    let rhs_is_same_meta = matches!(rhead, Term::MetaApp{ meta, ..} if meta.index == z.index);
    let rhs_args_match = rargs.len() == bound_vars.len()
        && rargs.iter().zip(bound_vars.iter()).all(|(a, v)| matches!(a, Term::Var { index, .. } if index == v));
    let _ = expected_right;
    if rhs_is_same_meta && rhs_args_match {
        Some(name.to_string())
    } else {
        None
    }
}

fn rewrite_out(term: &Term, eliminable: &[String]) -> Term {
    let (head, args) = term.spine();
    if let Term::Const { name, .. } = head {
        if eliminable.iter().any(|e| e == name) && !args.is_empty() {
            if let Term::MetaApp { meta, args: z_args } = &args[0] {
                let meta_app = Term::meta_app(
                    MetaVar { index: meta.index, name: meta.name.clone(), ty: meta.ty.clone() },
                    z_args.iter().map(|a| rewrite_out(a, eliminable)).collect(),
                );
                return Term::apply_spine(meta_app, args[1..].iter().map(|a| rewrite_out(a, eliminable)));
            }
        }
    }
    match term {
        Term::Var { .. } | Term::Const { .. } => term.clone(),
        Term::Apply(f, a) => Term::apply(rewrite_out(f, eliminable), rewrite_out(a, eliminable)),
        Term::Abs { var, var_ty, body } => Term::abs(*var, var_ty.clone(), rewrite_out(body, eliminable)),
        Term::MetaApp { meta, args } => {
            Term::meta_app(meta.clone(), args.iter().map(|a| rewrite_out(a, eliminable)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Type;

    #[test]
    fn test_detects_encoded_application() {
        let o = Type::base("o");
        let z = MetaVar { index: 0, name: "Z".into(), ty: Type::curry([o.clone()], o.clone()) };
        let x = 1u32;
        let f = Term::constant("ap", Type::curry([Type::curry([o.clone()], o.clone()), o.clone()], o.clone()));
        let left = Term::apply_spine(f, [Term::meta_app(z.clone(), vec![]), Term::var(x, o.clone())]);
        let right = Term::apply_spine(Term::meta_app(z, vec![]), [Term::var(x, o.clone())]);
        let rule = MatchRule::new_unchecked(left, right);
        assert_eq!(encoded_application_symbol(&rule), Some("ap".to_string()));
    }

    #[test]
    fn test_no_false_positive_on_ordinary_rule() {
        let o = Type::base("o");
        let left = Term::constant("a", o.clone());
        let right = Term::constant("a", o);
        let rule = MatchRule::new_unchecked(left, right);
        assert_eq!(encoded_application_symbol(&rule), None);
    }
}
