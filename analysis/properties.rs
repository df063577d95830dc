//! Boolean/map properties of a rule set (spec §4.2 table), used as
//! processor preconditions throughout the framework.

use crate::rule::Ruleset;
use crate::signature::Alphabet;
use crate::term::Term;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RuleProperties {
    pub left_linear: bool,
    pub fully_extended: bool,
    pub algebraic: bool,
    pub argument_free: bool,
    pub meta_single: bool,
    pub base_outputs: bool,
    pub eta_long: bool,
    pub monomorphic: bool,
    pub fully_first_order: bool,
    pub has_critical_pairs: bool,
    /// Maximum curried arity observed for each symbol across all rules.
    pub arities: HashMap<String, usize>,
}

impl RuleProperties {
    pub fn analyze(rules: &Ruleset) -> Self {
        let mut props = RuleProperties {
            left_linear: true,
            fully_extended: true,
            algebraic: true,
            argument_free: true,
            meta_single: true,
            base_outputs: true,
            eta_long: true,
            monomorphic: true,
            fully_first_order: true,
            has_critical_pairs: false,
            arities: HashMap::new(),
        };

        for rule in rules {
            if !is_left_linear(&rule.left) {
                props.left_linear = false;
            }
            if !is_fully_extended(&rule.left) {
                props.fully_extended = false;
            }
            if !is_algebraic(&rule.left) {
                props.algebraic = false;
            }
            if !is_argument_free(&rule.left) {
                props.argument_free = false;
            }
            if !is_meta_single(&rule.left) {
                props.meta_single = false;
            }
            if !rule.left.ty().is_base() {
                props.base_outputs = false;
            }
            if !is_eta_long(&rule.left) || !is_eta_long(&rule.right) {
                props.eta_long = false;
            }
            if contains_type_var(&rule.left) || contains_type_var(&rule.right) {
                props.monomorphic = false;
            }
            if !is_fully_first_order(&rule.left) || !is_fully_first_order(&rule.right) {
                props.fully_first_order = false;
            }
            record_arities(&rule.left, &mut props.arities);
            record_arities(&rule.right, &mut props.arities);
        }

        props.has_critical_pairs = has_critical_pairs(rules);
        props
    }
}

/// No meta-variable repeats in the left-hand side.
fn is_left_linear(term: &Term) -> bool {
    let mut seen = std::collections::HashSet::new();
    collect_meta_occurrences(term, &mut seen).1
}

fn collect_meta_occurrences(term: &Term, seen: &mut std::collections::HashSet<u32>) -> (usize, bool) {
    match term {
        Term::Var { .. } | Term::Const { .. } => (0, true),
        Term::Apply(f, a) => {
            let (c1, ok1) = collect_meta_occurrences(f, seen);
            let (c2, ok2) = collect_meta_occurrences(a, seen);
            (c1 + c2, ok1 && ok2)
        }
        Term::Abs { body, .. } => collect_meta_occurrences(body, seen),
        Term::MetaApp { meta, args } => {
            let mut ok = seen.insert(meta.index);
            for a in args {
                let (_, sub_ok) = collect_meta_occurrences(a, seen);
                ok &= sub_ok;
            }
            (1, ok)
        }
    }
}

/// Every meta-variable in the LHS is applied to exactly the bound
/// variables in scope.
fn is_fully_extended(term: &Term) -> bool {
    fully_extended_rec(term, &[])
}

fn fully_extended_rec(term: &Term, bound: &[u32]) -> bool {
    match term {
        Term::Var { .. } | Term::Const { .. } => true,
        Term::Apply(f, a) => fully_extended_rec(f, bound) && fully_extended_rec(a, bound),
        Term::Abs { var, body, .. } => {
            let mut extended = bound.to_vec();
            extended.push(*var);
            fully_extended_rec(body, &extended)
        }
        Term::MetaApp { args, .. } => {
            if args.len() != bound.len() {
                return false;
            }
            args.iter().zip(bound.iter()).all(|(arg, b)| matches!(arg, Term::Var { index, .. } if index == b))
        }
    }
}

/// No abstractions in the LHS except those of the eta-shape `\x.Z[x]`.
fn is_algebraic(term: &Term) -> bool {
    match term {
        Term::Var { .. } | Term::Const { .. } => true,
        Term::Apply(f, a) => is_algebraic(f) && is_algebraic(a),
        Term::Abs { var, body, .. } => matches!(
            body.as_ref(),
            Term::MetaApp { args, .. } if args.len() == 1 && matches!(&args[0], Term::Var { index, .. } if index == var)
        ),
        Term::MetaApp { args, .. } => args.iter().all(is_algebraic),
    }
}

/// Every meta-variable occurs with zero arguments.
fn is_argument_free(term: &Term) -> bool {
    match term {
        Term::Var { .. } | Term::Const { .. } => true,
        Term::Apply(f, a) => is_argument_free(f) && is_argument_free(a),
        Term::Abs { body, .. } => is_argument_free(body),
        Term::MetaApp { args, .. } => args.is_empty(),
    }
}

/// Every meta-variable has at most one argument.
fn is_meta_single(term: &Term) -> bool {
    match term {
        Term::Var { .. } | Term::Const { .. } => true,
        Term::Apply(f, a) => is_meta_single(f) && is_meta_single(a),
        Term::Abs { body, .. } => is_meta_single(body),
        Term::MetaApp { args, .. } => args.len() <= 1,
    }
}

/// Every subterm of functional type is an abstraction or a meta-variable
/// applied enough times to reach its full declared arity. Checked at
/// "value" positions only: the operator of an application is in the
/// middle of being applied (more arguments are being supplied to it
/// right here), so a curried function symbol heading a spine is not
/// itself required to be an abstraction — only subterms that stand on
/// their own (arguments, abstraction bodies, the term as a whole) are.
fn is_eta_long(term: &Term) -> bool {
    is_eta_long_value(term)
}

fn is_eta_long_value(term: &Term) -> bool {
    if matches!(term.ty(), crate::term::Type::Arrow(..)) {
        return match term {
            Term::Abs { .. } => is_eta_long_spine(term),
            Term::MetaApp { meta, args } if args.len() >= meta.ty.max_arity() => is_eta_long_spine(term),
            _ => false,
        };
    }
    is_eta_long_spine(term)
}

fn is_eta_long_spine(term: &Term) -> bool {
    match term {
        Term::Var { .. } | Term::Const { .. } => true,
        Term::Apply(f, a) => is_eta_long_spine(f) && is_eta_long_value(a),
        Term::Abs { body, .. } => is_eta_long_value(body),
        Term::MetaApp { args, .. } => args.iter().all(is_eta_long_value),
    }
}

fn contains_type_var(term: &Term) -> bool {
    match term {
        Term::Var { ty, .. } | Term::Const { ty, .. } => ty.contains_var(),
        Term::Apply(f, a) => contains_type_var(f) || contains_type_var(a),
        Term::Abs { var_ty, body, .. } => var_ty.contains_var() || contains_type_var(body),
        Term::MetaApp { meta, args } => meta.ty.contains_var() || args.iter().any(contains_type_var),
    }
}

/// No composed type and no meta-application used anywhere.
fn is_fully_first_order(term: &Term) -> bool {
    match term {
        Term::Var { ty, .. } | Term::Const { ty, .. } => !matches!(ty, crate::term::Type::Arrow(..)),
        Term::Apply(f, a) => is_fully_first_order(f) && is_fully_first_order(a),
        Term::Abs { .. } => false,
        Term::MetaApp { .. } => false,
    }
}

fn record_arities(term: &Term, arities: &mut HashMap<String, usize>) {
    let (head, args) = term.spine();
    if let Term::Const { name, .. } = head {
        let entry = arities.entry(name.clone()).or_insert(0);
        if args.len() > *entry {
            *entry = args.len();
        }
    }
    match term {
        Term::Apply(f, a) => {
            record_arities(f, arities);
            record_arities(a, arities);
        }
        Term::Abs { body, .. } => record_arities(body, arities),
        Term::MetaApp { args, .. } => {
            for a in args {
                record_arities(a, arities);
            }
        }
        _ => {}
    }
}

/// Two LHSs can be matched against each other: a coarse, sound
/// over-approximation that flags same-head-symbol LHS pairs whose
/// arities overlap (a genuine most-general-unifier search is out of
/// scope for this syntactic check, spec §4.2 just needs a boolean).
fn has_critical_pairs(rules: &Ruleset) -> bool {
    for (i, r1) in rules.iter().enumerate() {
        for r2 in rules.iter().skip(i + 1) {
            if let (Some(h1), Some(h2)) = (r1.left.head_symbol(), r2.left.head_symbol()) {
                if h1 == h2 {
                    return true;
                }
            }
        }
    }
    false
}

/// Given `(Σ, R)`, validates arities never exceed the number of curried
/// arguments in the declared type (spec §3 invariant).
pub fn check_arities_within_type(sig: &Alphabet, props: &RuleProperties) -> Result<(), String> {
    for (name, &arity) in &props.arities {
        if let Some(ty) = sig.type_of(name) {
            if arity > ty.max_arity() {
                return Err(format!("symbol {name} used with arity {arity} exceeding its declared type"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{MetaVar, Type};

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_left_linear_rejects_repeated_meta() {
        let z = MetaVar { index: 0, name: "Z".into(), ty: o() };
        let f = Term::constant("f", Type::curry([o(), o()], o()));
        let left = Term::apply_spine(f, [Term::meta_app(z.clone(), vec![]), Term::meta_app(z, vec![])]);
        assert!(!is_left_linear(&left));
    }

    #[test]
    fn test_argument_free_and_meta_single() {
        let z = MetaVar { index: 0, name: "Z".into(), ty: Type::curry([o()], o()) };
        let applied = Term::meta_app(z, vec![Term::var(0, o())]);
        assert!(!is_argument_free(&applied));
        assert!(is_meta_single(&applied));
    }

    #[test]
    fn test_fully_first_order_rejects_meta_app() {
        let z = MetaVar { index: 0, name: "Z".into(), ty: o() };
        assert!(!is_fully_first_order(&Term::meta_app(z, vec![])));
        assert!(is_fully_first_order(&Term::constant("a", o())));
    }

    #[test]
    fn test_eta_long_accepts_applied_function_head() {
        // f(x): f's own declared type is Arrow(o,o), but it heads this
        // very application rather than standing alone, so it must not
        // fail the check on its own account.
        let f = Term::constant("f", Type::curry([o()], o()));
        let x = Term::var(0, o());
        assert!(is_eta_long(&Term::apply(f, x)));
    }

    #[test]
    fn test_eta_long_rejects_bare_function_valued_argument() {
        // g(f) passes the bare function symbol f as a value, which is
        // neither an abstraction nor a saturated meta-variable.
        let f = Term::constant("f", Type::curry([o()], o()));
        let g = Term::constant("g", Type::curry([Type::curry([o()], o())], o()));
        assert!(!is_eta_long(&Term::apply(g, f)));
    }

    #[test]
    fn test_eta_long_rejects_undersaturated_meta_variable() {
        let z = MetaVar { index: 0, name: "Z".into(), ty: Type::curry([o(), o()], o()) };
        let applied_once = Term::meta_app(z, vec![Term::var(0, o())]);
        assert!(!is_eta_long(&applied_once));
    }
}
