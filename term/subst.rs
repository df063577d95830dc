//! Substitution, beta-reduction and positional access over [`Term`].
//!
//! Index-keyed variable substitution plus a meta-variable instantiation
//! map, with `Search`/`Replace`-style positional access/replace
//! operations alongside it.

use super::{MetaVar, Result, Term, TermError, Type};
use std::collections::HashMap;

/// A position into a term: a path of child indices. `Apply` has children
/// `[0]` (function) and `[1]` (argument); `Abs` has child `[0]` (body);
/// `MetaApp` has children `0..n` (the arguments).
pub type Position = Vec<usize>;

/// Ordinary (bound-)variable substitution, index -> replacement term.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    pub bindings: HashMap<u32, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution { bindings: HashMap::new() }
    }

    pub fn singleton(index: u32, term: Term) -> Self {
        let mut s = Substitution::new();
        s.bindings.insert(index, term);
        s
    }

    pub fn get(&self, index: u32) -> Option<&Term> {
        self.bindings.get(&index)
    }
}

/// A meta-variable instantiation: maps a meta-variable index to a closure
/// `\x1...xn. body` represented directly as `(params, body)`, so that
/// `Z[s1,...,sn]` instantiates to `body[x1:=s1,...,xn:=sn]`.
#[derive(Debug, Clone, Default)]
pub struct MetaSubstitution {
    pub bindings: HashMap<u32, (Vec<u32>, Term)>,
}

impl MetaSubstitution {
    pub fn new() -> Self {
        MetaSubstitution { bindings: HashMap::new() }
    }
}

impl Term {
    /// Capture-avoiding substitution of a bound variable by a term.
    /// Returns `Err` if the replacement's type doesn't match the
    /// variable's declared type (spec §4.1 "substitution that would
    /// violate types fails").
    pub fn substitute(&self, index: u32, replacement: &Term) -> Result<Term> {
        match self {
            Term::Var { index: i, ty } => {
                if *i == index {
                    if &replacement.ty() != ty {
                        return Err(TermError::TypeMismatch {
                            expected: format!("{:?}", ty),
                            found: format!("{:?}", replacement.ty()),
                        });
                    }
                    Ok(replacement.clone())
                } else {
                    Ok(self.clone())
                }
            }
            Term::Const { .. } => Ok(self.clone()),
            Term::Apply(f, a) => Ok(Term::apply(
                f.substitute(index, replacement)?,
                a.substitute(index, replacement)?,
            )),
            Term::Abs { var, var_ty, body } => {
                if *var == index {
                    // The binder shadows `index`; nothing to substitute
                    // below it.
                    Ok(self.clone())
                } else {
                    Ok(Term::abs(*var, var_ty.clone(), body.substitute(index, replacement)?))
                }
            }
            Term::MetaApp { meta, args } => {
                let new_args = args
                    .iter()
                    .map(|a| a.substitute(index, replacement))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Term::meta_app(meta.clone(), new_args))
            }
        }
    }

    /// Applies a full [`Substitution`] in one pass.
    pub fn apply_subst(&self, subst: &Substitution) -> Result<Term> {
        let mut result = self.clone();
        for (&index, replacement) in &subst.bindings {
            result = result.substitute(index, replacement)?;
        }
        Ok(result)
    }

    /// Instantiates every meta-application `Z[s1,...,sn]` whose `Z` is
    /// bound in `meta_subst`, substituting the closure's parameters for
    /// the given arguments.
    pub fn instantiate(&self, meta_subst: &MetaSubstitution) -> Result<Term> {
        match self {
            Term::Var { .. } | Term::Const { .. } => Ok(self.clone()),
            Term::Apply(f, a) => {
                Ok(Term::apply(f.instantiate(meta_subst)?, a.instantiate(meta_subst)?))
            }
            Term::Abs { var, var_ty, body } => {
                Ok(Term::abs(*var, var_ty.clone(), body.instantiate(meta_subst)?))
            }
            Term::MetaApp { meta, args } => {
                let new_args = args
                    .iter()
                    .map(|a| a.instantiate(meta_subst))
                    .collect::<Result<Vec<_>>>()?;
                if let Some((params, body)) = meta_subst.bindings.get(&meta.index) {
                    if params.len() != new_args.len() {
                        // Partial instantiation: leave as a meta-application,
                        // still correct as long as the framework never mixes
                        // arities for one meta-variable (spec §3 invariant).
                        return Ok(Term::meta_app(meta.clone(), new_args));
                    }
                    let mut result = body.clone();
                    for (param, arg) in params.iter().zip(new_args.iter()) {
                        result = result.substitute(*param, arg)?;
                    }
                    Ok(result)
                } else {
                    Ok(Term::meta_app(meta.clone(), new_args))
                }
            }
        }
    }

    /// Applies a type substitution throughout the term (spec §4.1).
    pub fn apply_type_subst(&self, subst: &HashMap<u32, Type>) -> Term {
        match self {
            Term::Var { index, ty } => Term::Var { index: *index, ty: ty.apply_subst(subst) },
            Term::Const { name, ty } => Term::Const { name: name.clone(), ty: ty.apply_subst(subst) },
            Term::Apply(f, a) => Term::apply(f.apply_type_subst(subst), a.apply_type_subst(subst)),
            Term::Abs { var, var_ty, body } => {
                Term::abs(*var, var_ty.apply_subst(subst), body.apply_type_subst(subst))
            }
            Term::MetaApp { meta, args } => {
                let new_meta = MetaVar { index: meta.index, name: meta.name.clone(), ty: meta.ty.apply_subst(subst) };
                Term::meta_app(new_meta, args.iter().map(|a| a.apply_type_subst(subst)).collect())
            }
        }
    }

    /// A single beta-step at the root. A no-op (returns the term
    /// unchanged) if the root is not a redex (spec §4.1).
    pub fn beta_step_top(&self) -> Result<Term> {
        match self {
            Term::Apply(f, a) => match f.as_ref() {
                Term::Abs { var, body, .. } => body.substitute(*var, a),
                _ => Ok(self.clone()),
            },
            _ => Ok(self.clone()),
        }
    }

    /// A single beta-step at the given position, recursing to find it.
    /// A no-op if the position is out of range or not a redex.
    pub fn beta_step_at(&self, pos: &[usize]) -> Result<Term> {
        if pos.is_empty() {
            return self.beta_step_top();
        }
        match self {
            Term::Apply(f, a) => match pos[0] {
                0 => Ok(Term::apply(f.beta_step_at(&pos[1..])?, (**a).clone())),
                1 => Ok(Term::apply((**f).clone(), a.beta_step_at(&pos[1..])?)),
                _ => Ok(self.clone()),
            },
            Term::Abs { var, var_ty, body } if pos[0] == 0 => {
                Ok(Term::abs(*var, var_ty.clone(), body.beta_step_at(&pos[1..])?))
            }
            Term::MetaApp { meta, args } => {
                let i = pos[0];
                if i < args.len() {
                    let mut new_args = args.clone();
                    new_args[i] = args[i].beta_step_at(&pos[1..])?;
                    Ok(Term::meta_app(meta.clone(), new_args))
                } else {
                    Ok(self.clone())
                }
            }
            _ => Ok(self.clone()),
        }
    }

    /// Returns the subterm at the given position, or `None` if the
    /// position doesn't exist.
    pub fn subterm_at(&self, pos: &[usize]) -> Option<&Term> {
        if pos.is_empty() {
            return Some(self);
        }
        match self {
            Term::Apply(f, a) => match pos[0] {
                0 => f.subterm_at(&pos[1..]),
                1 => a.subterm_at(&pos[1..]),
                _ => None,
            },
            Term::Abs { body, .. } if pos[0] == 0 => body.subterm_at(&pos[1..]),
            Term::MetaApp { args, .. } => args.get(pos[0]).and_then(|a| a.subterm_at(&pos[1..])),
            _ => None,
        }
    }

    /// Replaces the subterm at the given position with `replacement`.
    /// Returns the original term unchanged if the position doesn't exist.
    pub fn replace_at(&self, pos: &[usize], replacement: &Term) -> Term {
        if pos.is_empty() {
            return replacement.clone();
        }
        match self {
            Term::Apply(f, a) => match pos[0] {
                0 => Term::apply(f.replace_at(&pos[1..], replacement), (**a).clone()),
                1 => Term::apply((**f).clone(), a.replace_at(&pos[1..], replacement)),
                _ => self.clone(),
            },
            Term::Abs { var, var_ty, body } if pos[0] == 0 => {
                Term::abs(*var, var_ty.clone(), body.replace_at(&pos[1..], replacement))
            }
            Term::MetaApp { meta, args } => {
                if let Some(slot) = args.get(pos[0]) {
                    let _ = slot;
                    let mut new_args = args.clone();
                    new_args[pos[0]] = args[pos[0]].replace_at(&pos[1..], replacement);
                    Term::meta_app(meta.clone(), new_args)
                } else {
                    self.clone()
                }
            }
            _ => self.clone(),
        }
    }

    /// All positions of subterms satisfying `pred`, root-to-leaf order.
    pub fn positions_where<'a>(&'a self, pred: &dyn Fn(&Term) -> bool) -> Vec<Position> {
        let mut out = Vec::new();
        self.collect_positions(pred, &mut Vec::new(), &mut out);
        out
    }

    fn collect_positions(&self, pred: &dyn Fn(&Term) -> bool, path: &mut Position, out: &mut Vec<Position>) {
        if pred(self) {
            out.push(path.clone());
        }
        match self {
            Term::Apply(f, a) => {
                path.push(0);
                f.collect_positions(pred, path, out);
                path.pop();
                path.push(1);
                a.collect_positions(pred, path, out);
                path.pop();
            }
            Term::Abs { body, .. } => {
                path.push(0);
                body.collect_positions(pred, path, out);
                path.pop();
            }
            Term::MetaApp { args, .. } => {
                for (i, a) in args.iter().enumerate() {
                    path.push(i);
                    a.collect_positions(pred, path, out);
                    path.pop();
                }
            }
            Term::Var { .. } | Term::Const { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_substitution() {
        // (\x. y)[y := z] = \x. z
        let term = Term::abs(0, o(), Term::var(1, o()));
        let z = Term::constant("z", o());
        let result = term.substitute(1, &z).unwrap();
        match result {
            Term::Abs { var, body, .. } => {
                assert_eq!(var, 0);
                assert_eq!(*body, z);
            }
            _ => panic!("expected abstraction"),
        }
    }

    #[test]
    fn test_beta_step_is_noop_on_non_redex() {
        let term = Term::var(0, o());
        assert_eq!(term.beta_step_top().unwrap(), term);
    }

    #[test]
    fn test_beta_step_top() {
        let body = Term::var(0, o());
        let lambda = Term::abs(0, o(), body);
        let arg = Term::constant("a", o());
        let redex = Term::apply(lambda, arg.clone());
        assert_eq!(redex.beta_step_top().unwrap(), arg);
    }

    #[test]
    fn test_replace_and_subterm_at() {
        let inner = Term::var(0, o());
        let outer = Term::apply(Term::constant("f", Type::arrow(o(), o())), inner.clone());
        assert_eq!(outer.subterm_at(&[1]), Some(&inner));
        let replaced = outer.replace_at(&[1], &Term::constant("c", o()));
        assert_eq!(replaced.subterm_at(&[1]), Some(&Term::constant("c", o())));
    }
}
