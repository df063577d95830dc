//! Term and type model for Algebraic Functional Systems with Meta-variables
//! (AFSMs). See spec §3 DATA MODEL.
//!
//! Five variants: bound variable, constant, application, abstraction,
//! meta-application — a simply-typed lambda term extended with the
//! meta-variables that rewrite rules pattern-match against.

pub mod subst;
pub mod unify;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A type: either a named base sort, a function type, or (for
/// polymorphic readers such as ATRS-with-inference) a type variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Base(String),
    Arrow(Box<Type>, Box<Type>),
    Var(u32),
}

impl Type {
    pub fn base(name: impl Into<String>) -> Self {
        Type::Base(name.into())
    }

    pub fn arrow(domain: Type, codomain: Type) -> Self {
        Type::Arrow(Box::new(domain), Box::new(codomain))
    }

    /// Curried function type with a fixed output.
    pub fn curry(args: impl IntoIterator<Item = Type>, output: Type) -> Self {
        let mut args: Vec<Type> = args.into_iter().collect();
        let mut result = output;
        while let Some(arg) = args.pop() {
            result = Type::arrow(arg, result);
        }
        result
    }

    /// Splits a (possibly curried) function type into its argument types
    /// and final output type.
    pub fn uncurry(&self) -> (Vec<&Type>, &Type) {
        let mut args = Vec::new();
        let mut cur = self;
        while let Type::Arrow(dom, cod) = cur {
            args.push(dom.as_ref());
            cur = cod.as_ref();
        }
        (args, cur)
    }

    /// Maximum number of curried arguments this type can be applied to.
    pub fn max_arity(&self) -> usize {
        self.uncurry().0.len()
    }

    pub fn output(&self) -> &Type {
        self.uncurry().1
    }

    pub fn is_base(&self) -> bool {
        matches!(self.output(), Type::Base(_)) && matches!(self, Type::Base(_))
    }

    pub fn contains_var(&self) -> bool {
        match self {
            Type::Base(_) => false,
            Type::Var(_) => true,
            Type::Arrow(d, c) => d.contains_var() || c.contains_var(),
        }
    }

    /// Applies a type substitution (type-variable index -> type).
    pub fn apply_subst(&self, subst: &std::collections::HashMap<u32, Type>) -> Type {
        match self {
            Type::Base(b) => Type::Base(b.clone()),
            Type::Var(v) => subst.get(v).cloned().unwrap_or_else(|| Type::Var(*v)),
            Type::Arrow(d, c) => Type::arrow(d.apply_subst(subst), c.apply_subst(subst)),
        }
    }
}

/// A typed meta-variable: an identity (index) plus its declared type,
/// which for an AFSM meta-variable is the type of `Z[x1,...,xn]` given
/// its `n` arguments, i.e. `dom1 -> ... -> domn -> out`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaVar {
    pub index: u32,
    pub name: String,
    pub ty: Type,
}

/// A term in the AFSM calculus (spec §3 DATA MODEL "Term").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A bound variable, identified by a numeric de Bruijn-style index.
    Var { index: u32, ty: Type },
    /// A constant (function symbol) with a name and type.
    Const { name: String, ty: Type },
    /// Application `s t`.
    Apply(Box<Term>, Box<Term>),
    /// Abstraction `\x:tau.s`. `var` is the binder's fresh index.
    Abs { var: u32, var_ty: Type, body: Box<Term> },
    /// Meta-application `Z[s1,...,sn]`.
    MetaApp { meta: MetaVar, args: Vec<Term> },
}

impl Term {
    pub fn var(index: u32, ty: Type) -> Self {
        Term::Var { index, ty }
    }

    pub fn constant(name: impl Into<String>, ty: Type) -> Self {
        Term::Const { name: name.into(), ty }
    }

    pub fn apply(func: Term, arg: Term) -> Self {
        Term::Apply(Box::new(func), Box::new(arg))
    }

    /// Applies `func` to a whole spine of arguments, left to right.
    pub fn apply_spine(func: Term, args: impl IntoIterator<Item = Term>) -> Self {
        args.into_iter().fold(func, Term::apply)
    }

    pub fn abs(var: u32, var_ty: Type, body: Term) -> Self {
        Term::Abs { var, var_ty, body: Box::new(body) }
    }

    pub fn meta_app(meta: MetaVar, args: Vec<Term>) -> Self {
        Term::MetaApp { meta, args }
    }

    /// The type this term carries, derived compositionally (spec §3:
    /// "Every term carries a type").
    pub fn ty(&self) -> Type {
        match self {
            Term::Var { ty, .. } | Term::Const { ty, .. } => ty.clone(),
            Term::Apply(func, _) => match func.ty() {
                Type::Arrow(_, cod) => *cod,
                other => other,
            },
            Term::Abs { var_ty, body, .. } => Type::arrow(var_ty.clone(), body.ty()),
            Term::MetaApp { meta, args } => {
                let (domains, output) = meta.ty.uncurry();
                if args.len() >= domains.len() {
                    output.clone()
                } else {
                    Type::curry(domains[args.len()..].iter().map(|t| (*t).clone()), output.clone())
                }
            }
        }
    }

    /// Splits an applicative spine `f s1 ... sn` into head + argument
    /// list (spec §4.1).
    pub fn spine(&self) -> (&Term, Vec<&Term>) {
        let mut args = Vec::new();
        let mut cur = self;
        while let Term::Apply(func, arg) = cur {
            args.push(arg.as_ref());
            cur = func.as_ref();
        }
        args.reverse();
        (cur, args)
    }

    /// The head symbol's name, if the term is headed by a constant.
    pub fn head_symbol(&self) -> Option<&str> {
        match self.spine().0 {
            Term::Const { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Whether this term's spine head is a meta-variable.
    pub fn is_meta_headed(&self) -> bool {
        matches!(self.spine().0, Term::MetaApp { .. })
    }

    pub fn is_abstraction(&self) -> bool {
        matches!(self, Term::Abs { .. })
    }

    /// Free (bound-)variables, collected by index.
    pub fn free_vars(&self) -> BTreeSet<u32> {
        let mut acc = BTreeSet::new();
        self.collect_free_vars(&mut acc);
        acc
    }

    fn collect_free_vars(&self, acc: &mut BTreeSet<u32>) {
        match self {
            Term::Var { index, .. } => {
                acc.insert(*index);
            }
            Term::Const { .. } => {}
            Term::Apply(f, a) => {
                f.collect_free_vars(acc);
                a.collect_free_vars(acc);
            }
            Term::Abs { var, body, .. } => {
                let mut inner = BTreeSet::new();
                body.collect_free_vars(&mut inner);
                inner.remove(var);
                acc.extend(inner);
            }
            Term::MetaApp { args, .. } => {
                for a in args {
                    a.collect_free_vars(acc);
                }
            }
        }
    }

    /// Free meta-variables, collected by index.
    pub fn free_meta_vars(&self) -> BTreeSet<u32> {
        let mut acc = BTreeSet::new();
        self.collect_free_meta_vars(&mut acc);
        acc
    }

    fn collect_free_meta_vars(&self, acc: &mut BTreeSet<u32>) {
        match self {
            Term::Var { .. } | Term::Const { .. } => {}
            Term::Apply(f, a) => {
                f.collect_free_meta_vars(acc);
                a.collect_free_meta_vars(acc);
            }
            Term::Abs { body, .. } => body.collect_free_meta_vars(acc),
            Term::MetaApp { meta, args } => {
                acc.insert(meta.index);
                for a in args {
                    a.collect_free_meta_vars(acc);
                }
            }
        }
    }

    /// Whether this term is a β-redex at the top (an abstraction applied
    /// to an argument).
    pub fn is_redex(&self) -> bool {
        matches!(self, Term::Apply(f, _) if matches!(f.as_ref(), Term::Abs { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    TypeMismatch { expected: String, found: String },
    UnboundVariable(u32),
    NotARedex,
}

impl std::fmt::Display for TermError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            TermError::UnboundVariable(i) => write!(f, "unbound variable index {i}"),
            TermError::NotARedex => write!(f, "term is not a beta-redex"),
        }
    }
}

impl std::error::Error for TermError {}

pub type Result<T> = std::result::Result<T, TermError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn o() -> Type {
        Type::base("o")
    }

    #[test]
    fn test_term_creation() {
        let term = Term::abs(0, o(), Term::var(0, o()));
        match term {
            Term::Abs { var, var_ty, body } => {
                assert_eq!(var, 0);
                assert_eq!(var_ty, o());
                assert_eq!(*body, Term::var(0, o()));
            }
            _ => panic!("expected abstraction"),
        }
    }

    #[test]
    fn test_type_creation() {
        let ty = Type::arrow(o(), o());
        match ty {
            Type::Arrow(domain, codomain) => {
                assert_eq!(*domain, o());
                assert_eq!(*codomain, o());
            }
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn test_free_vars() {
        // \x. y x, with y free at index 1
        let term = Term::abs(0, o(), Term::apply(Term::var(1, o()), Term::var(0, o())));
        let free = term.free_vars();
        assert_eq!(free, BTreeSet::from([1]));
    }

    #[test]
    fn test_spine_split() {
        let f = Term::constant("f", Type::curry([o(), o()], o()));
        let applied = Term::apply_spine(f.clone(), [Term::var(0, o()), Term::var(1, o())]);
        let (head, args) = applied.spine();
        assert_eq!(head, &f);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_arity_and_output() {
        let ty = Type::curry([o(), o(), o()], o());
        assert_eq!(ty.max_arity(), 3);
        assert_eq!(ty.output(), &o());
    }
}
