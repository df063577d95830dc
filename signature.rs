//! Alphabet: symbol -> declared type, arities, and "upped" `f#` tracking
//! (spec §3 DATA MODEL "Alphabet"). Uses `indexmap::IndexMap` so iteration
//! order matches declaration order wherever it is user-observable (proof
//! text output).

use crate::term::Type;
use indexmap::IndexMap;

/// The two pseudo-heads used by `can_reduce_to` (spec §3), plus ordinary
/// symbol heads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Head {
    Symbol(String),
    Abs,
    Var,
}

#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    types: IndexMap<String, Type>,
    arities: IndexMap<String, usize>,
    /// Symbols that are "upped" (`f#`) tracking dependency-chain heads,
    /// mapped back to their base symbol.
    upped: IndexMap<String, String>,
}

impl Alphabet {
    pub fn new() -> Self {
        Alphabet::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        self.types.insert(name, ty);
    }

    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }

    pub fn set_arity(&mut self, name: impl Into<String>, arity: usize) {
        self.arities.insert(name.into(), arity);
    }

    pub fn arity_of(&self, name: &str) -> usize {
        self.arities.get(name).copied().unwrap_or(0)
    }

    /// Returns the "upped" name `f#` for a defined symbol `f`, declaring
    /// it in the alphabet (same type as `f`, per spec §3) the first time
    /// it is requested.
    pub fn upped_symbol(&mut self, base: &str) -> String {
        if let Some((upped, _)) = self.upped.iter().find(|(_, b)| b.as_str() == base) {
            return upped.clone();
        }
        let upped = format!("{base}#");
        let ty = self.types.get(base).cloned().unwrap_or(Type::base("o"));
        self.types.insert(upped.clone(), ty);
        if let Some(a) = self.arities.get(base).copied() {
            self.arities.insert(upped.clone(), a);
        }
        self.upped.insert(upped.clone(), base.to_string());
        upped
    }

    pub fn is_upped(&self, name: &str) -> bool {
        self.upped.contains_key(name)
    }

    pub fn base_of_upped(&self, name: &str) -> Option<&str> {
        self.upped.get(name).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut sig = Alphabet::new();
        sig.declare("f", Type::arrow(Type::base("o"), Type::base("o")));
        assert!(sig.contains("f"));
        assert_eq!(sig.type_of("f").unwrap().max_arity(), 1);
    }

    #[test]
    fn test_upped_symbol_is_stable() {
        let mut sig = Alphabet::new();
        sig.declare("f", Type::base("o"));
        let u1 = sig.upped_symbol("f");
        let u2 = sig.upped_symbol("f");
        assert_eq!(u1, u2);
        assert_eq!(u1, "f#");
        assert!(sig.is_upped("f#"));
        assert_eq!(sig.base_of_upped("f#"), Some("f"));
    }
}
