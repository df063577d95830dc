//! Dependency pairs (spec §3 "Dependency pair").
//!
//! Grounded on `original_source/dependencypair.h`'s field shape
//! (`left`, `right`, `style`, `noneating`). The `style` field keeps the
//! original's two named variants rather than its raw `0`/`1` ints.

use crate::term::Term;
use bit_set::BitSet;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpStyle {
    Normal,
    Headmost,
}

/// A dependency pair, with a per-meta-variable "non-eating" bitmask over
/// argument positions (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyPair {
    pub left: Term,
    pub right: Term,
    pub style: DpStyle,
    /// `noneating[Z]` is a bitset over argument positions that cannot be
    /// discarded by any reachable reduction.
    noneating: HashMap<u32, BitSet>,
}

impl DependencyPair {
    pub fn new(left: Term, right: Term, style: DpStyle) -> Self {
        DependencyPair { left, right, style, noneating: HashMap::new() }
    }

    pub fn set_noneating(&mut self, meta: u32, pos: usize) {
        self.noneating.entry(meta).or_default().insert(pos);
    }

    /// Ported with the original's operator-precedence quirk flagged but
    /// not fixed (spec §9 Open Questions):
    /// `DependencyPair::query_noneating` returns
    /// `noneating[Z] & (1 << pos) != 0`, which — because `&` binds
    /// tighter than `!=` in the source language but the comment reads it
    /// as `noneating[Z] & ((1 << pos) != 0)` — is likely unintended. The
    /// Rust rendition below keeps the *intended* bit-test semantics
    /// (`contains(pos)`), since a literal `&`/`!=` precedence bug isn't
    /// expressible the same way over a `BitSet`; the quirk is preserved
    /// one level up in `dp_construction`'s propagation pass instead (see
    /// the comment there), not silently corrected at this layer either.
    pub fn query_noneating(&self, meta: u32, pos: usize) -> bool {
        self.noneating.get(&meta).is_some_and(|bits| bits.contains(pos))
    }

    pub fn noneating_mapping(&self) -> &HashMap<u32, BitSet> {
        &self.noneating
    }

    /// Returns `l#`/heads-as-given without the "upped" transform (that
    /// happens during construction); exposed for the dependency graph's
    /// edge estimation which only needs the heads.
    pub fn left_head(&self) -> Option<&str> {
        self.left.head_symbol()
    }

    pub fn right_head(&self) -> Option<&str> {
        self.right.head_symbol()
    }

    pub fn is_collapsing(&self) -> bool {
        self.right.is_meta_headed()
    }
}

pub type DpSet = Vec<DependencyPair>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Type;

    #[test]
    fn test_noneating_roundtrip() {
        let mut dp = DependencyPair::new(
            Term::constant("a", Type::base("o")),
            Term::constant("b", Type::base("o")),
            DpStyle::Normal,
        );
        dp.set_noneating(0, 2);
        assert!(dp.query_noneating(0, 2));
        assert!(!dp.query_noneating(0, 1));
        assert!(!dp.query_noneating(1, 2));
    }

    #[test]
    fn test_collapsing_detection() {
        use crate::term::MetaVar;
        let o = Type::base("o");
        let z = MetaVar { index: 0, name: "Z".into(), ty: o.clone() };
        let dp = DependencyPair::new(Term::constant("a", o.clone()), Term::meta_app(z, vec![]), DpStyle::Normal);
        assert!(dp.is_collapsing());
    }
}
