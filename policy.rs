//! `Policy`: gathers the many boolean feature flags from the original
//! implementation into one record (spec §9 DESIGN NOTES "Many boolean
//! feature flags"), populated from the CLI `--disable=<csv>` flag.

/// Disabled-by-default set; constructing via [`Policy::default`] enables
/// everything, matching the original's `allow_*` fields defaulting to
/// `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub graph: bool,
    pub subcrit: bool,
    pub static_subcrit: bool,
    pub formative: bool,
    pub usable: bool,
    pub formative_wrt: bool,
    pub usable_wrt: bool,
    pub polynomials: bool,
    pub product_polynomials: bool,
    pub horpo: bool,
    pub nontermination: bool,
    pub rule_removal: bool,
    pub abstraction_simple: bool,
    pub local: bool,
    pub r#static: bool,
    pub dynamic: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            graph: true,
            subcrit: true,
            static_subcrit: true,
            formative: true,
            usable: true,
            formative_wrt: true,
            usable_wrt: true,
            polynomials: true,
            product_polynomials: true,
            horpo: true,
            nontermination: true,
            rule_removal: true,
            abstraction_simple: true,
            local: true,
            r#static: true,
            dynamic: true,
        }
    }
}

impl Policy {
    /// Parses the `--disable=<csv>` flag's tokens (spec §6): `nt rem rr
    /// dp sc static dynamic poly pprod horpo ur fr local graph uwrt
    /// fwrt`.
    pub fn from_disable_csv(csv: &str) -> Self {
        let mut policy = Policy::default();
        for token in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            policy.disable(token);
        }
        policy
    }

    pub fn disable(&mut self, token: &str) {
        match token {
            "nt" => self.nontermination = false,
            "rem" | "rr" => self.rule_removal = false,
            "dp" => {
                self.r#static = false;
                self.dynamic = false;
            }
            "sc" => self.subcrit = false,
            "static" => self.r#static = false,
            "dynamic" => self.dynamic = false,
            "poly" => self.polynomials = false,
            "pprod" => self.product_polynomials = false,
            "horpo" => self.horpo = false,
            "ur" => self.usable = false,
            "fr" => self.formative = false,
            "local" => self.local = false,
            "graph" => self.graph = false,
            "uwrt" => self.usable_wrt = false,
            "fwrt" => self.formative_wrt = false,
            other => log::warn!("unknown --disable token: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_everything() {
        let p = Policy::default();
        assert!(p.graph && p.subcrit && p.horpo && p.nontermination);
    }

    #[test]
    fn test_disable_csv() {
        let p = Policy::from_disable_csv("nt,horpo, graph");
        assert!(!p.nontermination);
        assert!(!p.horpo);
        assert!(!p.graph);
        assert!(p.subcrit);
    }

    #[test]
    fn test_dp_disables_both_flavours() {
        let p = Policy::from_disable_csv("dp");
        assert!(!p.r#static);
        assert!(!p.dynamic);
    }
}
