//! Surface-syntax parsers (spec §6 "Input formats"). The driver
//! dispatches by file extension or an explicit `--format` flag.

pub mod afs;
pub mod afsm;
pub mod ari;
pub mod atrs;
pub mod fo_trs;
pub mod xml;

use crate::error::ParseError;
use crate::rule::Ruleset;
use crate::signature::Alphabet;

/// A parsed input system: the declared alphabet and its rules.
#[derive(Debug, Clone)]
pub struct ParsedSystem {
    pub signature: Alphabet,
    pub rules: Ruleset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Afsm,
    Afs,
    Atrs,
    Ari,
    Xml,
    FirstOrderTrs,
}

impl Format {
    /// Detects a format from a file name's extension (spec §6: "dispatch
    /// by file extension or an explicit flag").
    pub fn detect(path: &str) -> Option<Format> {
        let ext = path.rsplit('.').next()?;
        match ext {
            "afsm" => Some(Format::Afsm),
            "afs" => Some(Format::Afs),
            "atrs" => Some(Format::Atrs),
            "ari" => Some(Format::Ari),
            "xml" => Some(Format::Xml),
            "trs" => Some(Format::FirstOrderTrs),
            _ => None,
        }
    }

    pub fn from_flag(name: &str) -> Option<Format> {
        match name {
            "afsm" => Some(Format::Afsm),
            "afs" => Some(Format::Afs),
            "atrs" => Some(Format::Atrs),
            "ari" => Some(Format::Ari),
            "xml" => Some(Format::Xml),
            "trs" | "fo" | "firstorder" => Some(Format::FirstOrderTrs),
            _ => None,
        }
    }
}

/// Dispatches to the appropriate parser (spec §7: parse errors cause the
/// driver to skip the file and continue, so this returns a `Result`
/// rather than panicking).
pub fn parse(format: Format, text: &str) -> Result<ParsedSystem, ParseError> {
    match format {
        Format::Afsm => afsm::parse(text),
        Format::Afs => afs::parse(text),
        Format::Atrs => atrs::parse(text),
        Format::Ari => ari::parse(text),
        Format::Xml => xml::parse(text),
        Format::FirstOrderTrs => fo_trs::parse(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(Format::detect("system.afsm"), Some(Format::Afsm));
        assert_eq!(Format::detect("system.trs"), Some(Format::FirstOrderTrs));
        assert_eq!(Format::detect("noext"), None);
    }
}
