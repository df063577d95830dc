//! Rule analysis ("rules manipulator", spec §4.2). Classifies rules,
//! computes arities, eta-expansion, beta-saturation, formative/usable
//! rule restriction helpers, and encoded-application simplification.
//!
//! Grounded on `original_source/src/rulesmanipulator.cpp`/`.h`.

pub mod encoded_application;
pub mod pfp;
pub mod properties;
pub mod saturation;

pub use properties::RuleProperties;
