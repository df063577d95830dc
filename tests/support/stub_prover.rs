//! Test-only stub implementations of `FirstOrderProver` (spec §9 "the
//! test suite stubs this"), for exercising the first-order split path
//! without shelling out to a real external prover binary.

use afsmterm::error::Answer;
use afsmterm::first_order::FirstOrderProver;
use afsmterm::rule::Ruleset;
use std::cell::Cell;
use std::time::Duration;

/// Always answers the same fixed verdict, regardless of input.
pub struct FixedAnswerProver(pub Answer);

impl FirstOrderProver for FixedAnswerProver {
    fn prove(&self, _rules: &Ruleset, _timeout: Duration) -> Answer {
        self.0.clone()
    }
}

/// Records how many times it was consulted and how many rules it last
/// saw, so a test can assert the first-order split actually delegated a
/// non-empty first-order part rather than the stub going unused.
pub struct RecordingProver {
    answer: Answer,
    calls: Cell<u32>,
    last_rule_count: Cell<usize>,
}

impl RecordingProver {
    pub fn new(answer: Answer) -> Self {
        RecordingProver { answer, calls: Cell::new(0), last_rule_count: Cell::new(0) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn last_rule_count(&self) -> usize {
        self.last_rule_count.get()
    }
}

impl FirstOrderProver for RecordingProver {
    fn prove(&self, rules: &Ruleset, _timeout: Duration) -> Answer {
        self.calls.set(self.calls.get() + 1);
        self.last_rule_count.set(rules.len());
        self.answer.clone()
    }
}
