//! Exercises the first-order split's delegation path directly: a wholly
//! first-order system (naturals with `add`) never touches the
//! dependency-pair machinery, so the outcome is entirely down to what
//! the injected `FirstOrderProver` reports.

mod support;

use afsmterm::error::Answer;
use afsmterm::framework::prove_termination;
use afsmterm::policy::Policy;
use afsmterm::reduction_pair::PolynomialInterpretation;
use afsmterm::rule::MatchRule;
use afsmterm::signature::Alphabet;
use afsmterm::term::{Term, Type};
use std::time::Duration;
use support::stub_prover::{FixedAnswerProver, RecordingProver};

fn nat() -> Type {
    Type::base("nat")
}

fn addition_rules() -> (Alphabet, Vec<MatchRule>) {
    let mut sig = Alphabet::new();
    let s_ty = Type::curry([nat()], nat());
    let add_ty = Type::curry([nat(), nat()], nat());
    sig.declare("z", nat());
    sig.declare("s", s_ty.clone());
    sig.declare("add", add_ty.clone());

    let z = Term::constant("z", nat());
    let s = Term::constant("s", s_ty);
    let add = Term::constant("add", add_ty);
    let y = Term::var(0, nat());
    let x = Term::var(1, nat());

    // add(z, Y) -> Y
    let r1 = MatchRule::new(Term::apply_spine(add.clone(), [z.clone(), y.clone()]), y.clone())
        .expect("add(z,Y) -> Y is well-typed");

    // add(s(X), Y) -> s(add(X, Y))
    let r2_left = Term::apply_spine(add.clone(), [Term::apply(s.clone(), x.clone()), y.clone()]);
    let r2_right = Term::apply(s, Term::apply_spine(add, [x, y]));
    let r2 = MatchRule::new(r2_left, r2_right).expect("add's recursive clause is well-typed");

    (sig, vec![r1, r2])
}

#[test]
fn first_order_prover_is_consulted_and_its_yes_is_trusted() {
    let (mut sig, rules) = addition_rules();
    let policy = Policy { rule_removal: false, ..Policy::default() };
    let engine = PolynomialInterpretation::new();
    let prover = RecordingProver::new(Answer::Yes);

    let result = prove_termination(&rules, &mut sig, &policy, &engine, &prover, Duration::from_secs(1));

    assert_eq!(result.answer, Answer::Yes);
    assert_eq!(prover.calls(), 1);
    assert_eq!(prover.last_rule_count(), 2);
}

#[test]
fn first_order_prover_no_fails_the_whole_system() {
    let (mut sig, rules) = addition_rules();
    let policy = Policy { rule_removal: false, ..Policy::default() };
    let engine = PolynomialInterpretation::new();
    let prover = FixedAnswerProver(Answer::No);

    let result = prove_termination(&rules, &mut sig, &policy, &engine, &prover, Duration::from_secs(1));

    assert_eq!(result.answer, Answer::No);
}

#[test]
fn first_order_prover_giving_up_downgrades_to_maybe() {
    let (mut sig, rules) = addition_rules();
    let policy = Policy { rule_removal: false, ..Policy::default() };
    let engine = PolynomialInterpretation::new();
    let prover = FixedAnswerProver(Answer::Maybe);

    let result = prove_termination(&rules, &mut sig, &policy, &engine, &prover, Duration::from_secs(1));

    assert_eq!(result.answer, Answer::Maybe);
}
