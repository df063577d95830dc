pub mod stub_prover;
