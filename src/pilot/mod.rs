//! Connection pilot: status evaluation and scheduled runs
//!
//! - `evaluator`: the decision procedure for one run
//! - `runner`: wires store, prober, host and sinks together and schedules runs

pub mod evaluator;
pub mod runner;

pub use evaluator::{decide, evaluate, Decision, Evaluation, EvaluationPolicy, RunContext};
pub use runner::{ConnectionPilot, PilotError, PilotStatus, RunReport};
