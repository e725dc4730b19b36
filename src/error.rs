//! Error types shared by the corridor solver.

use thiserror::Error;

use crate::mdp::{Action, ValueFunction};

/// Result type for corridor MDP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, solving or simulating a corridor MDP.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A configuration parameter is out of its admissible range.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A transition row does not carry exactly one unit of probability mass.
    #[error("transition probabilities for state {state}, action {action:?} sum to {sum}, not 1.0")]
    MalformedModel {
        state: usize,
        action: Action,
        sum: f64,
    },

    /// A state index outside `0..num_states`.
    #[error("state {state} is out of range for a corridor of {num_states} states")]
    InvalidState { state: usize, num_states: usize },

    /// A value table whose length does not match the state count.
    #[error("expected a value table of {expected} states, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Value iteration hit its iteration cap. `values` is the last sweep's
    /// table and is not a fixed point.
    #[error("value iteration did not converge after {iterations} iterations (last delta {delta:e})")]
    NotConverged {
        iterations: usize,
        delta: f64,
        values: ValueFunction,
    },

    /// The episode already sits at the terminal state.
    #[error("episode is finished at terminal state {state}; reset before stepping")]
    EpisodeFinished { state: usize },
}
