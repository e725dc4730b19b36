//! A noisy one-dimensional corridor modeled as a Markov Decision Process.
//!
//! The agent lives on states `0..N`, one end of which is an absorbing goal.
//! Each step costs `step_cost`; arriving at the goal pays `goal_reward` on
//! top. A move toward either end succeeds with probability `p_move` and
//! otherwise leaves the agent in place; moves into a wall never leave it.
//!
//! [`solve`] runs value iteration and extracts the greedy policy.
//! [`sample_transition`] and [`step_reward`] let a caller play the policy out,
//! and [`Episode`] does the bookkeeping for that.
//!
//! # Examples
//!
//! ```rust
//! use corridor_mdp::{solve, Action, CorridorModel};
//!
//! let model = CorridorModel::default();
//! let (values, policy) = solve(&model).unwrap();
//!
//! assert_eq!(values[3], 10.0);
//! assert!(values[2] > values[1] && values[1] > values[0]);
//! for s in 0..3 {
//!     assert_eq!(policy.action(s).unwrap(), Some(Action::Increase));
//! }
//! ```

pub mod episode;
pub mod model;
pub mod policy;
pub mod sampler;
pub mod transition;
pub mod value_iteration;


pub use episode::{Episode, StepOutcome};
pub use model::{Action, CorridorConfig, CorridorModel, Transition, PROBABILITY_TOLERANCE};
pub use policy::{extract_policy, q_values, Policy};
pub use sampler::sample_transition;
pub use value_iteration::{
    SolveStatus, ValueFunction, ValueIteration, ValueIterationReport,
};

use crate::error::Result;

/// Solves the model: value iteration to convergence, then greedy policy
/// extraction.
pub fn solve(model: &CorridorModel) -> Result<(ValueFunction, Policy)> {
    let values = ValueIteration::new(model).solve()?;
    let policy = extract_policy(model, &values)?;
    Ok((values, policy))
}

/// Reward collected when moving from `state` to `next_state`.
pub fn step_reward(model: &CorridorModel, state: usize, next_state: usize) -> Result<f64> {
    model.reward(state, next_state)
}
