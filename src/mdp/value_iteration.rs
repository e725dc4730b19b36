//! Value iteration for the corridor MDP.
//!
//! Each sweep applies the Bellman optimality operator
//! `V(s) <- max_a sum_{s'} T(s'|s,a) [R(s,s') + gamma * V(s')]`
//! to every non-terminal state, reading only from a snapshot of the previous
//! sweep (a synchronous update). The terminal state's value is pinned to the
//! goal reward on every sweep. Iteration stops once the largest per-state
//! change drops below `theta`, or when the iteration cap is reached.

use std::ops::Index;

use log::{info, trace, warn};

use crate::error::{Error, Result};
use crate::mdp::model::{Action, CorridorModel};

/// State values, indexed by state.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFunction(Vec<f64>);

impl ValueFunction {
    pub fn get(&self, state: usize) -> Option<f64> {
        self.0.get(state).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for ValueFunction {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Panics if `state` is out of range; [`ValueFunction::get`] is the checked
/// lookup.
impl Index<usize> for ValueFunction {
    type Output = f64;

    fn index(&self, state: usize) -> &f64 {
        &self.0[state]
    }
}

/// How a value iteration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    MaxIterationsReached,
}

/// Outcome of a value iteration run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIterationReport {
    /// Values after the last sweep. Only a fixed point when `status` is
    /// [`SolveStatus::Converged`].
    pub values: ValueFunction,
    /// Number of sweeps performed
    pub iterations: usize,
    /// Sup-norm change of every sweep, in order
    pub deltas: Vec<f64>,
    pub status: SolveStatus,
}

impl ValueIterationReport {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// Change produced by the final sweep, or infinity if no sweep ran.
    pub fn last_delta(&self) -> f64 {
        self.deltas.last().copied().unwrap_or(f64::INFINITY)
    }

    /// The converged values, or [`Error::NotConverged`] carrying the last
    /// table for diagnostics.
    pub fn into_values(self) -> Result<ValueFunction> {
        match self.status {
            SolveStatus::Converged => Ok(self.values),
            SolveStatus::MaxIterationsReached => Err(Error::NotConverged {
                iterations: self.iterations,
                delta: self.last_delta(),
                values: self.values,
            }),
        }
    }
}

/// Value iteration solver bound to one model. Every run owns a fresh value
/// table, so a solver can be run repeatedly.
///
/// The sweep cap starts at [`CorridorModel::max_iterations`].
#[derive(Debug, Clone)]
pub struct ValueIteration<'a> {
    model: &'a CorridorModel,
    max_iterations: usize,
}

impl<'a> ValueIteration<'a> {
    pub fn new(model: &'a CorridorModel) -> Self {
        Self {
            model,
            max_iterations: model.max_iterations(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Runs sweeps until `delta < theta` or the iteration cap is hit.
    ///
    /// # Examples
    ///
    /// ```
    /// use corridor_mdp::{CorridorModel, ValueIteration};
    ///
    /// let model = CorridorModel::default();
    /// let report = ValueIteration::new(&model).run();
    ///
    /// assert!(report.converged());
    /// assert_eq!(report.values[3], 10.0);
    /// assert!(report.values[2] > report.values[1]);
    /// ```
    pub fn run(&self) -> ValueIterationReport {
        let model = self.model;
        let mut values = initial_values(model);
        let mut deltas = Vec::new();
        let mut status = SolveStatus::MaxIterationsReached;

        for iteration in 1..=self.max_iterations {
            let delta = sweep(model, &mut values);
            trace!("value iteration sweep {}: delta {:e}", iteration, delta);
            deltas.push(delta);
            if delta < model.theta() {
                status = SolveStatus::Converged;
                break;
            }
        }

        let iterations = deltas.len();
        match status {
            SolveStatus::Converged => {
                info!("Value iteration converged after {} iterations", iterations)
            }
            SolveStatus::MaxIterationsReached => warn!(
                "Value iteration stopped at the cap of {} iterations (last delta {:e})",
                self.max_iterations,
                deltas.last().copied().unwrap_or(f64::INFINITY)
            ),
        }

        ValueIterationReport {
            values: ValueFunction(values),
            iterations,
            deltas,
            status,
        }
    }

    /// Runs to convergence and returns the optimal values.
    pub fn solve(&self) -> Result<ValueFunction> {
        self.run().into_values()
    }
}

/// Zero everywhere except the terminal state, which holds the goal reward.
fn initial_values(model: &CorridorModel) -> Vec<f64> {
    let mut values = vec![0.0; model.num_states()];
    values[model.terminal_state()] = model.goal_reward();
    values
}

/// One synchronous Bellman sweep. Returns the largest change.
fn sweep(model: &CorridorModel, values: &mut [f64]) -> f64 {
    let snapshot = values.to_vec();
    let mut delta = 0.0_f64;

    for s in model.non_terminal_states() {
        let mut best_val = f64::NEG_INFINITY;
        for &a in Action::ALL.iter() {
            let q_sa = compute_q_value(model, s, a, &snapshot);
            if q_sa > best_val {
                best_val = q_sa;
            }
        }
        values[s] = best_val;
        delta = delta.max((best_val - snapshot[s]).abs());
    }

    values[model.terminal_state()] = model.goal_reward();
    delta
}

/// Compute Q(s, a) = sum_{s'} T(s'|s,a) [ R(s,s') + gamma * V(s') ].
pub(crate) fn compute_q_value(
    model: &CorridorModel,
    s: usize,
    a: Action,
    values: &[f64],
) -> f64 {
    let gamma = model.gamma();
    let mut q = 0.0;
    for t in model.row(s, a) {
        q += t.probability * (t.reward + gamma * values[t.next_state]);
    }
    q
}
