//! Greedy policy extraction from a value function.

use crate::error::{Error, Result};
use crate::mdp::model::{Action, CorridorModel};
use crate::mdp::value_iteration::{compute_q_value, ValueFunction};

/// The action to take in each state. The terminal state maps to `None`, the
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy(Vec<Option<Action>>);

impl Policy {
    /// The action chosen in `state`; `Ok(None)` at the terminal state.
    pub fn action(&self, state: usize) -> Result<Option<Action>> {
        self.0.get(state).copied().ok_or(Error::InvalidState {
            state,
            num_states: self.0.len(),
        })
    }

    pub fn as_slice(&self) -> &[Option<Action>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Action>> + '_ {
        self.0.iter().copied()
    }
}

fn check_dimensions(model: &CorridorModel, values: &ValueFunction) -> Result<()> {
    if values.len() == model.num_states() {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: model.num_states(),
            actual: values.len(),
        })
    }
}

/// `Q(state, a)` for every action, in [`Action::ALL`] order.
pub fn q_values(model: &CorridorModel, values: &ValueFunction, state: usize) -> Result<[f64; 2]> {
    check_dimensions(model, values)?;
    model.check_state(state)?;
    let v = values.as_slice();
    Ok(Action::ALL.map(|a| compute_q_value(model, state, a, v)))
}

/// Picks, for every non-terminal state, the action maximizing `Q(s, a)`
/// under `values`.
///
/// Exact ties go to the earliest action in [`Action::ALL`], so
/// [`Action::Decrease`] wins a tie with [`Action::Increase`].
///
/// # Examples
///
/// ```
/// use corridor_mdp::{extract_policy, Action, CorridorModel, ValueIteration};
///
/// let model = CorridorModel::default();
/// let values = ValueIteration::new(&model).solve().unwrap();
/// let policy = extract_policy(&model, &values).unwrap();
///
/// assert_eq!(policy.action(0).unwrap(), Some(Action::Increase));
/// assert_eq!(policy.action(3).unwrap(), None);
/// ```
pub fn extract_policy(model: &CorridorModel, values: &ValueFunction) -> Result<Policy> {
    check_dimensions(model, values)?;
    let v = values.as_slice();

    let mut policy = vec![None; model.num_states()];
    for s in model.non_terminal_states() {
        let mut best_a = Action::ALL[0];
        let mut best_val = f64::NEG_INFINITY;
        for &a in Action::ALL.iter() {
            let q_sa = compute_q_value(model, s, a, v);
            if q_sa > best_val {
                best_val = q_sa;
                best_a = a;
            }
        }
        policy[s] = Some(best_a);
    }

    Ok(Policy(policy))
}
