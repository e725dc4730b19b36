//! Stochastic execution of a single move.

use rand::Rng;

use crate::error::Result;
use crate::mdp::model::{Action, CorridorModel, Transition};

/// Draws the state reached by taking `action` in `state`.
///
/// Samples by inverse transform over the same outcome row the solver uses
/// ([`CorridorModel::transitions`]): a uniform `u` in `[0, 1)` selects the
/// first outcome whose cumulative probability exceeds it. The intended state
/// comes first, so it is chosen exactly when `u < p_move`. The random source
/// is supplied by the caller.
///
/// # Examples
///
/// ```
/// use corridor_mdp::{sample_transition, Action, CorridorModel};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let model = CorridorModel::default();
/// let mut rng = ChaCha20Rng::seed_from_u64(7);
///
/// let next = sample_transition(&model, 1, Action::Increase, &mut rng).unwrap();
/// assert!(next == 1 || next == 2);
///
/// // Walking into the wall never moves the agent.
/// assert_eq!(sample_transition(&model, 0, Action::Decrease, &mut rng).unwrap(), 0);
/// ```
pub fn sample_transition<R: Rng + ?Sized>(
    model: &CorridorModel,
    state: usize,
    action: Action,
    rng: &mut R,
) -> Result<usize> {
    let outcomes = model.transitions(state, action)?;
    let u: f64 = rng.gen();
    Ok(select_outcome(outcomes, u, state))
}

fn select_outcome(outcomes: &[Transition], u: f64, state: usize) -> usize {
    let mut cumulative = 0.0;
    for t in outcomes {
        cumulative += t.probability;
        if u < cumulative {
            return t.next_state;
        }
    }
    // Rounding can leave the cumulative mass a hair below one.
    outcomes.last().map_or(state, |t| t.next_state)
}
