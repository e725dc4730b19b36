//! Transition and reward functions of the corridor.
//!
//! Every public function here validates its state arguments and then reads
//! from the table built in [`CorridorModel::new`], so the probabilities seen by
//! the solver, by [`CorridorModel::transition_probability`] and by the sampler
//! are the same numbers.

use crate::error::Result;
use crate::mdp::model::{Action, CorridorModel, Transition};

impl CorridorModel {
    /// The state an action aims for, clamped to the corridor. The terminal
    /// state is absorbing and maps to itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use corridor_mdp::{Action, CorridorModel};
    ///
    /// let model = CorridorModel::default();
    /// assert_eq!(model.intended_next_state(1, Action::Increase).unwrap(), 2);
    /// assert_eq!(model.intended_next_state(0, Action::Decrease).unwrap(), 0);
    /// assert_eq!(model.intended_next_state(3, Action::Decrease).unwrap(), 3);
    /// ```
    pub fn intended_next_state(&self, state: usize, action: Action) -> Result<usize> {
        self.check_state(state)?;
        Ok(self.clamped_target(state, action))
    }

    /// The outcome distribution of `action` in `state`.
    ///
    /// An unblocked move reaches the intended state with probability `p_move`
    /// and stays put otherwise; the intended outcome is listed first. A move
    /// into a wall, and any action in the terminal state, collapses to a
    /// single certain outcome of staying.
    pub fn transitions(&self, state: usize, action: Action) -> Result<&[Transition]> {
        self.check_state(state)?;
        Ok(self.row(state, action))
    }

    /// `T(next_state | state, action)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use corridor_mdp::{Action, CorridorModel};
    ///
    /// let model = CorridorModel::default();
    /// assert_eq!(model.transition_probability(2, 1, Action::Increase).unwrap(), 0.8);
    /// assert!((model.transition_probability(1, 1, Action::Increase).unwrap() - 0.2).abs() < 1e-12);
    /// // Blocked by the wall: no 80/20 split.
    /// assert_eq!(model.transition_probability(0, 0, Action::Decrease).unwrap(), 1.0);
    /// ```
    pub fn transition_probability(
        &self,
        next_state: usize,
        state: usize,
        action: Action,
    ) -> Result<f64> {
        self.check_state(next_state)?;
        self.check_state(state)?;
        Ok(self
            .row(state, action)
            .iter()
            .filter(|t| t.next_state == next_state)
            .map(|t| t.probability)
            .sum())
    }

    /// `R(state, next_state)`: the step cost, plus the goal bonus when
    /// `next_state` is terminal. The action taken does not matter.
    pub fn reward(&self, state: usize, next_state: usize) -> Result<f64> {
        self.check_state(state)?;
        self.check_state(next_state)?;
        Ok(self.reward_for(next_state))
    }

    fn clamped_target(&self, state: usize, action: Action) -> usize {
        if self.is_terminal(state) {
            return state;
        }
        match action {
            Action::Increase => (state + 1).min(self.num_states() - 1),
            Action::Decrease => state.saturating_sub(1),
        }
    }

    fn reward_for(&self, next_state: usize) -> f64 {
        if self.is_terminal(next_state) {
            self.step_cost() + self.goal_reward()
        } else {
            self.step_cost()
        }
    }

    /// Builds one row of the transition table.
    pub(crate) fn outcomes(&self, state: usize, action: Action) -> Vec<Transition> {
        let intended = self.clamped_target(state, action);
        let stay = Transition {
            next_state: state,
            probability: 1.0,
            reward: self.reward_for(state),
        };
        if intended == state {
            return vec![stay];
        }
        let p_move = self.p_move();
        vec![
            Transition {
                next_state: intended,
                probability: p_move,
                reward: self.reward_for(intended),
            },
            Transition {
                probability: 1.0 - p_move,
                ..stay
            },
        ]
    }
}
