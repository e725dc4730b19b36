//! Corridor model definition: states, actions, parameters and the
//! precomputed transition table.
//!
//! States are the indices `0..num_states` of a linear corridor. One end of the
//! corridor is the absorbing goal; every other state offers two moves, each of
//! which succeeds with probability `p_move` and otherwise leaves the agent in
//! place.

use std::ops::Range;

use approx::abs_diff_eq;
use log::debug;

use crate::error::{Error, Result};

/// Tolerance used when checking that a transition row sums to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A move along the corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Move toward index 0.
    Decrease,
    /// Move toward index `num_states - 1`.
    Increase,
}

impl Action {
    /// Every action in enumeration order. Greedy policy extraction breaks
    /// exact ties in favour of the earlier entry.
    pub const ALL: [Action; 2] = [Action::Decrease, Action::Increase];

    /// Position of the action in [`Action::ALL`].
    pub fn index(self) -> usize {
        match self {
            Action::Decrease => 0,
            Action::Increase => 1,
        }
    }
}

/// Tunable parameters of a corridor MDP.
///
/// The default is the reference hallway: four states, goal at state 3,
/// `gamma = 0.9`, `theta = 1e-6`, an 80% chance that a move succeeds, a step
/// cost of -1 and a goal bonus of +10.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorConfig {
    /// Number of states in the corridor
    pub num_states: usize,
    /// Index of the absorbing goal state, either `0` or `num_states - 1`
    pub terminal_state: usize,
    /// Discount factor (0 <= gamma < 1)
    pub gamma: f64,
    /// Convergence threshold on the per-sweep sup-norm change (theta > 0)
    pub theta: f64,
    /// Probability that an unblocked move reaches its intended state
    pub p_move: f64,
    /// Reward received on every transition
    pub step_cost: f64,
    /// Bonus added when a transition lands on the terminal state
    pub goal_reward: f64,
    /// Cap on value iteration sweeps. `None` derives a cap from the
    /// contraction bound, see [`CorridorModel::max_iterations`].
    pub max_iterations: Option<usize>,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            num_states: 4,
            terminal_state: 3,
            gamma: 0.9,
            theta: 1e-6,
            p_move: 0.8,
            step_cost: -1.0,
            goal_reward: 10.0,
            max_iterations: None,
        }
    }
}

impl CorridorConfig {
    /// Sets the corridor length and places the goal at the far end.
    pub fn with_num_states(mut self, num_states: usize) -> Self {
        self.num_states = num_states;
        self.terminal_state = num_states.saturating_sub(1);
        self
    }

    pub fn with_terminal_state(mut self, terminal_state: usize) -> Self {
        self.terminal_state = terminal_state;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_p_move(mut self, p_move: f64) -> Self {
        self.p_move = p_move;
        self
    }

    pub fn with_step_cost(mut self, step_cost: f64) -> Self {
        self.step_cost = step_cost;
        self
    }

    pub fn with_goal_reward(mut self, goal_reward: f64) -> Self {
        self.goal_reward = goal_reward;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Checks every parameter, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        ensure(
            self.num_states >= 2,
            "num_states",
            self.num_states as f64,
            "a corridor needs at least two states",
        )?;
        ensure(
            self.terminal_state == 0 || self.terminal_state == self.num_states - 1,
            "terminal_state",
            self.terminal_state as f64,
            "the terminal state must sit at one end of the corridor",
        )?;
        ensure(
            self.gamma.is_finite() && (0.0..1.0).contains(&self.gamma),
            "gamma",
            self.gamma,
            "the discount factor must lie in [0, 1)",
        )?;
        ensure(
            self.theta.is_finite() && self.theta > 0.0,
            "theta",
            self.theta,
            "the convergence threshold must be positive",
        )?;
        ensure(
            self.p_move.is_finite() && (0.0..=1.0).contains(&self.p_move),
            "p_move",
            self.p_move,
            "the move success probability must lie in [0, 1]",
        )?;
        ensure(
            self.step_cost.is_finite(),
            "step_cost",
            self.step_cost,
            "the step cost must be finite",
        )?;
        ensure(
            self.goal_reward.is_finite(),
            "goal_reward",
            self.goal_reward,
            "the goal reward must be finite",
        )?;
        match self.max_iterations {
            Some(cap) => ensure(
                cap >= 1,
                "max_iterations",
                cap as f64,
                "the iteration cap must allow at least one sweep",
            ),
            None => Ok(()),
        }
    }

    /// Validates the parameters and builds the model.
    pub fn build(self) -> Result<CorridorModel> {
        CorridorModel::new(self)
    }
}

fn ensure(condition: bool, name: &'static str, value: f64, reason: &'static str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value,
            reason,
        })
    }
}

/// One outcome of taking an action: the state reached, its probability and
/// the reward collected on the way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next_state: usize,
    pub probability: f64,
    pub reward: f64,
}

/// A validated corridor MDP.
///
/// `transitions[s][a]` holds the outcomes of action `a` (indexed by
/// [`Action::index`]) in state `s`. Unblocked moves list the intended state
/// first. The table is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorModel {
    config: CorridorConfig,
    transitions: Vec<Vec<Vec<Transition>>>,
}

impl Default for CorridorModel {
    fn default() -> Self {
        Self::assemble(CorridorConfig::default())
    }
}

impl CorridorModel {
    /// Validates `config`, builds the transition table and checks that every
    /// row carries a unit of probability mass.
    ///
    /// # Examples
    ///
    /// ```
    /// use corridor_mdp::{CorridorConfig, CorridorModel, Error};
    ///
    /// let model = CorridorModel::new(CorridorConfig::default().with_num_states(6)).unwrap();
    /// assert_eq!(model.terminal_state(), 5);
    ///
    /// let err = CorridorModel::new(CorridorConfig::default().with_gamma(1.0)).unwrap_err();
    /// assert!(matches!(err, Error::InvalidParameter { name: "gamma", .. }));
    /// ```
    pub fn new(config: CorridorConfig) -> Result<Self> {
        config.validate()?;
        let model = Self::assemble(config);
        check_rows(&model.transitions)?;
        debug!(
            "built corridor model: {} states, terminal {}, gamma {}, p_move {}",
            model.config.num_states, model.config.terminal_state, model.config.gamma, model.config.p_move
        );
        Ok(model)
    }

    fn assemble(config: CorridorConfig) -> Self {
        let mut model = Self {
            config,
            transitions: Vec::new(),
        };
        let transitions: Vec<Vec<Vec<Transition>>> = model
            .states()
            .map(|s| {
                Action::ALL
                    .iter()
                    .map(|&a| model.outcomes(s, a))
                    .collect()
            })
            .collect();
        model.transitions = transitions;
        model
    }

    pub fn config(&self) -> &CorridorConfig {
        &self.config
    }

    pub fn num_states(&self) -> usize {
        self.config.num_states
    }

    pub fn terminal_state(&self) -> usize {
        self.config.terminal_state
    }

    pub fn gamma(&self) -> f64 {
        self.config.gamma
    }

    pub fn theta(&self) -> f64 {
        self.config.theta
    }

    pub fn p_move(&self) -> f64 {
        self.config.p_move
    }

    pub fn step_cost(&self) -> f64 {
        self.config.step_cost
    }

    pub fn goal_reward(&self) -> f64 {
        self.config.goal_reward
    }

    /// Sweep cap for value iteration: the configured cap, or else
    /// [`CorridorModel::convergence_bound`].
    pub fn max_iterations(&self) -> usize {
        self.config
            .max_iterations
            .unwrap_or_else(|| self.convergence_bound())
    }

    /// Number of sweeps after which value iteration is guaranteed to have
    /// stopped, plus a small margin.
    ///
    /// The first sweep changes no value by more than
    /// `span = 2 (|step_cost| + |goal_reward|)`, and each later sweep shrinks
    /// the change by at least `gamma`. So `delta_k < theta` once
    /// `gamma^(k-1) * span < theta`.
    pub fn convergence_bound(&self) -> usize {
        const MARGIN: usize = 10;
        let span = 2.0 * (self.step_cost().abs() + self.goal_reward().abs());
        let gamma = self.gamma();
        if gamma == 0.0 || span < self.theta() {
            return 1 + MARGIN;
        }
        let sweeps = ((self.theta() / span).ln() / gamma.ln()).ceil();
        sweeps as usize + 1 + MARGIN
    }

    /// All state indices, in order.
    pub fn states(&self) -> Range<usize> {
        0..self.config.num_states
    }

    /// All states except the terminal one, in order.
    pub fn non_terminal_states(&self) -> impl Iterator<Item = usize> + '_ {
        self.states().filter(move |&s| !self.is_terminal(s))
    }

    pub fn is_terminal(&self, state: usize) -> bool {
        state == self.config.terminal_state
    }

    /// The action that points toward the goal.
    pub fn toward_goal(&self) -> Action {
        if self.config.terminal_state == 0 {
            Action::Decrease
        } else {
            Action::Increase
        }
    }

    pub(crate) fn check_state(&self, state: usize) -> Result<()> {
        if state < self.config.num_states {
            Ok(())
        } else {
            Err(Error::InvalidState {
                state,
                num_states: self.config.num_states,
            })
        }
    }

    pub(crate) fn row(&self, state: usize, action: Action) -> &[Transition] {
        &self.transitions[state][action.index()]
    }
}

/// Rejects any row whose probabilities leave `[0, 1]` or do not sum to one.
pub(crate) fn check_rows(transitions: &[Vec<Vec<Transition>>]) -> Result<()> {
    for (state, row) in transitions.iter().enumerate() {
        for (&action, outcomes) in Action::ALL.iter().zip(row) {
            let sum: f64 = outcomes.iter().map(|t| t.probability).sum();
            let in_range = outcomes
                .iter()
                .all(|t| (0.0..=1.0).contains(&t.probability));
            if !in_range || !abs_diff_eq!(sum, 1.0, epsilon = PROBABILITY_TOLERANCE) {
                return Err(Error::MalformedModel { state, action, sum });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_reference_hallway() {
        let model = CorridorModel::default();
        assert_eq!(model.num_states(), 4);
        assert_eq!(model.terminal_state(), 3);
        assert_eq!(model.gamma(), 0.9);
        assert_eq!(model.theta(), 1e-6);
        assert_eq!(model.p_move(), 0.8);
        assert_eq!(model.step_cost(), -1.0);
        assert_eq!(model.goal_reward(), 10.0);
        assert_eq!(model, CorridorModel::new(CorridorConfig::default()).unwrap());
    }

    #[test]
    fn test_non_terminal_states() {
        let model = CorridorModel::default();
        let states: Vec<usize> = model.non_terminal_states().collect();
        assert_eq!(states, vec![0, 1, 2]);

        let mirrored = CorridorConfig::default()
            .with_terminal_state(0)
            .build()
            .unwrap();
        let states: Vec<usize> = mirrored.non_terminal_states().collect();
        assert_eq!(states, vec![1, 2, 3]);
        assert_eq!(mirrored.toward_goal(), Action::Decrease);
    }

    #[test]
    fn test_with_num_states_moves_goal_to_far_end() {
        let config = CorridorConfig::default().with_num_states(7);
        assert_eq!(config.terminal_state, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let cases = [
            (CorridorConfig::default().with_num_states(1), "num_states"),
            (CorridorConfig::default().with_terminal_state(1), "terminal_state"),
            (CorridorConfig::default().with_terminal_state(4), "terminal_state"),
            (CorridorConfig::default().with_gamma(1.0), "gamma"),
            (CorridorConfig::default().with_gamma(-0.1), "gamma"),
            (CorridorConfig::default().with_gamma(f64::NAN), "gamma"),
            (CorridorConfig::default().with_theta(0.0), "theta"),
            (CorridorConfig::default().with_p_move(1.2), "p_move"),
            (CorridorConfig::default().with_p_move(-0.2), "p_move"),
            (CorridorConfig::default().with_step_cost(f64::INFINITY), "step_cost"),
            (CorridorConfig::default().with_goal_reward(f64::NAN), "goal_reward"),
            (CorridorConfig::default().with_max_iterations(0), "max_iterations"),
        ];
        for (config, expected) in cases {
            match CorridorModel::new(config) {
                Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_max_iterations_configured_or_derived() {
        let model = CorridorModel::default();
        assert_eq!(model.max_iterations(), model.convergence_bound());
        // ln(1e-6 / 22) / ln(0.9) rounds up to 161.
        assert_eq!(model.convergence_bound(), 161 + 1 + 10);

        let capped = CorridorConfig::default()
            .with_max_iterations(25)
            .build()
            .unwrap();
        assert_eq!(capped.max_iterations(), 25);

        let myopic = CorridorConfig::default().with_gamma(0.0).build().unwrap();
        assert_eq!(myopic.convergence_bound(), 11);
    }

    #[test]
    fn test_convergence_bound_grows_with_gamma() {
        let mut previous = 0;
        for gamma in [0.5, 0.9, 0.99, 0.999] {
            let model = CorridorConfig::default().with_gamma(gamma).build().unwrap();
            let bound = model.convergence_bound();
            assert!(bound > previous);
            previous = bound;
        }
    }

    #[test]
    fn test_malformed_rows_rejected() {
        let transitions = vec![vec![
            vec![Transition {
                next_state: 0,
                probability: 1.0,
                reward: 0.0,
            }],
            vec![Transition {
                next_state: 0,
                probability: 0.5,
                reward: 0.0,
            }],
        ]];
        let err = check_rows(&transitions).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedModel {
                state: 0,
                action: Action::Increase,
                sum: 0.5,
            }
        );
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        // Sums to one but carries negative mass.
        let transitions = vec![vec![
            vec![
                Transition {
                    next_state: 1,
                    probability: 1.2,
                    reward: 0.0,
                },
                Transition {
                    next_state: 0,
                    probability: -0.2,
                    reward: 0.0,
                },
            ],
            vec![Transition {
                next_state: 0,
                probability: 1.0,
                reward: 0.0,
            }],
        ]];
        assert!(matches!(
            check_rows(&transitions),
            Err(Error::MalformedModel {
                state: 0,
                action: Action::Decrease,
                ..
            })
        ));
    }

    #[test]
    fn test_check_state() {
        let model = CorridorModel::default();
        assert!(model.check_state(3).is_ok());
        assert_eq!(
            model.check_state(4),
            Err(Error::InvalidState {
                state: 4,
                num_states: 4
            })
        );
    }
}
