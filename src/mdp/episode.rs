//! Episode bookkeeping for running a policy through the corridor.
//!
//! An episode tracks the agent's current state, the number of steps taken
//! and the reward collected so far. It only changes through sampled
//! transitions.

use log::debug;
use rand::Rng;

use crate::error::{Error, Result};
use crate::mdp::model::{Action, CorridorModel};
use crate::mdp::policy::Policy;
use crate::mdp::sampler::sample_transition;

/// Record of a single step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub from: usize,
    pub action: Action,
    pub to: usize,
    pub reward: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    state: usize,
    steps: usize,
    total_reward: f64,
}

impl Episode {
    /// Starts an episode at `start`.
    pub fn new(model: &CorridorModel, start: usize) -> Result<Self> {
        model.check_state(start)?;
        Ok(Self {
            state: start,
            steps: 0,
            total_reward: 0.0,
        })
    }

    /// Starts an episode at a uniformly chosen non-terminal state.
    pub fn random_start<R: Rng + ?Sized>(model: &CorridorModel, rng: &mut R) -> Self {
        Self {
            state: random_non_terminal(model, rng),
            steps: 0,
            total_reward: 0.0,
        }
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Whether the agent sits at `model`'s terminal state.
    pub fn is_finished(&self, model: &CorridorModel) -> bool {
        model.is_terminal(self.state)
    }

    /// Takes the policy's action from the current state and samples where it
    /// lands.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        model: &CorridorModel,
        policy: &Policy,
        rng: &mut R,
    ) -> Result<StepOutcome> {
        let from = self.state;
        if self.is_finished(model) {
            return Err(Error::EpisodeFinished { state: from });
        }
        let action = policy
            .action(from)?
            .ok_or(Error::EpisodeFinished { state: from })?;
        let to = sample_transition(model, from, action, rng)?;
        let reward = model.reward(from, to)?;

        self.state = to;
        self.steps += 1;
        self.total_reward += reward;

        if self.is_finished(model) {
            debug!(
                "Episode finished: {} steps, total reward {:.2}",
                self.steps, self.total_reward
            );
        }

        Ok(StepOutcome {
            from,
            action,
            to,
            reward,
        })
    }

    /// Steps until the goal is reached or `max_steps` steps were taken,
    /// returning the steps taken by this call.
    pub fn run_to_goal<R: Rng + ?Sized>(
        &mut self,
        model: &CorridorModel,
        policy: &Policy,
        rng: &mut R,
        max_steps: usize,
    ) -> Result<Vec<StepOutcome>> {
        let mut trajectory = Vec::new();
        while !self.is_finished(model) && trajectory.len() < max_steps {
            trajectory.push(self.step(model, policy, rng)?);
        }
        Ok(trajectory)
    }

    /// Moves to a fresh random non-terminal start and clears the counters.
    pub fn reset<R: Rng + ?Sized>(&mut self, model: &CorridorModel, rng: &mut R) {
        *self = Self::random_start(model, rng);
    }
}

fn random_non_terminal<R: Rng + ?Sized>(model: &CorridorModel, rng: &mut R) -> usize {
    // Skip over the terminal state when the draw reaches it.
    let pick = rng.gen_range(0..model.num_states() - 1);
    if pick >= model.terminal_state() {
        pick + 1
    } else {
        pick
    }
}
