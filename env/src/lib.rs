//! The environment side of training: the [`Env`] contract a learner drives,
//! plus a built-in cart-pole task and a step-count time limit.

mod action_space;
mod cart_pole;
mod episode;
mod time_limited_wrapper;

pub use action_space::ActionSpace;
pub use cart_pole::CartPole;
pub use episode::{Done, Status, Step};
pub use time_limited_wrapper::TimeLimitedWrapper;

use replay_data::State;

/// An episodic environment with continuous observations and a discrete
/// action set.
///
/// Dimensions are queried once when a learner is built and must not change
/// afterwards.
pub trait Env {
    fn observation_dim(&self) -> usize;
    fn action_space(&self) -> ActionSpace;
    /// Starts a new episode and returns its initial state.
    fn reset(&mut self) -> State;
    fn step(&mut self, action: usize) -> Step;
}

impl<E: Env + ?Sized> Env for &mut E {
    fn observation_dim(&self) -> usize {
        (**self).observation_dim()
    }
    fn action_space(&self) -> ActionSpace {
        (**self).action_space()
    }
    fn reset(&mut self) -> State {
        (**self).reset()
    }
    fn step(&mut self, action: usize) -> Step {
        (**self).step(action)
    }
}
