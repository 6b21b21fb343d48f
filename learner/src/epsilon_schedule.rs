use env::ActionSpace;
use model::traits::Actor;
use model::Error;
use rand::Rng;

/// Epsilon-greedy exploration whose epsilon stays at `eps_max` for a delay
/// and then decays linearly to `eps_min`.
#[derive(Clone, Debug, PartialEq)]
pub struct EpsilonSchedule {
    eps: f64,
    eps_min: f64,
    n_delay_steps: u64,
    eps_step: f64,
}

impl EpsilonSchedule {
    pub fn new(eps_min: f64, eps_max: f64, n_delay_steps: u64, n_decay_steps: u32) -> Self {
        Self {
            eps: eps_max,
            eps_min,
            n_delay_steps,
            eps_step: (eps_max - eps_min) / f64::from(n_decay_steps),
        }
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Called once per environment step with the number of steps taken so
    /// far.
    pub fn advance(&mut self, n_step: u64) {
        if n_step > self.n_delay_steps {
            self.eps = self.eps_min.max(self.eps - self.eps_step);
        }
    }

    pub fn select_action<A, R>(
        &self,
        state: &[f32],
        actor: &A,
        action_space: ActionSpace,
        rng: &mut R,
    ) -> Result<usize, Error>
    where
        A: Actor + ?Sized,
        R: Rng + ?Sized,
    {
        if rng.gen::<f64>() < self.eps {
            Ok(action_space.sample(rng))
        } else {
            actor.best_action(state)
        }
    }
}
