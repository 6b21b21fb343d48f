use log::trace;
use model::traits::{BasicLearner, QFunction};
use model::{max_value, Error, LearningStepInfo};
use rand::Rng;
use replay_data::TransitionBatch;
use replay_memories::ReplayRing;

/// Bootstrapped target `reward + gamma * (1 - done) * q_next_max`. A done
/// flag of 1 masks the bootstrap term entirely.
pub fn td_target(reward: f64, gamma: f64, done: f32, q_next_max: f32) -> f32 {
    // skip the product when masked so a non-finite estimate of a terminal
    // successor cannot leak into the target
    if done >= 1.0 {
        return reward as f32;
    }
    (reward + gamma * f64::from(1.0 - done) * f64::from(q_next_max)) as f32
}

/// One DQN update: sample uniformly from replay, build TD targets from the
/// target network and regress the online network onto them.
pub struct GradientStepper {
    gamma: f64,
    batch_size: usize,
}

impl GradientStepper {
    pub fn new(gamma: f64, batch_size: usize) -> Self {
        Self { gamma, batch_size }
    }

    pub fn td_targets<T: QFunction + ?Sized>(
        &self,
        batch: &TransitionBatch,
        target: &T,
    ) -> Result<Vec<f32>, Error> {
        let targets = target
            .q_values_batch(&batch.next_states)?
            .iter()
            .zip(&batch.rewards)
            .zip(&batch.dones)
            .map(|((q_next, &reward), &done)| {
                td_target(reward, self.gamma, done, max_value(q_next))
            })
            .collect();
        Ok(targets)
    }

    /// Returns `None` without touching anything while `memory` holds fewer
    /// than a batch of transitions.
    pub fn step<M, T, R>(
        &self,
        memory: &ReplayRing,
        online: &mut M,
        target: &T,
        rng: &mut R,
    ) -> Result<Option<LearningStepInfo>, Error>
    where
        M: BasicLearner + ?Sized,
        T: QFunction + ?Sized,
        R: Rng + ?Sized,
    {
        if memory.len() < self.batch_size {
            return Ok(None);
        }
        let batch = memory.sample_batch(rng, self.batch_size);
        let targets = self.td_targets(&batch, target)?;
        let info = online.train_batch(&batch.states, &batch.actions, &targets)?;
        trace!("loss {:.5}, average q {:.3}", info.loss, info.average_q_val);
        Ok(Some(info))
    }
}
