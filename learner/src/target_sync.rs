use crate::config::{TrainerConfig, UpdateTargetStrategy};
use log::trace;
use model::traits::ParamFetcher;
use model::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetUpdate {
    Replace { interval_steps: u32 },
    Ema { tau: f32 },
}

impl TargetUpdate {
    pub fn from_config(config: &TrainerConfig) -> Self {
        match config.update_target_strategy {
            UpdateTargetStrategy::Replace => Self::Replace {
                interval_steps: config.update_target_freq,
            },
            UpdateTargetStrategy::Ema => Self::Ema {
                tau: config.update_target_tau,
            },
        }
    }
}

/// Owns the target network. Its parameters start as a copy of the online
/// network's and afterwards change only through [`TargetSync::update`] and
/// [`TargetSync::reset_to`].
pub struct TargetSync<M> {
    target: M,
    update: TargetUpdate,
}

impl<M: ParamFetcher> TargetSync<M> {
    pub fn new<O: ParamFetcher + ?Sized>(
        online: &O,
        mut target: M,
        update: TargetUpdate,
    ) -> Result<Self, Error> {
        target.set_params(online.params())?;
        Ok(Self { target, update })
    }

    pub fn target(&self) -> &M {
        &self.target
    }

    pub fn is_time_to_update_target(&self, n_step: u64) -> bool {
        match self.update {
            TargetUpdate::Replace { interval_steps } => n_step % u64::from(interval_steps) == 0,
            TargetUpdate::Ema { .. } => true,
        }
    }

    /// Applies the configured strategy for step `n_step` (0-based). Returns
    /// whether the target changed.
    pub fn update<O: ParamFetcher + ?Sized>(&mut self, n_step: u64, online: &O) -> Result<bool, Error> {
        if !self.is_time_to_update_target(n_step) {
            return Ok(false);
        }
        match self.update {
            TargetUpdate::Replace { .. } => {
                trace!("copying online parameters to target at step {n_step}");
                self.target.set_params(online.params())?;
            }
            TargetUpdate::Ema { tau } => {
                let mut params = self.target.params();
                params.soft_update_towards(&online.params(), tau)?;
                self.target.set_params(params)?;
            }
        }
        Ok(true)
    }

    /// Makes the target an exact copy of `online` again.
    pub fn reset_to<O: ParamFetcher + ?Sized>(&mut self, online: &O) -> Result<(), Error> {
        self.target.set_params(online.params())
    }
}
