use crate::Error;
use model::ModelShape;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateTargetStrategy {
    /// Copy the online parameters into the target every
    /// `update_target_freq` steps.
    Replace,
    /// Blend the online parameters into the target every step with weight
    /// `update_target_tau`.
    Ema,
}

/// Hyperparameters of a training run. Every key is optional in the config
/// file; absent keys take the values of [`TrainerConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    /// Expected number of actions. Checked against the environment when
    /// set, taken from it otherwise.
    pub nb_actions: Option<usize>,
    pub learning_rate: f32,
    pub gamma: f64,
    pub buffer_size: usize,
    pub epsilon_min: f64,
    pub epsilon_max: f64,
    pub epsilon_decay_period: u32,
    pub epsilon_delay_decay: u32,
    pub batch_size: usize,
    pub gradient_steps: u32,
    pub update_target_strategy: UpdateTargetStrategy,
    pub update_target_freq: u32,
    pub update_target_tau: f32,
    pub monitoring_nb_trials: u32,
    /// Episodes between two Monte Carlo evaluations.
    pub monitoring_interval: u32,
    pub model: ModelShape,
    pub seed: u64,
    /// Where the best evaluated parameters are written during training.
    pub best_checkpoint_path: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            nb_actions: None,
            learning_rate: 0.001,
            gamma: 0.95,
            buffer_size: 1_000_000,
            epsilon_min: 0.01,
            epsilon_max: 1.0,
            epsilon_decay_period: 10_000,
            epsilon_delay_decay: 400,
            batch_size: 500,
            gradient_steps: 2,
            update_target_strategy: UpdateTargetStrategy::Ema,
            update_target_freq: 600,
            update_target_tau: 0.001,
            monitoring_nb_trials: 50,
            monitoring_interval: 200,
            model: ModelShape::default(),
            seed: 42,
            best_checkpoint_path: PathBuf::from("best_dqn.params"),
        }
    }
}

impl TrainerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: "read config",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), Error> {
        fn check(ok: bool, message: &str) -> Result<(), Error> {
            if ok {
                Ok(())
            } else {
                Err(Error::InvalidConfig {
                    message: message.to_string(),
                })
            }
        }
        check(self.nb_actions != Some(0), "nb_actions must be positive")?;
        check(
            self.learning_rate.is_finite() && self.learning_rate > 0.0,
            "learning_rate must be positive",
        )?;
        check((0.0..=1.0).contains(&self.gamma), "gamma must lie in [0, 1]")?;
        check(self.buffer_size > 0, "buffer_size must be positive")?;
        check(self.batch_size > 0, "batch_size must be positive")?;
        check(
            self.batch_size <= self.buffer_size,
            "batch_size must not exceed buffer_size",
        )?;
        check(
            (0.0..=1.0).contains(&self.epsilon_min) && (0.0..=1.0).contains(&self.epsilon_max),
            "epsilon bounds must lie in [0, 1]",
        )?;
        check(
            self.epsilon_min <= self.epsilon_max,
            "epsilon_min must not exceed epsilon_max",
        )?;
        check(
            self.epsilon_decay_period > 0,
            "epsilon_decay_period must be positive",
        )?;
        check(
            self.update_target_freq > 0,
            "update_target_freq must be positive",
        )?;
        check(
            self.update_target_tau > 0.0 && self.update_target_tau <= 1.0,
            "update_target_tau must lie in (0, 1]",
        )?;
        check(
            self.monitoring_interval > 0,
            "monitoring_interval must be positive",
        )?;
        check(self.model.hidden_dim > 0, "model.hidden_dim must be positive")?;
        Ok(())
    }
}
