use crate::config::TrainerConfig;
use crate::epsilon_schedule::EpsilonSchedule;
use crate::evaluation::{self, Evaluation};
use crate::gradient_stepper::GradientStepper;
use crate::target_sync::{TargetSync, TargetUpdate};
use crate::Error;
use env::{ActionSpace, Env, Step};
use file_io::create_file_buf_write;
use log::{debug, info};
use model::traits::{Actor, BasicLearner, ParamFetcher, Persistable, QFunction};
use model::BasicModel;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use replay_data::Transition;
use replay_memories::ReplayRing;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where [`Trainer::load`] looks for parameters, relative to the working
/// directory.
pub const DEFAULT_CHECKPOINT_PATH: &str = "last_dqn.params";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Number of finished training episodes when the evaluation ran.
    pub episode: u32,
    pub evaluation: Evaluation,
    /// Whether this evaluation beat the best score so far and was
    /// checkpointed.
    pub checkpoint_saved: bool,
}

/// What a run leaves behind for offline analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub episode_returns: Vec<f64>,
    pub evaluations: Vec<EvaluationRecord>,
}

impl TrainingHistory {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let file = create_file_buf_write(path).map_err(|source| Error::Io {
            operation: "create history file",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Drives DQN training against one environment.
///
/// All randomness of the learner (parameter initialization, exploration and
/// replay sampling) is drawn from a single generator seeded from
/// `config.seed`.
pub struct Trainer<E, M> {
    config: TrainerConfig,
    env: E,
    action_space: ActionSpace,
    online: M,
    target_sync: TargetSync<M>,
    memory: ReplayRing,
    schedule: EpsilonSchedule,
    stepper: GradientStepper,
    rng: ChaCha8Rng,
    n_step: u64,
    best_score: f64,
}

impl<E: Env> Trainer<E, BasicModel> {
    /// Builds a trainer around freshly initialized [`BasicModel`]s shaped by
    /// `config.model`.
    pub fn new(config: TrainerConfig, env: E) -> Result<Self, Error> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let n_actions = config.nb_actions.unwrap_or(env.action_space().n());
        let online = BasicModel::new(
            env.observation_dim(),
            n_actions,
            config.model,
            config.learning_rate,
            &mut rng,
        )?;
        let target = online.try_clone()?;
        Self::build(config, env, online, target, rng)
    }
}

impl<E, M> Trainer<E, M>
where
    E: Env,
    M: QFunction + BasicLearner + ParamFetcher + Persistable,
{
    /// Builds a trainer around caller-provided networks. `target` only needs
    /// the shape of `online`; its parameters are overwritten.
    pub fn with_models(config: TrainerConfig, env: E, online: M, target: M) -> Result<Self, Error> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::build(config, env, online, target, rng)
    }

    fn build(config: TrainerConfig, env: E, online: M, target: M, rng: ChaCha8Rng) -> Result<Self, Error> {
        let action_space = env.action_space();
        if let Some(configured) = config.nb_actions {
            if configured != action_space.n() {
                return Err(Error::ActionCountMismatch {
                    configured,
                    actual: action_space.n(),
                });
            }
        }
        if online.n_actions() != action_space.n() {
            return Err(Error::ActionCountMismatch {
                configured: online.n_actions(),
                actual: action_space.n(),
            });
        }
        let target_sync = TargetSync::new(&online, target, TargetUpdate::from_config(&config))?;
        let schedule = EpsilonSchedule::new(
            config.epsilon_min,
            config.epsilon_max,
            u64::from(config.epsilon_delay_decay),
            config.epsilon_decay_period,
        );
        Ok(Self {
            memory: ReplayRing::with_max_size(config.buffer_size),
            stepper: GradientStepper::new(config.gamma, config.batch_size),
            schedule,
            target_sync,
            online,
            action_space,
            env,
            rng,
            n_step: 0,
            best_score: 0.0,
            config,
        })
    }

    pub fn online(&self) -> &M {
        &self.online
    }

    pub fn target(&self) -> &M {
        self.target_sync.target()
    }

    pub fn memory(&self) -> &ReplayRing {
        &self.memory
    }

    pub fn eps(&self) -> f64 {
        self.schedule.eps()
    }

    /// Environment steps taken across all calls to [`Trainer::train`].
    pub fn n_step(&self) -> u64 {
        self.n_step
    }

    /// Mean total reward of the last checkpointed evaluation, 0 until an
    /// evaluation scores above 0.
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    /// Greedy action of the online network.
    pub fn act(&self, state: &[f32]) -> Result<usize, Error> {
        Ok(self.online.best_action(state)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        Ok(self.online.save(path)?)
    }

    /// Restores the online network from [`DEFAULT_CHECKPOINT_PATH`]. A
    /// missing file is an error.
    pub fn load(&mut self) -> Result<(), Error> {
        self.load_from(DEFAULT_CHECKPOINT_PATH)
    }

    /// Restores the online network from `path` and restarts the target from
    /// it.
    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.online.load(path)?;
        self.target_sync.reset_to(&self.online)?;
        Ok(())
    }

    /// Monte Carlo evaluation of the current greedy policy.
    pub fn evaluate(&mut self, n_trials: u32) -> Result<Evaluation, Error> {
        Ok(evaluation::monte_carlo(
            &mut self.env,
            &self.online,
            n_trials,
            self.config.gamma,
        )?)
    }

    /// Trains for `max_episodes` episodes and returns the run's history.
    pub fn train(&mut self, max_episodes: u32) -> Result<TrainingHistory, Error> {
        let mut history = TrainingHistory::default();
        let mut episode = 0;
        let mut episode_cum_reward = 0.0;
        let mut state = self.env.reset();
        while episode < max_episodes {
            self.schedule.advance(self.n_step);
            let action =
                self.schedule
                    .select_action(&state, &self.online, self.action_space, &mut self.rng)?;
            let Step {
                next_state,
                reward,
                status,
            } = self.env.step(action);
            episode_cum_reward += reward;
            self.memory.add_transition(Transition {
                state,
                action,
                reward,
                next_state: next_state.clone(),
                terminated: status.is_terminated(),
            });
            for _ in 0..self.config.gradient_steps {
                self.gradient_step()?;
            }
            self.target_sync.update(self.n_step, &self.online)?;
            self.n_step += 1;

            if status.is_done() {
                episode += 1;
                history.episode_returns.push(episode_cum_reward);
                if self.is_time_to_evaluate(episode) {
                    let record = self.evaluate_and_checkpoint(episode)?;
                    info!(
                        "episode {:4}, eps {:6.2}, memory {:7}, return {:8.1}, mc total {:8.2}, mc disc {:8.2}, v0 {:8.2}",
                        episode,
                        self.schedule.eps(),
                        self.memory.len(),
                        episode_cum_reward,
                        record.evaluation.mean_total_reward,
                        record.evaluation.mean_discounted_reward,
                        record.evaluation.mean_initial_value,
                    );
                    history.evaluations.push(record);
                } else {
                    info!(
                        "episode {:4}, eps {:6.2}, memory {:7}, return {:8.1}",
                        episode,
                        self.schedule.eps(),
                        self.memory.len(),
                        episode_cum_reward,
                    );
                }
                state = self.env.reset();
                episode_cum_reward = 0.0;
            } else {
                state = next_state;
            }
        }
        Ok(history)
    }

    fn gradient_step(&mut self) -> Result<(), Error> {
        let result = self.stepper.step(
            &self.memory,
            &mut self.online,
            self.target_sync.target(),
            &mut self.rng,
        );
        match result {
            Ok(_) => Ok(()),
            Err(model::Error::NonFiniteLoss { loss }) => Err(Error::Diverged {
                n_step: self.n_step,
                loss,
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn is_time_to_evaluate(&self, episode: u32) -> bool {
        self.config.monitoring_nb_trials > 0 && episode % self.config.monitoring_interval == 0
    }

    fn evaluate_and_checkpoint(&mut self, episode: u32) -> Result<EvaluationRecord, Error> {
        let evaluation = self.evaluate(self.config.monitoring_nb_trials)?;
        let score = evaluation.mean_total_reward;
        let improved = score > self.best_score;
        if improved {
            self.best_score = score;
            self.online.save(&self.config.best_checkpoint_path)?;
            info!("best score is {score:.2}, saved to {}", self.config.best_checkpoint_path.display());
        } else {
            debug!("evaluation score {score:.2} does not beat {:.2}", self.best_score);
        }
        Ok(EvaluationRecord {
            episode,
            evaluation,
            checkpoint_saved: improved,
        })
    }
}
