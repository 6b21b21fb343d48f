mod config;
mod epsilon_schedule;
mod error;
mod evaluation;
mod gradient_stepper;
mod target_sync;
mod trainer;

pub use config::{TrainerConfig, UpdateTargetStrategy};
pub use epsilon_schedule::EpsilonSchedule;
pub use error::Error;
pub use evaluation::{monte_carlo, Evaluation};
pub use gradient_stepper::{td_target, GradientStepper};
pub use target_sync::{TargetSync, TargetUpdate};
pub use trainer::{EvaluationRecord, Trainer, TrainingHistory, DEFAULT_CHECKPOINT_PATH};
