use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Trains a DQN agent on CartPole")]
pub struct Args {
    /// JSON file with training hyperparameters; missing keys keep their
    /// defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long, default_value_t = 200)]
    pub episodes: u32,

    /// Overrides the seed of the config
    #[arg(long)]
    pub seed: Option<u64>,

    /// Episodes are truncated after this many steps
    #[arg(long, default_value_t = 200)]
    pub max_episode_steps: u32,

    /// Where the final parameters are written
    #[arg(long, default_value = learner::DEFAULT_CHECKPOINT_PATH)]
    pub output: PathBuf,

    /// Writes returns and evaluations of the run as JSON
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Skips training, loads the last saved parameters and evaluates them
    #[arg(long)]
    pub evaluate: bool,
}
