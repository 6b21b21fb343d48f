mod args;

use args::Args;
use clap::Parser;
use env::{CartPole, TimeLimitedWrapper};
use learner::{Trainer, TrainerConfig};
use log::info;
use std::error::Error;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrainerConfig::load(path)?,
        None => TrainerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let monitoring_nb_trials = config.monitoring_nb_trials;
    let env = TimeLimitedWrapper::new(CartPole::new(config.seed), args.max_episode_steps);
    let mut trainer = Trainer::new(config, env)?;

    if args.evaluate {
        trainer.load()?;
        let evaluation = trainer.evaluate(monitoring_nb_trials.max(1))?;
        info!(
            "mc total {:.2}, mc disc {:.2}, v0 {:.2}",
            evaluation.mean_total_reward, evaluation.mean_discounted_reward, evaluation.mean_initial_value
        );
        return Ok(());
    }

    let history = trainer.train(args.episodes)?;
    trainer.save(&args.output)?;
    info!(
        "trained {} steps, final eps {:.2}, best score {:.2}; saved parameters to {}",
        trainer.n_step(),
        trainer.eps(),
        trainer.best_score(),
        args.output.display()
    );
    if let Some(path) = &args.history {
        history.save_json(path)?;
        info!("saved training history to {}", path.display());
    }
    Ok(())
}
