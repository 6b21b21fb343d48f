use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration expects {configured} actions but the environment has {actual}")]
    ActionCountMismatch { configured: usize, actual: usize },

    #[error("training diverged at step {n_step}: loss became {loss}")]
    Diverged { n_step: u64, loss: f32 },

    #[error(transparent)]
    Model(#[from] model::Error),
}
