use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no checkpoint at {}", .0.display())]
    CheckpointNotFound(PathBuf),

    #[error("failed to {operation} checkpoint {}: {source}", path.display())]
    Checkpoint {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("parameter shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<(String, Vec<i64>)>,
        got: Vec<(String, Vec<i64>)>,
    },

    #[error("state has {got} features but the network expects {expected}")]
    StateDimMismatch { expected: usize, got: usize },

    #[error("batch columns disagree: {states} states, {actions} actions, {targets} targets")]
    BatchMismatch {
        states: usize,
        actions: usize,
        targets: usize,
    },

    #[error("action {action} out of range for {n_actions} actions")]
    ActionOutOfRange { action: usize, n_actions: usize },

    #[error("loss is not finite ({loss})")]
    NonFiniteLoss { loss: f32 },

    #[error(transparent)]
    Torch(#[from] tch::TchError),
}
