/// A single continuous observation. Every state handled by one run has the
/// same length, fixed by the environment at construction.
pub type State = Vec<f32>;
