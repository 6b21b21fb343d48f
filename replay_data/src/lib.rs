mod batch;
mod state;
mod transition;

pub use batch::TransitionBatch;
pub use state::State;
pub use transition::Transition;
