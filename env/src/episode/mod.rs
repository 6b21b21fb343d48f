mod status;

pub use status::{Done, Status};

use replay_data::State;

pub struct Step {
    pub next_state: State,
    pub reward: f64,
    pub status: Status,
}
