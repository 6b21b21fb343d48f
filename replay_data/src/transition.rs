use crate::State;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub action: usize,
    pub reward: f64,
    pub next_state: State,
    // set only when the environment itself ended the episode. truncation
    // by a time limit leaves this false, so the next state still gets
    // bootstrapped from
    pub terminated: bool,
}

impl Transition {
    pub fn done_mask(&self) -> f32 {
        f32::from(u8::from(self.terminated))
    }
}
