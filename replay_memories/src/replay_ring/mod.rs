mod circ_buffer;

use circ_buffer::CircBuffer;
use rand::seq::index;
use rand::Rng;
use replay_data::{Transition, TransitionBatch};

/// Uniform experience replay over a ring of the most recent transitions.
pub struct ReplayRing {
    transitions: CircBuffer<Transition>,
}

impl ReplayRing {
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            transitions: CircBuffer::with_max_size(max_size),
        }
    }

    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Draws `batch_size` distinct transitions uniformly at random.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `batch_size` transitions are stored. Callers are
    /// expected to check [`ReplayRing::len`] first and skip training while
    /// the ring is still warming up.
    pub fn sample_batch<R: Rng + ?Sized>(&self, rng: &mut R, batch_size: usize) -> TransitionBatch {
        assert!(
            batch_size <= self.len(),
            "cannot sample {} transitions from a ReplayRing holding {}",
            batch_size,
            self.len()
        );
        index::sample(rng, self.len(), batch_size)
            .into_iter()
            .filter_map(|i| self.transitions.get(i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.transitions.max_size()
    }

    /// Stored transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }
}
