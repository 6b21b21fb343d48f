use crate::{State, Transition};

/// A sampled batch reorganized into five aligned columns. Row `i` of every
/// column belongs to the same transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionBatch {
    pub states: Vec<State>,
    pub actions: Vec<usize>,
    pub rewards: Vec<f64>,
    pub next_states: Vec<State>,
    pub dones: Vec<f32>,
}

impl TransitionBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            next_states: Vec::with_capacity(capacity),
            dones: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, transition: &Transition) {
        self.states.push(transition.state.clone());
        self.actions.push(transition.action);
        self.rewards.push(transition.reward);
        self.next_states.push(transition.next_state.clone());
        self.dones.push(transition.done_mask());
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<'a> FromIterator<&'a Transition> for TransitionBatch {
    fn from_iter<I: IntoIterator<Item = &'a Transition>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = Self::with_capacity(iter.size_hint().0);
        for transition in iter {
            batch.push(transition);
        }
        batch
    }
}
