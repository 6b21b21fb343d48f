use super::{argmax, Error, LearningStepInfo, Params};
use replay_data::State;
use std::path::Path;

/// A function from a state to one value per discrete action.
pub trait QFunction {
    fn n_actions(&self) -> usize;

    /// Fails when `state` does not have the input dimension of the function.
    fn q_values(&self, state: &[f32]) -> Result<Vec<f32>, Error>;

    /// One row of action values per state.
    fn q_values_batch(&self, states: &[State]) -> Result<Vec<Vec<f32>>, Error> {
        states.iter().map(|state| self.q_values(state)).collect()
    }
}

pub trait Actor {
    fn best_action(&self, state: &[f32]) -> Result<usize, Error>;
}

impl<T: QFunction + ?Sized> Actor for T {
    fn best_action(&self, state: &[f32]) -> Result<usize, Error> {
        Ok(argmax(&self.q_values(state)?))
    }
}

pub trait BasicLearner {
    /// Performs one optimization step that moves `Q(states[i], actions[i])`
    /// towards `targets[i]`. Targets are constants: no gradient flows
    /// through them.
    ///
    /// A step whose loss is not finite fails without touching any
    /// parameter.
    fn train_batch(
        &mut self,
        states: &[State],
        actions: &[usize],
        targets: &[f32],
    ) -> Result<LearningStepInfo, Error>;
}

pub trait Persistable {
    fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Error>;
    fn load<P: AsRef<Path>>(&mut self, filepath: P) -> Result<(), Error>;
}

pub trait ParamFetcher {
    fn params(&self) -> Params;
    fn set_params(&mut self, params: Params) -> Result<(), Error>;
}
