use super::params::TensorRecord;
use super::traits::{BasicLearner, ParamFetcher, Persistable, QFunction};
use super::{Error, LearningStepInfo, Params};
use log::{debug, info};
use rand::Rng;
use replay_data::State;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tch::nn::{self, Module, OptimizerConfig};
use tch::{Device, Kind, Reduction, Tensor};

/// Hidden part of the network: `hidden_layers` ReLU layers of `hidden_dim`
/// units each. Zero hidden layers gives a linear model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelShape {
    pub hidden_layers: usize,
    pub hidden_dim: usize,
}

impl Default for ModelShape {
    fn default() -> Self {
        Self {
            hidden_layers: 4,
            hidden_dim: 512,
        }
    }
}

/// Fully connected Q-network on the CPU, trained with Adam on a smooth-L1
/// loss.
pub struct BasicModel {
    vs: nn::VarStore,
    net: nn::Sequential,
    optimizer: nn::Optimizer,
    observation_dim: usize,
    n_actions: usize,
    shape: ModelShape,
    learning_rate: f32,
}

impl BasicModel {
    /// Weights are drawn uniformly from `±sqrt(6 / (fan_in + fan_out))`
    /// with `rng`, biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        observation_dim: usize,
        n_actions: usize,
        shape: ModelShape,
        learning_rate: f32,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let mut model = Self::build(observation_dim, n_actions, shape, learning_rate)?;
        let params = glorot_uniform(&model.params(), rng)?;
        model.set_params(params)?;
        Ok(model)
    }

    /// A network of the same shape holding a copy of the parameters, with
    /// fresh optimizer state.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let mut model = Self::build(self.observation_dim, self.n_actions, self.shape, self.learning_rate)?;
        model.set_params(self.params())?;
        Ok(model)
    }

    fn build(
        observation_dim: usize,
        n_actions: usize,
        shape: ModelShape,
        learning_rate: f32,
    ) -> Result<Self, Error> {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = {
            let root = vs.root();
            let mut net = nn::seq();
            let mut in_dim = observation_dim as i64;
            for layer in 0..shape.hidden_layers {
                net = net
                    .add(nn::linear(
                        &root / format!("layer{layer}"),
                        in_dim,
                        shape.hidden_dim as i64,
                        Default::default(),
                    ))
                    .add_fn(|xs| xs.relu());
                in_dim = shape.hidden_dim as i64;
            }
            net.add(nn::linear(&root / "output", in_dim, n_actions as i64, Default::default()))
        };
        let optimizer = nn::Adam::default().build(&vs, f64::from(learning_rate))?;
        Ok(Self {
            vs,
            net,
            optimizer,
            observation_dim,
            n_actions,
            shape,
            learning_rate,
        })
    }

    pub fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    fn check_state(&self, state: &[f32]) -> Result<(), Error> {
        if state.len() == self.observation_dim {
            Ok(())
        } else {
            Err(Error::StateDimMismatch {
                expected: self.observation_dim,
                got: state.len(),
            })
        }
    }

    fn states_tensor(&self, states: &[State]) -> Result<Tensor, Error> {
        let mut flat = Vec::with_capacity(states.len() * self.observation_dim);
        for state in states {
            self.check_state(state)?;
            flat.extend_from_slice(state);
        }
        Ok(Tensor::from_slice(&flat).f_view([states.len() as i64, self.observation_dim as i64])?)
    }

    fn check_batch(&self, states: &[State], actions: &[usize], targets: &[f32]) -> Result<(), Error> {
        if states.len() != actions.len() || states.len() != targets.len() {
            return Err(Error::BatchMismatch {
                states: states.len(),
                actions: actions.len(),
                targets: targets.len(),
            });
        }
        match actions.iter().find(|&&action| action >= self.n_actions) {
            Some(&action) => Err(Error::ActionOutOfRange {
                action,
                n_actions: self.n_actions,
            }),
            None => Ok(()),
        }
    }
}

fn glorot_uniform<R: Rng + ?Sized>(template: &Params, rng: &mut R) -> Result<Params, Error> {
    let mut tensors = Vec::new();
    for (name, tensor) in template.iter() {
        let size = tensor.size();
        let values: Vec<f32> = match size.as_slice() {
            &[out_dim, in_dim] => {
                let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
                (0..tensor.numel())
                    .map(|_| rng.gen_range(-limit..=limit))
                    .collect()
            }
            _ => vec![0.0; tensor.numel()],
        };
        tensors.push((name.to_string(), Tensor::from_slice(&values).f_view(size.as_slice())?));
    }
    Ok(Params::new(tensors))
}

impl QFunction for BasicModel {
    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn q_values(&self, state: &[f32]) -> Result<Vec<f32>, Error> {
        self.check_state(state)?;
        let input = Tensor::from_slice(state).unsqueeze(0);
        let output = tch::no_grad(|| self.net.forward(&input)).flatten(0, -1);
        Ok(Vec::<f32>::try_from(&output)?)
    }

    fn q_values_batch(&self, states: &[State]) -> Result<Vec<Vec<f32>>, Error> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.states_tensor(states)?;
        let output = tch::no_grad(|| self.net.forward(&input)).flatten(0, -1);
        let values = Vec::<f32>::try_from(&output)?;
        Ok(values.chunks(self.n_actions).map(<[f32]>::to_vec).collect())
    }
}

impl BasicLearner for BasicModel {
    fn train_batch(
        &mut self,
        states: &[State],
        actions: &[usize],
        targets: &[f32],
    ) -> Result<LearningStepInfo, Error> {
        self.check_batch(states, actions, targets)?;
        if states.is_empty() {
            return Ok(LearningStepInfo {
                loss: 0.0,
                average_q_val: 0.0,
            });
        }
        let input = self.states_tensor(states)?;
        let actions: Vec<i64> = actions.iter().map(|&action| action as i64).collect();
        let actions = Tensor::from_slice(&actions).unsqueeze(1);
        let targets = Tensor::from_slice(targets).unsqueeze(1);

        let q = self.net.forward(&input).gather(1, &actions, false);
        let loss = q.smooth_l1_loss(&targets, Reduction::Mean, 1.0);
        let loss_value = loss.double_value(&[]) as f32;
        if !loss_value.is_finite() {
            return Err(Error::NonFiniteLoss { loss: loss_value });
        }
        let average_q_val = q.mean(Kind::Float).double_value(&[]) as f32;
        self.optimizer.backward_step(&loss);
        Ok(LearningStepInfo {
            loss: loss_value,
            average_q_val,
        })
    }
}

impl ParamFetcher for BasicModel {
    fn params(&self) -> Params {
        Params::from_var_store(&self.vs)
    }

    fn set_params(&mut self, params: Params) -> Result<(), Error> {
        params.copy_into(&mut self.vs)
    }
}

impl Persistable for BasicModel {
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let params = self.params();
        file_io::save_compressed(path, &params.to_records()?).map_err(|source| Error::Checkpoint {
            operation: "save",
            path: path.to_path_buf(),
            source,
        })?;
        info!("saved {} parameters to {}", params.len(), path.display());
        Ok(())
    }

    fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let records: Vec<TensorRecord> = file_io::load_compressed(path).map_err(|source| {
            let not_found = matches!(
                *source,
                bincode::ErrorKind::Io(ref err) if err.kind() == io::ErrorKind::NotFound
            );
            if not_found {
                Error::CheckpointNotFound(path.to_path_buf())
            } else {
                Error::Checkpoint {
                    operation: "load",
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        self.set_params(Params::from_records(records)?)?;
        // moment estimates belong to the parameters they were built on
        self.optimizer = nn::Adam::default().build(&self.vs, f64::from(self.learning_rate))?;
        debug!("loaded parameters from {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_model(seed: u64) -> BasicModel {
        let shape = ModelShape {
            hidden_layers: 2,
            hidden_dim: 16,
        };
        BasicModel::new(3, 4, shape, 0.01, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap()
    }

    fn shape_of(model: &BasicModel) -> Vec<(String, Vec<i64>)> {
        model.params().shape()
    }

    #[test]
    fn dimensions_follow_construction() {
        let model = small_model(0);
        assert_eq!(model.observation_dim(), 3);
        assert_eq!(model.n_actions(), 4);
        assert_eq!(
            shape_of(&model),
            vec![
                ("layer0.bias".to_string(), vec![16]),
                ("layer0.weight".to_string(), vec![16, 3]),
                ("layer1.bias".to_string(), vec![16]),
                ("layer1.weight".to_string(), vec![16, 16]),
                ("output.bias".to_string(), vec![4]),
                ("output.weight".to_string(), vec![4, 16]),
            ]
        );
        assert_eq!(model.q_values(&[0.1, 0.2, 0.3]).unwrap().len(), 4);
    }

    #[test]
    fn initialization_is_seeded() {
        assert_eq!(small_model(5).params(), small_model(5).params());
        assert_ne!(small_model(5).params(), small_model(6).params());
    }

    #[test]
    fn biases_start_at_zero_and_weights_within_the_glorot_limit() {
        let params = small_model(9).params();
        for (name, tensor) in params.iter() {
            let values = Vec::<f32>::try_from(&tensor.flatten(0, -1)).unwrap();
            if name.ends_with("bias") {
                assert!(values.iter().all(|&v| v == 0.0), "{name}");
            } else {
                let size = tensor.size();
                let limit = (6.0 / (size[0] + size[1]) as f32).sqrt();
                assert!(values.iter().all(|v| v.abs() <= limit), "{name}");
            }
        }
    }

    #[test]
    fn batch_prediction_matches_single_prediction() {
        let model = small_model(1);
        let states = vec![vec![0.0, 1.0, -1.0], vec![0.5, 0.5, 0.5]];
        let batch = model.q_values_batch(&states).unwrap();
        for (row, state) in batch.iter().zip(&states) {
            let single = model.q_values(state).unwrap();
            for (a, b) in row.iter().zip(&single) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn wrong_state_length_is_rejected() {
        let mut model = small_model(1);
        assert!(matches!(
            model.q_values(&[0.0, 1.0]),
            Err(Error::StateDimMismatch { expected: 3, got: 2 })
        ));
        assert!(matches!(
            model.q_values_batch(&[vec![0.0; 3], vec![0.0; 4]]),
            Err(Error::StateDimMismatch { expected: 3, got: 4 })
        ));
        let before = model.params();
        assert!(matches!(
            model.train_batch(&[vec![0.0; 5]], &[0], &[1.0]),
            Err(Error::StateDimMismatch { expected: 3, got: 5 })
        ));
        assert_eq!(model.params(), before);
    }

    #[test]
    fn training_moves_the_taken_action_towards_its_target() {
        let mut model = small_model(2);
        let states = vec![vec![0.2, -0.4, 0.9]; 8];
        let actions = vec![2; 8];
        let targets = vec![3.0; 8];
        let before = (model.q_values(&states[0]).unwrap()[2] - 3.0).abs();
        let mut last_loss = f32::INFINITY;
        for _ in 0..200 {
            last_loss = model.train_batch(&states, &actions, &targets).unwrap().loss;
        }
        let after = (model.q_values(&states[0]).unwrap()[2] - 3.0).abs();
        assert!(after < before);
        assert!(after < 0.25, "distance to target still {after}");
        assert!(last_loss < 0.05);
    }

    #[test]
    fn non_finite_loss_leaves_params_untouched() {
        let mut model = small_model(3);
        let before = model.params();
        let result = model.train_batch(&[vec![0.0, 0.0, 1.0]], &[0], &[f32::NAN]);
        assert!(matches!(result, Err(Error::NonFiniteLoss { .. })));
        assert_eq!(model.params(), before);
    }

    #[test]
    fn mismatched_batch_is_rejected() {
        let mut model = small_model(4);
        let result = model.train_batch(&[vec![0.0; 3]], &[0, 1], &[0.0]);
        assert!(matches!(result, Err(Error::BatchMismatch { .. })));
        let result = model.train_batch(&[vec![0.0; 3]], &[9], &[0.0]);
        assert!(matches!(
            result,
            Err(Error::ActionOutOfRange { action: 9, n_actions: 4 })
        ));
    }

    #[test]
    fn set_params_rejects_other_shapes() {
        let mut model = small_model(0);
        let other = BasicModel::new(
            3,
            2,
            ModelShape::default(),
            0.01,
            &mut ChaCha8Rng::seed_from_u64(0),
        )
        .unwrap();
        assert!(matches!(
            model.set_params(other.params()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn try_clone_copies_params_without_sharing_them() {
        let mut model = small_model(6);
        let copy = model.try_clone().unwrap();
        assert_eq!(copy.params(), model.params());
        model
            .train_batch(&[vec![1.0, 1.0, 1.0]], &[1], &[10.0])
            .unwrap();
        assert_ne!(copy.params(), model.params());
    }

    #[test]
    fn save_then_load_restores_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.params");
        let saved = small_model(7);
        saved.save(&path).unwrap();
        let mut loaded = small_model(8);
        loaded.load(&path).unwrap();
        assert_eq!(loaded.params(), saved.params());
    }

    #[test]
    fn loading_a_missing_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = small_model(0);
        let before = model.params();
        let err = model.load(dir.path().join("nope.params")).unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound(_)));
        assert_eq!(model.params(), before);
    }
}
