use crate::Error;
use serde::{Deserialize, Serialize};
use tch::nn::VarStore;
use tch::Tensor;

/// A detached copy of every trainable tensor of a network, ordered by
/// variable name. Changing a snapshot never touches the network it was
/// taken from.
#[derive(Debug)]
pub struct Params {
    tensors: Vec<(String, Tensor)>,
}

/// On-disk form of one tensor of a [`Params`] snapshot.
#[derive(Serialize, Deserialize)]
pub(crate) struct TensorRecord {
    name: String,
    shape: Vec<i64>,
    values: Vec<f32>,
}

impl Params {
    pub fn new(mut tensors: Vec<(String, Tensor)>) -> Self {
        tensors.sort_by(|(a, _), (b, _)| a.cmp(b));
        Self { tensors }
    }

    pub fn from_var_store(vs: &VarStore) -> Self {
        Self::new(
            vs.variables()
                .into_iter()
                .map(|(name, var)| (name, var.detach().copy()))
                .collect(),
        )
    }

    /// Overwrites the variables of `vs` with this snapshot.
    pub fn copy_into(&self, vs: &mut VarStore) -> Result<(), Error> {
        self.check_same_shape(&Self::from_var_store(vs))?;
        let mut variables = vs.variables();
        tch::no_grad(|| {
            for (name, tensor) in self.iter() {
                if let Some(var) = variables.get_mut(name) {
                    var.copy_(tensor);
                }
            }
        });
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Name and size of every tensor.
    pub fn shape(&self) -> Vec<(String, Vec<i64>)> {
        self.iter()
            .map(|(name, tensor)| (name.to_string(), tensor.size()))
            .collect()
    }

    pub fn check_same_shape(&self, other: &Params) -> Result<(), Error> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            })
        }
    }

    /// Number of scalar parameters.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, tensor)| tensor.numel()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exponential moving average towards `online`:
    /// `self = tau * online + (1 - tau) * self` for every scalar.
    pub fn soft_update_towards(&mut self, online: &Params, tau: f32) -> Result<(), Error> {
        self.check_same_shape(online)?;
        let tau = f64::from(tau);
        tch::no_grad(|| {
            for ((_, target), (_, online)) in self.tensors.iter_mut().zip(online.iter()) {
                let blended = online * tau + &*target * (1.0 - tau);
                target.copy_(&blended);
            }
        });
        Ok(())
    }

    pub(crate) fn to_records(&self) -> Result<Vec<TensorRecord>, Error> {
        self.iter()
            .map(|(name, tensor)| -> Result<TensorRecord, Error> {
                let flat = tensor.flatten(0, -1);
                Ok(TensorRecord {
                    name: name.to_string(),
                    shape: tensor.size(),
                    values: Vec::<f32>::try_from(&flat)?,
                })
            })
            .collect()
    }

    pub(crate) fn from_records(records: Vec<TensorRecord>) -> Result<Self, Error> {
        let tensors = records
            .into_iter()
            .map(|record| -> Result<(String, Tensor), Error> {
                let tensor = Tensor::from_slice(&record.values).f_view(record.shape.as_slice())?;
                Ok((record.name, tensor))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self::new(tensors))
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .iter()
                .zip(other.iter())
                .all(|((_, a), (_, b))| a.equal(b))
    }
}
