mod basic_model;
mod error;
mod params;
pub mod traits;

pub use basic_model::{BasicModel, ModelShape};
pub use error::Error;
pub use params::Params;

pub struct LearningStepInfo {
    pub loss: f32,
    pub average_q_val: f32,
}

/// Index of the largest value, the first one on ties. NaN never wins; an
/// empty or all-NaN slice yields 0.
pub fn argmax(values: &[f32]) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map_or(0, |(i, _)| i)
}

/// Largest non-NaN value, or NaN when there is none.
pub fn max_value(values: &[f32]) -> f32 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NAN, f32::max)
}
