use ndarray::{Array2, s};
use ndarray_rand::{RandomExt, rand_distr::Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ReservoirErr, Result};

/// The memory capacity task: recall the input signal as it was some steps ago.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryCapacity {
    /// The amount of time steps.
    pub n_trials: usize,
    /// The factor applied to the input fed to the reservoir.
    pub input_gain: f64,
    /// The targets are the input delayed by `1..=max_delay` steps.
    pub max_delay: usize,
}

impl Default for MemoryCapacity {
    fn default() -> Self {
        Self {
            n_trials: 4050,
            input_gain: 1e-4,
            max_delay: 20,
        }
    }
}

impl MemoryCapacity {
    /// Generates the input signal and its targets.
    ///
    /// The underlying signal is drawn uniformly from `[-1, 1)`. The input is that signal scaled by
    /// the gain, the targets are the unscaled signal at the previous `max_delay` steps.
    ///
    /// # Arguments
    /// * `rng` - The random number generator to draw the signal from.
    ///
    /// # Returns
    /// The input `[n_trials, 1]` and the targets `[n_trials, max_delay]`.
    pub fn fetch_data<R: Rng>(&self, rng: &mut R) -> Result<(Array2<f64>, Array2<f64>)> {
        let &Self {
            n_trials,
            input_gain,
            max_delay,
        } = self;

        if n_trials == 0 || max_delay == 0 {
            return Err(ReservoirErr::InvalidParameter(format!(
                "the memory capacity task needs at least a trial and a delay, got {n_trials} trials and a delay of {max_delay}"
            )));
        }

        if !input_gain.is_finite() {
            return Err(ReservoirErr::InvalidParameter(format!(
                "the input gain must be finite, got {input_gain}"
            )));
        }

        let signal = Array2::random_using((n_trials + max_delay, 1), Uniform::new(-1.0, 1.0)?, rng);

        let y = Array2::from_shape_fn((n_trials, max_delay), |(t, d)| {
            signal[[max_delay + t - (d + 1), 0]]
        });
        let x = signal.slice(s![max_delay.., ..]).mapv(|v| v * input_gain);

        Ok((x, y))
    }
}
