use std::ops::Range;

use ndarray::{Array2, Axis, Slice};

use crate::{MlErr, Result, target::TargetData};

/// Paired input signal and targets, sample aligned along the first axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Array2<f64>,
    y: TargetData,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The input signal, `[n_samples, n_channels]`.
    /// * `y` - The targets, with `n_samples` along the first axis.
    ///
    /// # Returns
    /// The dataset or a length mismatch error.
    pub fn new(x: Array2<f64>, y: TargetData) -> Result<Self> {
        if x.nrows() != y.nsamples() {
            return Err(MlErr::LengthMismatch {
                inputs: x.nrows(),
                targets: y.nsamples(),
            });
        }

        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &TargetData {
        &self.y
    }

    /// Splits the samples in two contiguous partitions, the first `floor(frac_train * len)`
    /// samples go to train and the rest to test. The rule is deterministic so every caller
    /// splitting the same data gets the same partitions.
    ///
    /// # Arguments
    /// * `frac_train` - The fraction of samples used for training.
    ///
    /// # Returns
    /// The train and test datasets, or an invalid split error if either would be empty.
    pub fn split(&self, frac_train: f64) -> Result<(Dataset, Dataset)> {
        let n = self.len();
        let invalid = || MlErr::InvalidSplit {
            frac_train,
            samples: n,
        };

        if !(frac_train > 0.0 && frac_train < 1.0) {
            return Err(invalid());
        }

        let n_train = (frac_train * n as f64).floor() as usize;
        if n_train == 0 || n_train == n {
            return Err(invalid());
        }

        let rows = |range: Range<usize>| self.x.slice_axis(Axis(0), Slice::from(range)).to_owned();
        let train = Dataset {
            x: rows(0..n_train),
            y: self.y.select_rows(0..n_train),
        };
        let test = Dataset {
            x: rows(n_train..n),
            y: self.y.select_rows(n_train..n),
        };

        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array, Array1};

    use super::*;

    fn ramp(n: usize) -> Dataset {
        let x = Array::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = TargetData::from(Array1::from_iter(0..n as i64));
        Dataset::new(x, y).unwrap()
    }

    #[test]
    fn split_is_contiguous_and_floored() {
        let (train, test) = ramp(10).split(0.75).unwrap();

        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(test.x()[[0, 0]], 7.0);
        assert_eq!(test.y(), &TargetData::from(Array1::from(vec![7i64, 8, 9])));
    }

    #[test]
    fn split_is_deterministic() {
        let data = ramp(100);
        assert_eq!(data.split(0.8).unwrap(), data.split(0.8).unwrap());
    }

    #[test]
    fn empty_partitions_are_rejected() {
        assert!(matches!(ramp(3).split(0.2), Err(MlErr::InvalidSplit { .. })));
        assert!(matches!(ramp(10).split(1.0), Err(MlErr::InvalidSplit { .. })));
        assert!(matches!(ramp(10).split(0.0), Err(MlErr::InvalidSplit { .. })));
    }

    #[test]
    fn misaligned_samples_are_rejected() {
        let x = Array2::zeros((4, 1));
        let y = TargetData::from(Array1::<f64>::zeros(3));

        assert_eq!(
            Dataset::new(x, y),
            Err(MlErr::LengthMismatch {
                inputs: 4,
                targets: 3
            })
        );
    }
}
