use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{ReservoirErr, Result};

/// The nonlinearity applied to the reservoir's pre-activations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Tanh,
    Sigmoid,
    Relu,
    Linear,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Relu => x.max(0.0),
            Activation::Linear => x,
        }
    }
}

/// A discrete time echo state network driven by an external input.
#[derive(Debug, Clone)]
pub struct EchoStateNetwork {
    w: Array2<f64>,
    activation: Activation,
}

impl EchoStateNetwork {
    /// Creates a new `EchoStateNetwork`.
    ///
    /// # Arguments
    /// * `w` - The square recurrent weight matrix.
    /// * `activation` - The nonlinearity of every node.
    pub fn new(w: Array2<f64>, activation: Activation) -> Result<Self> {
        let (rows, cols) = w.dim();
        if rows != cols {
            return Err(ReservoirErr::NotSquare { rows, cols });
        }

        Ok(Self { w, activation })
    }

    pub fn n_nodes(&self) -> usize {
        self.w.nrows()
    }

    /// Runs the network from a zero state, `x(t) = f(x(t - 1) W + u(t) W_in)`.
    ///
    /// # Arguments
    /// * `ext_input` - The external input, `[n_steps, n_inputs]`.
    /// * `w_in` - The input projection, `[n_inputs, n_nodes]`.
    /// * `output_nodes` - The nodes whose states are returned.
    ///
    /// # Returns
    /// The states of the output nodes at every step, `[n_steps, output_nodes.len()]`.
    pub fn simulate(
        &self,
        ext_input: ArrayView2<f64>,
        w_in: ArrayView2<f64>,
        output_nodes: &[usize],
    ) -> Result<Array2<f64>> {
        let n = self.n_nodes();

        if w_in.nrows() != ext_input.ncols() {
            return Err(ReservoirErr::DimensionMismatch {
                what: "input projection rows",
                expected: ext_input.ncols(),
                got: w_in.nrows(),
            });
        }

        if w_in.ncols() != n {
            return Err(ReservoirErr::DimensionMismatch {
                what: "input projection columns",
                expected: n,
                got: w_in.ncols(),
            });
        }

        if let Some(&node) = output_nodes.iter().find(|&&node| node >= n) {
            return Err(ReservoirErr::InvalidParameter(format!(
                "output node {node} is out of bounds for a network of {n} nodes"
            )));
        }

        let drive = ext_input.dot(&w_in);
        let mut state: Array1<f64> = Array1::zeros(n);
        let mut states: Array2<f64> = Array2::zeros((ext_input.nrows(), output_nodes.len()));

        for (u, mut out) in drive.outer_iter().zip(states.outer_iter_mut()) {
            state = (state.dot(&self.w) + u).mapv(|x| self.activation.apply(x));
            for (dst, &node) in out.iter_mut().zip(output_nodes) {
                *dst = state[node];
            }
        }

        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn linear_dynamics_accumulate_the_input() {
        let esn = EchoStateNetwork::new(array![[0.5]], Activation::Linear).unwrap();
        let u = array![[1.0], [0.0], [0.0]];

        let states = esn.simulate(u.view(), array![[1.0]].view(), &[0]).unwrap();
        assert_eq!(states, array![[1.0], [0.5], [0.25]]);
    }

    #[test]
    fn only_output_nodes_are_returned() {
        let w = array![[0.0, 1.0], [1.0, 0.0]];
        let esn = EchoStateNetwork::new(w, Activation::Tanh).unwrap();
        let u = array![[1.0], [0.0]];
        let w_in = array![[1.0, 0.0]];

        let states = esn.simulate(u.view(), w_in.view(), &[1]).unwrap();
        assert_eq!(states.shape(), [2, 1]);
        assert_eq!(states[[0, 0]], 0.0);
        assert!((states[[1, 0]] - 1.0f64.tanh().tanh()).abs() < 1e-12);
    }

    #[test]
    fn mismatched_projections_are_rejected() {
        let esn = EchoStateNetwork::new(Array2::zeros((3, 3)), Activation::Tanh).unwrap();
        let u = Array2::<f64>::zeros((5, 1));

        assert!(matches!(
            esn.simulate(u.view(), Array2::<f64>::zeros((1, 2)).view(), &[0]),
            Err(ReservoirErr::DimensionMismatch { .. })
        ));
        assert!(matches!(
            esn.simulate(u.view(), Array2::<f64>::zeros((1, 3)).view(), &[3]),
            Err(ReservoirErr::InvalidParameter(_))
        ));
    }

    #[test]
    fn activations() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Linear.apply(-2.0), -2.0);
    }
}
