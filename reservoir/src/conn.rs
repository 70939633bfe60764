use std::fmt::{self, Display};

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ReservoirErr, Result};

const POWER_ITERS: usize = 5000;
const POWER_BURN_IN: usize = 20;
const POWER_CHECK_EVERY: usize = 50;
const POWER_TOL: f64 = 1e-10;

/// The part a node plays when the network is used as a reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Receives the external input.
    Input,
    /// Its state is read out.
    Output,
    Other,
}

/// A selection of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSet {
    All,
    Role(NodeRole),
}

impl Display for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSet::All => f.write_str("all"),
            NodeSet::Role(role) => write!(f, "{role:?}"),
        }
    }
}

/// A weighted network with a role assigned to each node.
#[derive(Debug, Clone, PartialEq)]
pub struct Conn {
    w: Array2<f64>,
    roles: Vec<NodeRole>,
}

impl Conn {
    /// Creates a new `Conn`.
    ///
    /// # Arguments
    /// * `w` - The square weight matrix, `w[[i, j]]` being the weight from node `i` to node `j`.
    /// * `roles` - The role of each node.
    ///
    /// # Returns
    /// The network or an error if the matrix isn't square, has non finite weights, or the roles
    /// don't cover every node.
    pub fn new(w: Array2<f64>, roles: Vec<NodeRole>) -> Result<Self> {
        let (rows, cols) = w.dim();
        if rows != cols {
            return Err(ReservoirErr::NotSquare { rows, cols });
        }

        if roles.len() != rows {
            return Err(ReservoirErr::DimensionMismatch {
                what: "node roles",
                expected: rows,
                got: roles.len(),
            });
        }

        if w.iter().any(|v| !v.is_finite()) {
            return Err(ReservoirErr::InvalidParameter(
                "the weight matrix has NaN or infinite entries".into(),
            ));
        }

        Ok(Self { w, roles })
    }

    pub fn w(&self) -> &Array2<f64> {
        &self.w
    }

    pub fn roles(&self) -> &[NodeRole] {
        &self.roles
    }

    pub fn n_nodes(&self) -> usize {
        self.w.nrows()
    }

    /// The amount of undirected edges, self loops excluded.
    pub fn n_edges(&self) -> usize {
        self.edges().len()
    }

    /// Returns the indices of the nodes in `set`, in ascending order.
    ///
    /// # Returns
    /// The indices or an empty node set error.
    pub fn get_nodes(&self, set: NodeSet) -> Result<Vec<usize>> {
        let nodes: Vec<usize> = match set {
            NodeSet::All => (0..self.n_nodes()).collect(),
            NodeSet::Role(role) => self
                .roles
                .iter()
                .enumerate()
                .filter_map(|(i, r)| (*r == role).then_some(i))
                .collect(),
        };

        if nodes.is_empty() {
            return Err(ReservoirErr::EmptyNodeSet(set));
        }

        Ok(nodes)
    }

    /// Scales the weights into `[-1, 1]` and then normalizes them by the spectral radius, leaving
    /// a network with a spectral radius of one.
    ///
    /// # Returns
    /// An error if the network has no weights or its spectral radius is zero.
    pub fn scale_and_normalize(&mut self) -> Result<()> {
        let max = self.w.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if max == 0.0 {
            return Err(ReservoirErr::InvalidParameter(
                "can't normalize a network without weights".into(),
            ));
        }
        self.w /= max;

        let radius = spectral_radius(self.w.view());
        if !(radius > 0.0) {
            return Err(ReservoirErr::InvalidParameter(
                "can't normalize a network with a spectral radius of zero".into(),
            ));
        }
        self.w /= radius;

        debug!(max = max, radius = radius; "scaled and normalized the network");
        Ok(())
    }

    /// Creates a randomized copy of this network that keeps the degree of every node.
    ///
    /// Pairs of edges `(a, b)` and `(c, d)` are rewired into `(a, d)` and `(c, b)` whenever the
    /// four nodes are distinct and the new edges don't exist yet, the weights travel with the
    /// edges. Every edge is attempted to be rewired `swaps` times on average.
    ///
    /// # Arguments
    /// * `swaps` - The amount of rewiring attempts per edge.
    /// * `rng` - The random number generator driving the rewiring.
    ///
    /// # Returns
    /// The randomized network or an error if the network isn't undirected.
    pub fn randomize<R: Rng>(&self, swaps: usize, rng: &mut R) -> Result<Conn> {
        if !is_symmetric(self.w.view()) {
            return Err(ReservoirErr::InvalidParameter(
                "degree preserving randomization needs an undirected (symmetric) network".into(),
            ));
        }

        let mut w = self.w.clone();
        let mut edges = self.edges();
        let n = self.n_nodes();
        let k = edges.len();

        if k < 2 {
            warn!(n_edges = k; "the network has too few edges to be rewired");
            return Ok(self.clone());
        }

        let max_attempts = ((n * k) as f64 / (n * (n - 1)) as f64).round().max(1.0) as usize;
        let mut rewired = 0;

        for _ in 0..swaps * k {
            for _ in 0..max_attempts {
                let e1 = rng.random_range(0..k);
                let e2 = loop {
                    let e2 = rng.random_range(0..k);
                    if e2 != e1 {
                        break e2;
                    }
                };

                let (a, b) = edges[e1];
                let (mut c, mut d) = edges[e2];
                if rng.random_bool(0.5) {
                    std::mem::swap(&mut c, &mut d);
                }

                if a == c || a == d || b == c || b == d {
                    continue;
                }

                if w[[a, d]] != 0.0 || w[[c, b]] != 0.0 {
                    continue;
                }

                w[[a, d]] = w[[a, b]];
                w[[d, a]] = w[[b, a]];
                w[[a, b]] = 0.0;
                w[[b, a]] = 0.0;

                w[[c, b]] = w[[c, d]];
                w[[b, c]] = w[[d, c]];
                w[[c, d]] = 0.0;
                w[[d, c]] = 0.0;

                edges[e1] = (a, d);
                edges[e2] = (c, b);
                rewired += 1;
                break;
            }
        }

        debug!(n_edges = k, rewired = rewired; "randomized the network");
        Ok(Conn {
            w,
            roles: self.roles.clone(),
        })
    }

    fn edges(&self) -> Vec<(usize, usize)> {
        let n = self.n_nodes();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.w[[i, j]] != 0.0 || self.w[[j, i]] != 0.0)
            .collect()
    }
}

fn is_symmetric(w: ArrayView2<f64>) -> bool {
    let scale = w.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let tol = 1e-12 * scale.max(1.0);
    w.indexed_iter().all(|((i, j), v)| (v - w[[j, i]]).abs() <= tol)
}

/// Estimates the greatest absolute eigenvalue of `w` by power iteration.
///
/// The estimate is the geometric mean of the growth of the iterate, which also settles when
/// the dominant eigenvalues come in pairs of opposite sign.
fn spectral_radius(w: ArrayView2<f64>) -> f64 {
    let n = w.nrows();
    let mut v = Array1::from_shape_fn(n, |i| 1.0 + 0.5 * ((i + 1) as f64).sin());
    v /= v.dot(&v).sqrt();

    let mut log_growth = 0.0;
    let mut steps = 0;
    let mut estimate = 0.0;

    for iter in 0..POWER_ITERS {
        let next = w.dot(&v);
        let norm = next.dot(&next).sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        v = next / norm;

        if iter < POWER_BURN_IN {
            continue;
        }

        log_growth += norm.ln();
        steps += 1;

        if steps % POWER_CHECK_EVERY == 0 {
            let current = (log_growth / steps as f64).exp();
            if (current - estimate).abs() <= POWER_TOL * current {
                return current;
            }
            estimate = current;
        }
    }

    (log_growth / steps.max(1) as f64).exp()
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn ring(n: usize) -> Conn {
        let mut w = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            let j = (i + 1) % n;
            w[[i, j]] = (i + 1) as f64;
            w[[j, i]] = (i + 1) as f64;
        }

        let roles = (0..n)
            .map(|i| if i == 0 { NodeRole::Input } else { NodeRole::Output })
            .collect();
        Conn::new(w, roles).unwrap()
    }

    fn degrees(w: &Array2<f64>) -> Vec<usize> {
        w.rows()
            .into_iter()
            .map(|row| row.iter().filter(|v| **v != 0.0).count())
            .collect()
    }

    #[test]
    fn rejects_non_square_matrices() {
        let err = Conn::new(Array2::zeros((2, 3)), vec![NodeRole::Other; 2]).unwrap_err();
        assert_eq!(err, ReservoirErr::NotSquare { rows: 2, cols: 3 });
    }

    #[test]
    fn roles_must_cover_every_node() {
        let err = Conn::new(Array2::zeros((3, 3)), vec![NodeRole::Other; 2]).unwrap_err();
        assert!(matches!(err, ReservoirErr::DimensionMismatch { .. }));
    }

    #[test]
    fn nodes_are_selected_by_role() {
        let conn = ring(4);
        assert_eq!(conn.get_nodes(NodeSet::All).unwrap(), [0, 1, 2, 3]);
        assert_eq!(conn.get_nodes(NodeSet::Role(NodeRole::Input)).unwrap(), [0]);
        assert_eq!(
            conn.get_nodes(NodeSet::Role(NodeRole::Output)).unwrap(),
            [1, 2, 3]
        );
        assert_eq!(
            conn.get_nodes(NodeSet::Role(NodeRole::Other)),
            Err(ReservoirErr::EmptyNodeSet(NodeSet::Role(NodeRole::Other)))
        );
    }

    #[test]
    fn normalized_networks_have_unit_spectral_radius() {
        // Eigenvalues 3 and -1.
        let w = array![[1.0, 2.0], [2.0, 1.0]];
        let mut conn = Conn::new(w, vec![NodeRole::Input, NodeRole::Output]).unwrap();
        conn.scale_and_normalize().unwrap();

        let expected = array![[1.0, 2.0], [2.0, 1.0]] / 3.0;
        for (a, b) in conn.w().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn bipartite_networks_are_normalized() {
        // Eigenvalues 1 and -1, plain power iteration would oscillate.
        let w = array![[0.0, 4.0], [4.0, 0.0]];
        let mut conn = Conn::new(w, vec![NodeRole::Input, NodeRole::Output]).unwrap();
        conn.scale_and_normalize().unwrap();

        assert!((conn.w()[[0, 1]] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_networks_cant_be_normalized() {
        let mut conn = Conn::new(Array2::zeros((2, 2)), vec![NodeRole::Other; 2]).unwrap();
        assert!(matches!(
            conn.scale_and_normalize(),
            Err(ReservoirErr::InvalidParameter(_))
        ));
    }

    #[test]
    fn randomization_preserves_degrees_and_weights() {
        let conn = ring(12);
        let mut rng = StdRng::seed_from_u64(7);
        let null = conn.randomize(10, &mut rng).unwrap();

        assert_eq!(degrees(null.w()), degrees(conn.w()));
        assert_eq!(null.n_edges(), conn.n_edges());
        assert!(is_symmetric(null.w().view()));

        let mut before: Vec<f64> = conn.w().iter().copied().filter(|v| *v != 0.0).collect();
        let mut after: Vec<f64> = null.w().iter().copied().filter(|v| *v != 0.0).collect();
        before.sort_by(f64::total_cmp);
        after.sort_by(f64::total_cmp);
        assert_eq!(before, after);

        assert_ne!(null.w(), conn.w());
        assert_eq!(null.roles(), conn.roles());
    }

    #[test]
    fn randomization_is_reproducible_per_seed() {
        let conn = ring(10);
        let a = conn.randomize(5, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = conn.randomize(5, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn directed_networks_cant_be_randomized() {
        let w = array![[0.0, 1.0], [0.0, 0.0]];
        let conn = Conn::new(w, vec![NodeRole::Input, NodeRole::Output]).unwrap();

        assert!(matches!(
            conn.randomize(10, &mut StdRng::seed_from_u64(0)),
            Err(ReservoirErr::InvalidParameter(_))
        ));
    }
}
