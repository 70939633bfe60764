use ndarray::{Array2, s};
use rand::{SeedableRng, rngs::StdRng};
use reservoir::{Activation, Conn, EchoStateNetwork, MemoryCapacity, NodeRole, NodeSet};

/// A ring of `n` nodes where every node also links to the one two steps ahead.
fn lattice(n: usize) -> Conn {
    let mut w = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for (step, weight) in [(1, 1.0), (2, 0.5)] {
            let j = (i + step) % n;
            w[[i, j]] = weight;
            w[[j, i]] = weight;
        }
    }

    let roles = (0..n)
        .map(|i| if i < 2 { NodeRole::Input } else { NodeRole::Output })
        .collect();
    Conn::new(w, roles).unwrap()
}

fn input_projection(conn: &Conn, n_inputs: usize) -> Array2<f64> {
    let mut w_in = Array2::<f64>::zeros((n_inputs, conn.n_nodes()));
    for node in conn.get_nodes(NodeSet::Role(NodeRole::Input)).unwrap() {
        w_in.column_mut(node).fill(1.0);
    }
    w_in
}

#[test]
fn impulses_fade_below_the_critical_scale() {
    let mut conn = lattice(12);
    conn.scale_and_normalize().unwrap();

    let esn = EchoStateNetwork::new(conn.w() * 0.5, Activation::Linear).unwrap();
    let mut impulse = Array2::<f64>::zeros((60, 1));
    impulse[[0, 0]] = 1.0;

    let outputs = conn.get_nodes(NodeSet::All).unwrap();
    let states = esn
        .simulate(impulse.view(), input_projection(&conn, 1).view(), &outputs)
        .unwrap();

    let energy = |t: usize| states.row(t).iter().map(|x| x * x).sum::<f64>();
    assert!(energy(0) > 0.0);
    assert!(energy(59) < energy(0) * 1e-6);
}

#[test]
fn null_networks_share_the_empirical_spectrum_scale() {
    let conn = lattice(16);
    let mut rng = StdRng::seed_from_u64(21);

    for _ in 0..3 {
        let mut null = conn.randomize(5, &mut rng).unwrap();
        assert_eq!(null.n_edges(), conn.n_edges());
        assert_eq!(null.roles(), conn.roles());

        null.scale_and_normalize().unwrap();
        assert!(null.w().iter().all(|w| w.is_finite()));
    }
}

#[test]
fn memory_capacity_states_stay_bounded() {
    let mut conn = lattice(10);
    conn.scale_and_normalize().unwrap();

    let task = MemoryCapacity {
        n_trials: 200,
        ..Default::default()
    };
    let (x, y) = task.fetch_data(&mut StdRng::seed_from_u64(4)).unwrap();
    assert_eq!(y.shape(), [200, 20]);

    let esn = EchoStateNetwork::new(conn.w() * 1.5, Activation::Tanh).unwrap();
    let outputs = conn.get_nodes(NodeSet::Role(NodeRole::Output)).unwrap();
    let states = esn
        .simulate(x.view(), input_projection(&conn, 1).view(), &outputs)
        .unwrap();

    assert_eq!(states.shape(), [200, 8]);
    assert!(states.iter().all(|s| s.abs() <= 1.0));
    assert!(states.slice(s![1.., ..]).iter().any(|s| *s != 0.0));
}
