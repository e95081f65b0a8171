use std::collections::HashMap;

use criterion::{BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use yao2pc::{
    cipher::Aes128Ecb,
    circuit::{Circuit, Gate},
    garble::{GarbleMode, LocalTransfer, evaluate_garbled, garble, garble_with_mode},
    protocol::simulate_2pc_with,
    rps::{self, Hand},
};

/// Bitwise equality of two `n` bit numbers, reduced to a single output.
fn equality_circuit(n: u32) -> (Circuit<u32>, HashMap<u32, bool>, HashMap<u32, bool>) {
    let mut gates = vec![];
    let mut garbler = HashMap::new();
    let mut evaluator = HashMap::new();
    for i in 0..n {
        gates.push((i, Gate::Input));
        gates.push((n + i, Gate::Input));
        garbler.insert(i, i % 3 == 0);
        evaluator.insert(n + i, i % 3 == 0);
    }
    let mut next = 2 * n;
    let mut eq = vec![];
    for i in 0..n {
        gates.push((next, Gate::xor(i, n + i)));
        gates.push((next + 1, Gate::nor(next, next)));
        eq.push(next + 1);
        next += 2;
    }
    while eq.len() > 1 {
        let mut reduced = vec![];
        for pair in eq.chunks(2) {
            match pair {
                [a, b] => {
                    gates.push((next, Gate::and(*a, *b)));
                    reduced.push(next);
                    next += 1;
                }
                [a] => reduced.push(*a),
                _ => unreachable!(),
            }
        }
        eq = reduced;
    }
    let circuit = Circuit::new(gates, eq).expect("equality circuit is valid");
    (circuit, garbler, evaluator)
}

pub fn garble_benchmarks(c: &mut Criterion) {
    let mut g = c.benchmark_group("garble");
    let mut rng = ChaCha20Rng::seed_from_u64(42);

    for n in [8, 32, 128] {
        let (circuit, garbler, evaluator) = equality_circuit(n);
        g.bench_function(BenchmarkId::new("garble equality", n), |b| {
            b.iter(|| garble(&circuit, &garbler, &Aes128Ecb, &mut rng).expect("garbling failed"))
        });

        // garbler provides all inputs, so only table decryption is measured
        let mut all = garbler.clone();
        all.extend(evaluator.iter().map(|(k, v)| (*k, *v)));
        g.bench_function(BenchmarkId::new("garble equality free-xor", n), |b| {
            b.iter(|| {
                garble_with_mode(&circuit, &all, GarbleMode::FreeXor, &Aes128Ecb, &mut rng)
                    .expect("garbling failed")
            })
        });
        let garbling = garble(&circuit, &all, &Aes128Ecb, &mut rng).expect("garbling failed");
        g.bench_function(BenchmarkId::new("evaluate equality", n), |b| {
            b.iter(|| {
                let mut transfer = LocalTransfer::new(&garbling, ChaCha20Rng::seed_from_u64(0));
                evaluate_garbled(
                    &circuit,
                    garbling.garbled_circuit(),
                    &HashMap::new(),
                    &mut transfer,
                    &Aes128Ecb,
                    &mut rng,
                )
                .expect("evaluation failed")
            })
        });
    }

    let circuit = rps::circuit().expect("rps circuit is valid");
    let first = rps::first_inputs(Hand::Rock);
    let second = rps::second_inputs(Hand::Scissors);
    g.bench_function("rock-paper-scissors 2PC", |b| {
        b.iter(|| {
            simulate_2pc_with(&circuit, &first, &second, &Aes128Ecb, &mut rng)
                .expect("2PC failed")
        })
    });
}
