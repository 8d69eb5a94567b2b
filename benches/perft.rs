/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use prodigy::{
    perft, Algorithm, Position, SearchConfig, FEN_KIWIPETE, FEN_POSITION_3, FEN_POSITION_4,
    FEN_POSITION_5, FEN_STARTPOS,
};

struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: FEN_STARTPOS,
        expected_nodes: &[20, 400, 8902, 197_281],
    },
    BenchCase {
        name: "kiwipete",
        fen: FEN_KIWIPETE,
        expected_nodes: &[48, 2039, 97_862],
    },
    BenchCase {
        name: "position_3",
        fen: FEN_POSITION_3,
        expected_nodes: &[14, 191, 2812, 43_238],
    },
    BenchCase {
        name: "position_4",
        fen: FEN_POSITION_4,
        expected_nodes: &[6, 264, 9467],
    },
    BenchCase {
        name: "position_5",
        fen: FEN_POSITION_5,
        expected_nodes: &[44, 1486, 62_379],
    },
];

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for case in CASES {
        let position = Position::from_fen(case.fen).unwrap();
        let depth = case.expected_nodes.len();
        let expected = case.expected_nodes[depth - 1];

        // Correctness guard before benchmarking
        assert_eq!(perft(&position, depth).unwrap(), expected, "{}", case.name);

        group.throughput(Throughput::Elements(expected));
        group.bench_with_input(
            BenchmarkId::new(case.name, depth),
            &position,
            |b, position| b.iter(|| perft(black_box(position), black_box(depth)).unwrap()),
        );
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    const SIMULATIONS: u32 = 10_000;

    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    group.throughput(Throughput::Elements(SIMULATIONS as u64));

    for threads in [1, 2, 4] {
        let config = SearchConfig {
            threads,
            arena_bytes: 1 << 25,
            ..Default::default()
        };
        let position = Position::from_fen(FEN_KIWIPETE).unwrap();

        group.bench_with_input(BenchmarkId::new("kiwipete", threads), &config, |b, config| {
            let mut algorithm = Algorithm::from_config(config);
            b.iter(|| {
                algorithm.start(position, Some(SIMULATIONS)).unwrap();
                black_box(algorithm.join().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_search);
criterion_main!(benches);
