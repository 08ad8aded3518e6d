//! Criterion benchmarks for the tycoon step loop.
//!
//! Two benchmark groups:
//! - `step`: one tick of a factory with every machine kind owned
//! - `persistence`: encoding and decoding the save document of that factory

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tycoon_core::resource::ResourceKind;
use tycoon_data::Catalog;
use tycoon_sim::serialize::{decode, encode};
use tycoon_sim::{MemoryStore, SimConfig, Simulator};

// ===========================================================================
// Factory builders
// ===========================================================================

/// Every catalog machine, `copies` times over, with plenty of every input.
fn build_factory(copies: usize) -> Simulator {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let mut config = SimConfig::seeded(7);
    config.autosave_interval_ticks = 0;
    let mut sim = Simulator::with_config(catalog, MemoryStore::new(), config);

    let definitions = sim.catalog().machines().to_vec();
    let state = sim.state_mut();
    for def in &definitions {
        for _ in 0..copies {
            state.machines.insert(def.instantiate());
        }
    }
    for kind in ResourceKind::ALL {
        state.resources.set(kind, 1e12);
    }
    sim
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    group.sample_size(50);

    let mut sim = build_factory(100);
    group.bench_function("900_machines", |b| {
        b.iter(|| black_box(sim.step()));
    });

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");
    group.sample_size(30);

    let sim = build_factory(100);
    let document = encode(sim.state()).expect("encode");

    group.bench_function("encode_900_machines", |b| {
        b.iter(|| black_box(encode(sim.state()).expect("encode")));
    });
    group.bench_function("decode_900_machines", |b| {
        b.iter(|| black_box(decode(&document, sim.catalog()).expect("decode")));
    });

    group.finish();
}

criterion_group!(benches, bench_step, bench_persistence);
criterion_main!(benches);
