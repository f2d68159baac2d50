#![feature(test)]
extern crate test;

use roofdual::{fix_variables, FixMode, QuadraticModel};
use std::time::SystemTime;

fn make_bench_model(size: usize, density: f64) -> QuadraticModel {
    let current_time = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());

    let mut prng = smolprng::PRNG {
        generator: smolprng::JsfLarge::new(current_time),
    };

    QuadraticModel::make_random_model(size, &mut prng, density)
}

#[bench]
fn bench_fix_variables_standard(b: &mut test::Bencher) {
    const SIZE: usize = 1024;

    let p = make_bench_model(SIZE, 0.01);

    b.iter(|| fix_variables(&p, FixMode::Standard))
}

#[bench]
fn bench_fix_variables_strong(b: &mut test::Bencher) {
    const SIZE: usize = 256;

    let p = make_bench_model(SIZE, 0.02);

    b.iter(|| fix_variables(&p, FixMode::Strong))
}
