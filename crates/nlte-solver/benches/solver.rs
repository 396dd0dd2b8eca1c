//! Benchmarks for the per-shell Newton solve.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::DVector;
use nlte_core::{ElementRates, RateMatrixIndex, ShellInput, SpeciesKey};
use nlte_solver::{ConvergenceCriteria, ShellProblem};

fn shell_input(index: &RateMatrixIndex) -> ShellInput {
    let blocks = index.blocks();
    ShellInput {
        shell: 0,
        saha: blocks
            .iter()
            .map(|b| DVector::from_fn(b.atomic_number as usize, |i, _| 1.0e12 / 10f64.powi(i as i32)))
            .collect(),
        rates: blocks
            .iter()
            .map(|b| {
                let z = b.atomic_number as usize;
                ElementRates {
                    photo_ion: DVector::from_element(z, 1.0e-2),
                    rad_recomb: DVector::from_element(z, 2.0e-13),
                    coll_ion: DVector::from_element(z, 1.0e-12),
                    coll_recomb: DVector::from_element(z, 1.0e-25),
                }
            })
            .collect(),
        number_density: DVector::from_fn(blocks.len(), |i, _| 1.0e10 / 10f64.powi(i as i32)),
    }
}

fn bench_shell_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("shell_solve");
    let criteria = ConvergenceCriteria::default();

    for elements in [vec![1], vec![1, 2], vec![1, 2, 6]] {
        let nlte: Vec<SpeciesKey> = elements
            .iter()
            .filter(|&&z| z > 1)
            .map(|&z| SpeciesKey::new(z, 0))
            .collect();
        let index = RateMatrixIndex::new(&elements, &nlte, &[]).unwrap();
        let input = shell_input(&index);

        group.bench_with_input(
            BenchmarkId::from_parameter(index.len()),
            &input,
            |bencher, input| {
                let problem = ShellProblem::new(&index, input);
                bencher.iter(|| problem.solve(black_box(&criteria), None));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_shell_solve);
criterion_main!(benches);
