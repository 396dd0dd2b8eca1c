//! Benchmarks for rate-matrix and Jacobian assembly.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::DVector;
use nlte_core::{
    ElementRates, JacobianBuilder, RateMatrixBuilder, RateMatrixIndex, ShellInput, SpeciesKey,
    first_guess,
};

const ELEMENTS: [u32; 5] = [1, 2, 6, 8, 26];

fn shell_input(index: &RateMatrixIndex) -> ShellInput {
    let blocks = index.blocks();
    ShellInput {
        shell: 0,
        saha: blocks
            .iter()
            .map(|b| DVector::from_fn(b.atomic_number as usize, |i, _| 1.0e8 / (i + 1) as f64))
            .collect(),
        rates: blocks
            .iter()
            .map(|b| {
                let z = b.atomic_number as usize;
                ElementRates {
                    photo_ion: DVector::from_element(z, 1.0e-3),
                    rad_recomb: DVector::from_element(z, 2.0e-12),
                    coll_ion: DVector::from_element(z, 3.0e-9),
                    coll_recomb: DVector::from_element(z, 5.0e-22),
                }
            })
            .collect(),
        number_density: DVector::from_fn(blocks.len(), |i, _| 1.0e10 / (i + 1) as f64),
    }
}

fn nlte_index(num_elements: usize) -> RateMatrixIndex {
    let elements = &ELEMENTS[..num_elements];
    let nlte: Vec<SpeciesKey> = elements
        .iter()
        .flat_map(|&z| (0..z).map(move |i| SpeciesKey::new(z, i)))
        .collect();
    RateMatrixIndex::new(elements, &nlte, &[]).unwrap()
}

fn bench_rate_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_matrix");

    for num_elements in [1, 3, 5] {
        let index = nlte_index(num_elements);
        let shell = shell_input(&index);
        group.bench_with_input(
            BenchmarkId::from_parameter(index.len()),
            &index,
            |bencher, index| {
                let builder = RateMatrixBuilder::new(index);
                bencher.iter(|| builder.build(black_box(&shell), black_box(1.0e10)));
            },
        );
    }

    group.finish();
}

fn bench_jacobian(c: &mut Criterion) {
    let mut group = c.benchmark_group("jacobian");

    for num_elements in [1, 3, 5] {
        let index = nlte_index(num_elements);
        let shell = shell_input(&index);
        let x = first_guess(&index, &shell);
        let matrix = RateMatrixBuilder::new(&index).build(&shell, x[index.electron_row()]);
        group.bench_with_input(
            BenchmarkId::from_parameter(index.len()),
            &index,
            |bencher, index| {
                let builder = JacobianBuilder::new(index);
                bencher.iter(|| builder.build(black_box(&x), black_box(&matrix), black_box(&shell)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_rate_matrix, bench_jacobian);
criterion_main!(benches);
