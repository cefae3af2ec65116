//! Benchmarks for argument matrix expansion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fatarch::matrix::{expand, ArgumentMatrix, CandidateOption, ExpandMode, OptionGroup};
use fatarch::resolver::{self, Target};

fn synthetic(groups: usize, width: usize) -> ArgumentMatrix {
    let groups = (0..groups)
        .map(|g| {
            OptionGroup::tiered(
                format!("g{g}"),
                (0..width)
                    .map(|c| CandidateOption::new([format!("-g{g}c{c}")]).suffix(format!("g{g}c{c}")))
                    .collect(),
            )
        })
        .collect();
    ArgumentMatrix::new(groups).unwrap_or_default()
}

fn bench_toolchain_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("toolchain_matrix");

    for (arch, compiler) in [("x86_64", "gcc"), ("x86_32", "gcc"), ("x86_64", "msvc")] {
        let (Ok(cpu), Ok(profile)) = (
            resolver::processor(Target::Named(arch)),
            resolver::toolchain(Target::Named(compiler), None),
        ) else {
            continue;
        };
        let Ok(matrix) = profile.argument_matrix(&cpu) else {
            continue;
        };
        group.bench_function(BenchmarkId::new(compiler, arch), |b| {
            b.iter(|| black_box(expand(black_box(&matrix), ExpandMode::All)));
        });
    }

    group.finish();
}

fn bench_synthetic_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthetic_expand");

    for groups in [2usize, 4, 6] {
        let matrix = synthetic(groups, 4);
        group.throughput(Throughput::Elements(4u64.pow(groups as u32)));
        for mode in [ExpandMode::All, ExpandMode::CurrentMachine] {
            group.bench_with_input(BenchmarkId::new(mode.to_string(), groups), &matrix, |b, m| {
                b.iter(|| black_box(expand(m, mode)));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_toolchain_matrix, bench_synthetic_expand);
criterion_main!(benches);
