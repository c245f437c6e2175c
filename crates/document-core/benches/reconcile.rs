use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use document_core::{Diagnostic, DiagnosticList, Severity, diff, make_errors_like};

fn diagnostics(count: usize, salt: usize) -> Vec<Diagnostic> {
    (0..count)
        .map(|i| {
            let severity = match (i * 7 + salt) % 3 {
                0 => Severity::Info,
                1 => Severity::Warning,
                _ => Severity::Error,
            };
            Diagnostic::new(format!("problem #{}", (i * 31 + salt) % (count / 2 + 1)), severity)
        })
        .collect()
}

fn bench_diff_mostly_equal(c: &mut Criterion) {
    let current = diagnostics(500, 0);
    let mut desired = current.clone();
    desired[250] = Diagnostic::error("new problem");
    desired.remove(100);
    c.bench_function("diff/500_one_edit", |b| {
        b.iter(|| black_box(diff(black_box(&current), black_box(&desired))))
    });
}

fn bench_diff_disjoint(c: &mut Criterion) {
    let current = diagnostics(200, 0);
    let desired = diagnostics(200, 1);
    c.bench_function("diff/200_disjoint", |b| {
        b.iter(|| black_box(diff(black_box(&current), black_box(&desired))))
    });
}

fn bench_make_errors_like(c: &mut Criterion) {
    let current = diagnostics(300, 0);
    let desired = diagnostics(300, 2);
    c.bench_function("make_errors_like/300", |b| {
        b.iter_batched(
            || (DiagnosticList::from_vec(current.clone()), desired.clone()),
            |(mut list, desired)| {
                make_errors_like(&mut list, desired);
                black_box(list.take_changes().len())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_diff_mostly_equal,
    bench_diff_disjoint,
    bench_make_errors_like
);
criterion_main!(benches);
