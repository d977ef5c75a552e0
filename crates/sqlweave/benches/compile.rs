use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlweave::prelude::*;
use sqlweave::qb::SelectQb;

/// SELECT col0, col1, ... FROM t WHERE col0 = ? AND col1 = ? ...
fn build_select(n: usize) -> SelectQb {
    let mut q = qb::select("t u");
    for i in 0..n {
        q = q.column(&format!("u.col{i}")).eq(&format!("u.col{i}"), i as i64);
    }
    q
}

fn bench_compile_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/select");
    let compilers = [
        ("postgres", SqlCompiler::new(Arc::new(Postgres))),
        ("mysql", SqlCompiler::new(Arc::new(MySql))),
    ];

    for n in [1, 5, 10, 50, 100] {
        let draft = build_select(n);
        for (name, compiler) in &compilers {
            group.bench_with_input(BenchmarkId::new(*name, n), &draft, |b, draft| {
                b.iter(|| black_box(compiler.compile(draft)));
            });
        }
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/in_list");
    let compiler = SqlCompiler::new(Arc::new(Postgres));

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let draft = qb::select("t").in_list("id", values.iter().copied());
                black_box(compiler.compile(&draft))
            });
        });
    }

    group.finish();
}

fn bench_batch_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/batch_insert");
    let compiler = SqlCompiler::new(Arc::new(Sqlite));

    for rows in [10, 100, 1000] {
        let mut draft = qb::batch_insert("events");
        for i in 0..rows {
            draft = draft.row([("kind", Value::from("click")), ("n", Value::Int(i))]);
        }
        group.bench_with_input(BenchmarkId::from_parameter(rows), &draft, |b, draft| {
            b.iter(|| black_box(compiler.compile_batch_insert_chunks(draft)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile_select, bench_in_list, bench_batch_insert);
criterion_main!(benches);
