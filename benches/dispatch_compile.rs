use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wordstore::{render, DispatchCase, DispatchCases, DispatchTree, Session, WordCodec};

fn command_cases(count: usize) -> DispatchCases {
    let cases = (0..count)
        .map(|i| DispatchCase::new(format!("command_{:04}", i), format!("run_{}();", i)))
        .collect();
    DispatchCases::new(cases, Some("unknown();".to_string())).unwrap()
}

fn bench_dispatch_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_compile");
    let codec = WordCodec::default();

    for count in [4, 32, 256, 2048] {
        group.bench_with_input(BenchmarkId::new("cases", count), &count, |b, &count| {
            b.iter_batched(
                || command_cases(count),
                |cases| DispatchTree::compile(&codec, cases).unwrap(),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_dispatch_select(c: &mut Criterion) {
    let codec = WordCodec::default();
    let tree = DispatchTree::compile(&codec, command_cases(2048)).unwrap();

    c.bench_function("dispatch_select_2048", |b| {
        b.iter(|| tree.select_str(black_box("command_1337")).unwrap());
    });
}

fn bench_dispatch_render(c: &mut Criterion) {
    let mut session = Session::new();
    let program = session
        .compile_dispatch("s_ptr", "s_len", command_cases(256))
        .unwrap();

    c.bench_function("dispatch_render_256", |b| {
        b.iter(|| render::dispatch(black_box(&program)));
    });
}

fn bench_disk_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("disk_export");

    for file_kb in [1, 64, 512] {
        group.bench_with_input(
            BenchmarkId::new("file_kb", file_kb),
            &file_kb,
            |b, &file_kb| {
                b.iter(|| {
                    let mut session = Session::new();
                    session.register_disk("bench", 0).unwrap();
                    for i in 0..4 {
                        session
                            .add_file_bytes("bench", &format!("f{}", i), vec![0xAB; file_kb * 1024])
                            .unwrap();
                    }
                    session.export_disk("bench").unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch_compile,
    bench_dispatch_select,
    bench_dispatch_render,
    bench_disk_export
);
criterion_main!(benches);
