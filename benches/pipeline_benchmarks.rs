//! Performance benchmarks for the sable pipeline.
//!
//! - Compilation: parse, prescan and codegen of the sample scripts
//! - Execution: running precompiled programs on a reused VM
//!
//! With `--features profile-with-puffin` every iteration closes a puffin
//! frame, so the parser, compiler and VM scopes can be inspected with a
//! puffin viewer.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use sable::{Vm, compile};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

const LOOP_SUM: &str = "func main() => int64 {
    let total: int64 = 0;
    for (let i: int32 = 0; i < 10000; i = i + 1) {
        total = total + i;
    }
    return total;
}
";

fn compile_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("compile");

    let scripts = [
        ("hello", include_str!("../test_scripts/hello.sbl")),
        ("lists", include_str!("../test_scripts/lists.sbl")),
        ("strings", include_str!("../test_scripts/strings.sbl")),
        ("nested_loops", include_str!("../test_scripts/nested_loops.sbl")),
    ];
    for (name, source) in scripts {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let len = compile(black_box(source)).map(|p| p.len());
                end_profiling_frame();
                black_box(len)
            });
        });
    }

    group.finish();
}

fn exec_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("exec");

    let fib = compile(include_str!("../test_scripts/fibonacci.sbl")).expect("fibonacci compiles");
    let factorial =
        compile(include_str!("../test_scripts/factorial.sbl")).expect("factorial compiles");
    let loop_sum = compile(LOOP_SUM).expect("loop compiles");

    let mut vm = Vm::new();
    group.bench_function("fib_50_iterative", |b| {
        b.iter(|| {
            let result = vm.exec(black_box(&fib));
            end_profiling_frame();
            black_box(result)
        });
    });
    group.bench_function("factorial_20_recursive", |b| {
        b.iter(|| {
            let result = vm.exec(black_box(&factorial));
            end_profiling_frame();
            black_box(result)
        });
    });
    group.bench_function("loop_sum_10000", |b| {
        b.iter(|| {
            let result = vm.exec(black_box(&loop_sum));
            end_profiling_frame();
            black_box(result)
        });
    });

    group.finish();
}

criterion_group!(benches, compile_benchmarks, exec_benchmarks);
criterion_main!(benches);
