use criterion::{Criterion, criterion_group, criterion_main};
use tod_cpu_ref::CpuRef;
use tod_hal::bench_suite::pointing::bench_pointing_detector;

fn bench_pointing_detector_cpu_ref(c: &mut Criterion) {
    bench_pointing_detector::<CpuRef>(c, "cpu_ref");
}

criterion_group!(benches, bench_pointing_detector_cpu_ref);
criterion_main!(benches);
