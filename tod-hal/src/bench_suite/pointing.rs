use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};

use crate::{
    api::{ContextNew, PointingDetector},
    config::Environment,
    layouts::{Backend, Context, DeviceManager, Staged},
    source::Source,
    test_suite::pointing::PointingFixture,
};

fn intervals(n_samp: usize, n_view: usize) -> Vec<(i64, i64)> {
    // n_view equal spans, each dropping its last tenth.
    let span: usize = n_samp / n_view;
    (0..n_view)
        .map(|i| {
            let first: usize = i * span;
            let last: usize = first + span - span / 10 - 1;
            (first as i64, last as i64)
        })
        .collect()
}

pub fn bench_pointing_detector<B: Backend>(c: &mut Criterion, label: &str)
where
    Context<B>: PointingDetector<B> + ContextNew<B>,
{
    bench_pointing_detector_with::<B>(c, label, false)
}

/// Same workload launched on the context's accelerator, with every
/// device-resident input staged once outside the timed loop.
pub fn bench_pointing_detector_offload<B: Backend>(c: &mut Criterion, label: &str)
where
    Context<B>: PointingDetector<B> + ContextNew<B>,
{
    bench_pointing_detector_with::<B>(c, label, true)
}

fn bench_pointing_detector_with<B: Backend>(c: &mut Criterion, label: &str, use_accel: bool)
where
    Context<B>: PointingDetector<B> + ContextNew<B>,
{
    let group_name: String = format!("pointing_detector::{label}");

    let mut group = c.benchmark_group(group_name);

    fn runner<B: Backend>(params: [usize; 3], use_accel: bool) -> impl FnMut()
    where
        Context<B>: PointingDetector<B> + ContextNew<B>,
    {
        let n_det: usize = params[0];
        let n_samp: usize = params[1];
        let n_view: usize = params[2];

        let env: Environment = Environment::default();
        let mut ctx: Context<B> = Context::<B>::new(&env).expect("context creation failed");

        let mut source: Source = Source::new([0u8; 32]);
        let mut fx: PointingFixture = PointingFixture::random(&mut source, n_det, n_det, n_samp, &intervals(n_samp, n_view));

        let mut staged: Vec<Staged> = Vec::new();
        if use_accel {
            let devices: &mut DeviceManager = ctx.devices_mut();
            staged.push(devices.stage("boresight", &fx.boresight).expect("staging failed"));
            staged.push(devices.stage("quats", &fx.quats).expect("staging failed"));
            staged.push(devices.stage("intervals", &fx.intervals).expect("staging failed"));
            staged.push(devices.stage("shared_flags", &fx.flags).expect("staging failed"));
        }

        move || {
            let _staged: &Vec<Staged> = &staged;
            fx.run(&ctx, 0x01, use_accel).expect("pointing failed");
            black_box(());
        }
    }

    for params in [[1, 1 << 16, 1], [16, 1 << 16, 8], [64, 1 << 16, 8], [256, 1 << 14, 16]] {
        let id: BenchmarkId = BenchmarkId::from_parameter(format!("{}x{}/{}", params[0], params[1], params[2]));
        let mut runner = runner::<B>(params, use_accel);
        group.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
    }

    group.finish();
}
