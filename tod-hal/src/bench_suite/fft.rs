use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};

use crate::{
    api::{ContextNew, FftPlanAlloc},
    config::Environment,
    layouts::{Backend, Context, Direction, FftPlan, PlanQuality},
    oep::FftExecImpl,
    source::Source,
};

pub fn bench_fft_forward<B: Backend>(c: &mut Criterion, label: &str)
where
    Context<B>: FftPlanAlloc<B> + ContextNew<B>,
    B: FftExecImpl<B>,
{
    bench_fft::<B>(c, label, Direction::Forward)
}

pub fn bench_fft_backward<B: Backend>(c: &mut Criterion, label: &str)
where
    Context<B>: FftPlanAlloc<B> + ContextNew<B>,
    B: FftExecImpl<B>,
{
    bench_fft::<B>(c, label, Direction::Backward)
}

fn bench_fft<B: Backend>(c: &mut Criterion, label: &str, direction: Direction)
where
    Context<B>: FftPlanAlloc<B> + ContextNew<B>,
    B: FftExecImpl<B>,
{
    let group_name: String = format!("fft_{direction}::{label}");

    let mut group = c.benchmark_group(group_name);

    fn runner<B: Backend>(params: [usize; 2], direction: Direction) -> impl FnMut()
    where
        Context<B>: FftPlanAlloc<B> + ContextNew<B>,
        B: FftExecImpl<B>,
    {
        let length: usize = params[0];
        let n_batch: usize = params[1];

        let env: Environment = Environment::default();
        let ctx: Context<B> = Context::<B>::new(&env).expect("context creation failed");
        let scale: f64 = match direction {
            Direction::Forward => 1.0,
            Direction::Backward => 1.0 / length as f64,
        };
        let mut plan: FftPlan<B> = ctx
            .fft_plan_alloc(length, n_batch, PlanQuality::Exhaustive, direction, scale)
            .expect("plan allocation failed");

        let mut source: Source = Source::new([0u8; 32]);
        for i in 0..n_batch {
            match direction {
                Direction::Forward => source.fill_normal(0.0, 1.0, plan.tdata_mut(i)),
                Direction::Backward => source.fill_normal(0.0, 1.0, plan.fdata_mut(i)),
            }
        }

        move || {
            plan.exec();
            black_box(());
        }
    }

    for params in [[1 << 10, 16], [1 << 14, 16], [1 << 16, 4], [3 * 1000, 16]] {
        let id: BenchmarkId = BenchmarkId::from_parameter(format!("{}x{}", params[0], params[1]));
        let mut runner = runner::<B>(params, direction);
        group.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
    }

    group.finish();
}
