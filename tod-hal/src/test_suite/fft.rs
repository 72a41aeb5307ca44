use crate::{
    api::FftPlanAlloc,
    error::Error,
    layouts::{Backend, Context, Direction, FftPlan, PlanQuality},
    oep::FftExecImpl,
    reference::fft::{DftTable, hc2r_ref, r2hc_ref},
    source::Source,
};

const LENGTH: usize = 64;
const N_BATCH: usize = 5;

fn fill_noise<B: Backend>(plan: &mut FftPlan<B>, source: &mut Source) {
    for i in 0..plan.n_batch() {
        source.fill_normal(0.0, 1.0, plan.tdata_mut(i));
    }
}

fn max_abs(x: &[f64]) -> f64 {
    x.iter().fold(0.0f64, |m, v| m.max(v.abs()))
}

fn assert_close_rel(a: &[f64], b: &[f64], rel: f64) {
    assert_eq!(a.len(), b.len());
    let tol: f64 = rel * max_abs(b).max(1.0);
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= tol, "element {i}: {x} != {y} (tol {tol})");
    }
}

/// Forward with scale 1 then backward with scale `1/length` recovers the
/// input of every batch.
pub fn test_fft_roundtrip<B: Backend>(ctx: &Context<B>)
where
    Context<B>: FftPlanAlloc<B>,
    B: FftExecImpl<B>,
{
    let mut source: Source = Source::new([21u8; 32]);

    for quality in [PlanQuality::Fast, PlanQuality::Exhaustive] {
        let mut forward: FftPlan<B> = ctx
            .fft_plan_alloc(LENGTH, N_BATCH, quality, Direction::Forward, 1.0)
            .unwrap();
        let mut backward: FftPlan<B> = ctx
            .fft_plan_alloc(LENGTH, N_BATCH, quality, Direction::Backward, 1.0 / LENGTH as f64)
            .unwrap();

        fill_noise(&mut forward, &mut source);
        let input: Vec<f64> = forward.tdata_all().to_vec();

        forward.exec();
        assert_eq!(forward.tdata_all(), &input[..], "forward exec modified its input");

        for i in 0..N_BATCH {
            backward.fdata_mut(i).copy_from_slice(forward.fdata(i));
        }
        backward.exec();

        for i in 0..N_BATCH {
            let got: &[f64] = backward.tdata(i);
            let want: &[f64] = &input[i * LENGTH..(i + 1) * LENGTH];
            for (x, y) in got.iter().zip(want) {
                // single-precision equality
                assert!((x - y).abs() <= 4.0 * f32::EPSILON as f64 * y.abs().max(1.0), "{x} != {y}");
            }
        }
    }
}

/// Unnormalized forward transform of unit-variance white noise has packed
/// output variance `length / 2`, within three standard deviations.
pub fn test_fft_white_noise<B: Backend>(ctx: &Context<B>)
where
    Context<B>: FftPlanAlloc<B>,
    B: FftExecImpl<B>,
{
    let mut source: Source = Source::new([22u8; 32]);
    let mut forward: FftPlan<B> = ctx
        .fft_plan_alloc(LENGTH, N_BATCH, PlanQuality::Fast, Direction::Forward, 1.0)
        .unwrap();
    fill_noise(&mut forward, &mut source);
    forward.exec();

    let n: f64 = LENGTH as f64;
    let sigma: f64 = (n / 2.0) * (2.0 / (n - 1.0)).sqrt();
    for i in 0..N_BATCH {
        let f: &[f64] = forward.fdata(i);
        let mean: f64 = f.iter().sum::<f64>() / n;
        let var: f64 = f.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
        let outlier: f64 = (var - n / 2.0).abs();
        assert!(outlier < 3.0 * sigma, "batch {i}: var={var}, expected {} ± {}", n / 2.0, 3.0 * sigma);
    }
}

/// The scale multiplies every output element and nothing accumulates
/// across calls.
pub fn test_fft_scale_and_repeat<B: Backend>(ctx: &Context<B>)
where
    Context<B>: FftPlanAlloc<B>,
    B: FftExecImpl<B>,
{
    let mut source: Source = Source::new([23u8; 32]);
    let mut unit: FftPlan<B> = ctx
        .fft_plan_alloc(48, 3, PlanQuality::Fast, Direction::Forward, 1.0)
        .unwrap();
    let mut scaled: FftPlan<B> = ctx
        .fft_plan_alloc(48, 3, PlanQuality::Fast, Direction::Forward, 0.25)
        .unwrap();
    assert_eq!(scaled.scale(), 0.25);

    fill_noise(&mut unit, &mut source);
    for i in 0..3 {
        let t: Vec<f64> = unit.tdata(i).to_vec();
        scaled.tdata_mut(i).copy_from_slice(&t);
    }

    unit.exec();
    scaled.exec();
    let expected: Vec<f64> = unit.fdata_all().iter().map(|x| x * 0.25).collect();
    assert_close_rel(scaled.fdata_all(), &expected, 1e-14);

    let first: Vec<f64> = unit.fdata_all().to_vec();
    unit.exec();
    assert_eq!(unit.fdata_all(), &first[..]);

    // Fresh input gives a fresh result.
    fill_noise(&mut unit, &mut source);
    unit.exec();
    assert_ne!(unit.fdata_all(), &first[..]);
}

/// Plans reject empty transforms.
pub fn test_fft_invalid_size<B: Backend>(ctx: &Context<B>)
where
    Context<B>: FftPlanAlloc<B>,
{
    for (length, n_batch) in [(0, 1), (8, 0), (0, 0)] {
        match ctx.fft_plan_alloc(length, n_batch, PlanQuality::Fast, Direction::Forward, 1.0) {
            Err(err) => assert_eq!(err, Error::InvalidFftSize { length, n_batch }),
            Ok(_) => panic!("plan of length {length} and {n_batch} batches was accepted"),
        }
    }
}

/// Both directions agree with the reference DFT in the packed layout, for
/// even, odd, prime and power-of-two lengths.
pub fn test_fft_matches_reference<B: Backend>(ctx: &Context<B>)
where
    Context<B>: FftPlanAlloc<B>,
    B: FftExecImpl<B>,
{
    let mut source: Source = Source::new([24u8; 32]);
    let n_batch: usize = 3;

    for length in [1usize, 2, 3, 5, 8, 12, 17, 64, 100, 127, 256] {
        let table: DftTable = DftTable::new(length);
        let scale: f64 = 0.5;

        let mut forward: FftPlan<B> = ctx
            .fft_plan_alloc(length, n_batch, PlanQuality::Exhaustive, Direction::Forward, scale)
            .unwrap();
        let mut backward: FftPlan<B> = ctx
            .fft_plan_alloc(length, n_batch, PlanQuality::Fast, Direction::Backward, scale)
            .unwrap();

        fill_noise(&mut forward, &mut source);
        forward.exec();

        let mut want: Vec<f64> = vec![0.0; length];
        for i in 0..n_batch {
            r2hc_ref(&table, scale, forward.tdata(i), &mut want);
            assert_close_rel(forward.fdata(i), &want, 1e-9);
        }

        for i in 0..n_batch {
            source.fill_normal(0.0, 1.0, backward.fdata_mut(i));
        }
        backward.exec();
        for i in 0..n_batch {
            hc2r_ref(&table, scale, backward.fdata(i), &mut want);
            assert_close_rel(backward.tdata(i), &want, 1e-9);
        }
    }
}

/// The backend under test and the reference backend agree on the same input.
pub fn test_fft_cross<BR: Backend, BT: Backend>(ctx_ref: &Context<BR>, ctx_test: &Context<BT>)
where
    Context<BR>: FftPlanAlloc<BR>,
    Context<BT>: FftPlanAlloc<BT>,
    BR: FftExecImpl<BR>,
    BT: FftExecImpl<BT>,
{
    let mut source: Source = Source::new([25u8; 32]);

    for (length, n_batch) in [(64usize, 5usize), (33, 4), (250, 2)] {
        for direction in [Direction::Forward, Direction::Backward] {
            let scale: f64 = match direction {
                Direction::Forward => 1.0,
                Direction::Backward => 1.0 / length as f64,
            };
            let mut plan_ref: FftPlan<BR> = ctx_ref
                .fft_plan_alloc(length, n_batch, PlanQuality::Fast, direction, scale)
                .unwrap();
            let mut plan_test: FftPlan<BT> = ctx_test
                .fft_plan_alloc(length, n_batch, PlanQuality::Fast, direction, scale)
                .unwrap();

            for i in 0..n_batch {
                let mut x: Vec<f64> = vec![0.0; length];
                source.fill_normal(0.0, 1.0, &mut x);
                match direction {
                    Direction::Forward => {
                        plan_ref.tdata_mut(i).copy_from_slice(&x);
                        plan_test.tdata_mut(i).copy_from_slice(&x);
                    }
                    Direction::Backward => {
                        plan_ref.fdata_mut(i).copy_from_slice(&x);
                        plan_test.fdata_mut(i).copy_from_slice(&x);
                    }
                }
            }

            plan_ref.exec();
            plan_test.exec();

            match direction {
                Direction::Forward => assert_close_rel(plan_test.fdata_all(), plan_ref.fdata_all(), 1e-9),
                Direction::Backward => assert_close_rel(plan_test.tdata_all(), plan_ref.tdata_all(), 1e-9),
            }
        }
    }
}
