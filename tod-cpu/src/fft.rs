use std::{fmt::Debug, sync::Arc, time::Instant};

use rayon::{ThreadPool, prelude::*};
use rustfft::{Fft, FftDirection, FftPlanner, FftPlannerScalar, num_complex::Complex};
use tod_hal::{
    layouts::{Backend, Context, Direction, FftPlanInfo, PlanQuality},
    oep::{FftExecImpl, FftPlanNewImpl},
};
use tracing::debug;

use crate::{CpuHost, CpuOffload, HostPool};

/// Timed executions per candidate when measuring.
const MEASURE_REPS: usize = 8;

/// Planned `rustfft` transform plus the pool batches are spread over.
pub struct RustFftHandle {
    fft: Arc<dyn Fft<f64>>,
    length: usize,
    direction: Direction,
    pool: Arc<ThreadPool>,
    planner: &'static str,
}

impl Debug for RustFftHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustFftHandle")
            .field("length", &self.length)
            .field("direction", &self.direction)
            .field("planner", &self.planner)
            .finish()
    }
}

impl RustFftHandle {
    /// Planner that produced the transform: `"auto"` or `"scalar"`.
    pub fn planner(&self) -> &'static str {
        self.planner
    }
}

fn fft_direction(direction: Direction) -> FftDirection {
    match direction {
        Direction::Forward => FftDirection::Forward,
        Direction::Backward => FftDirection::Inverse,
    }
}

fn time_fft(fft: &dyn Fft<f64>, length: usize) -> f64 {
    let mut buf: Vec<Complex<f64>> = (0..length)
        .map(|i| Complex::new((i as f64).sin(), 0.0))
        .collect();
    let mut scratch: Vec<Complex<f64>> = vec![Complex::default(); fft.get_inplace_scratch_len()];
    // Warm-up run so first-touch costs are not measured.
    fft.process_with_scratch(&mut buf, &mut scratch);
    let start: Instant = Instant::now();
    for _ in 0..MEASURE_REPS {
        fft.process_with_scratch(&mut buf, &mut scratch);
    }
    start.elapsed().as_secs_f64()
}

fn plan(info: &FftPlanInfo, pool: &Arc<ThreadPool>) -> RustFftHandle {
    let direction: FftDirection = fft_direction(info.direction);
    let auto: Arc<dyn Fft<f64>> = FftPlanner::<f64>::new().plan_fft(info.length, direction);

    let (fft, planner): (Arc<dyn Fft<f64>>, &'static str) = match info.quality {
        PlanQuality::Fast => (auto, "auto"),
        PlanQuality::Exhaustive => {
            let scalar: Arc<dyn Fft<f64>> = FftPlannerScalar::<f64>::new().plan_fft(info.length, direction);
            let t_auto: f64 = time_fft(auto.as_ref(), info.length);
            let t_scalar: f64 = time_fft(scalar.as_ref(), info.length);
            debug!(length = info.length, t_auto, t_scalar, "measured fft candidates");
            if t_scalar < t_auto {
                (scalar, "scalar")
            } else {
                (auto, "auto")
            }
        }
    };

    RustFftHandle {
        fft,
        length: info.length,
        direction: info.direction,
        pool: pool.clone(),
        planner,
    }
}

/// Forward transform of one real sequence into the packed layout.
fn r2hc(fft: &dyn Fft<f64>, scale: f64, src: &[f64], dst: &mut [f64], buf: &mut [Complex<f64>], scratch: &mut [Complex<f64>]) {
    let n: usize = src.len();
    buf.iter_mut().zip(src).for_each(|(c, &x)| *c = Complex::new(x, 0.0));
    fft.process_with_scratch(buf, scratch);

    for k in 0..=n / 2 {
        dst[k] = buf[k].re * scale;
    }
    for k in 1..(n + 1) / 2 {
        dst[n - k] = buf[k].im * scale;
    }
}

/// Backward transform of one packed sequence, through its Hermitian
/// extension.
fn hc2r(fft: &dyn Fft<f64>, scale: f64, src: &[f64], dst: &mut [f64], buf: &mut [Complex<f64>], scratch: &mut [Complex<f64>]) {
    let n: usize = src.len();
    buf[0] = Complex::new(src[0], 0.0);
    for k in 1..(n + 1) / 2 {
        let c: Complex<f64> = Complex::new(src[k], src[n - k]);
        buf[k] = c;
        buf[n - k] = c.conj();
    }
    if n.is_multiple_of(2) && n > 0 {
        buf[n / 2] = Complex::new(src[n / 2], 0.0);
    }
    fft.process_with_scratch(buf, scratch);

    dst.iter_mut().zip(buf.iter()).for_each(|(x, c)| *x = c.re * scale);
}

fn exec(info: &FftPlanInfo, handle: &RustFftHandle, tdata: &mut [f64], fdata: &mut [f64]) {
    let n: usize = info.length;
    let scale: f64 = info.scale;
    let fft: &dyn Fft<f64> = handle.fft.as_ref();
    let init = || {
        (
            vec![Complex::<f64>::default(); n],
            vec![Complex::<f64>::default(); fft.get_inplace_scratch_len()],
        )
    };

    handle.pool.install(|| match info.direction {
        Direction::Forward => tdata
            .par_chunks(n)
            .zip(fdata.par_chunks_mut(n))
            .for_each_init(init, |(buf, scratch), (t, f)| r2hc(fft, scale, t, f, buf, scratch)),
        Direction::Backward => fdata
            .par_chunks(n)
            .zip(tdata.par_chunks_mut(n))
            .for_each_init(init, |(buf, scratch), (f, t)| hc2r(fft, scale, f, t, buf, scratch)),
    })
}

fn plan_for<B: Backend>(ctx: &Context<B>, info: &FftPlanInfo) -> RustFftHandle
where
    B::Handle: HostPool,
{
    let handle: RustFftHandle = plan(info, ctx.handle().host_pool());
    debug!(backend = B::name(), planner = handle.planner, "fft planned");
    handle
}

unsafe impl FftPlanNewImpl<Self> for CpuHost {
    fn fft_plan_new_impl(ctx: &Context<Self>, info: &FftPlanInfo) -> RustFftHandle {
        plan_for(ctx, info)
    }
}

unsafe impl FftExecImpl<Self> for CpuHost {
    fn fft_exec_impl(info: &FftPlanInfo, handle: &RustFftHandle, tdata: &mut [f64], fdata: &mut [f64]) {
        exec(info, handle, tdata, fdata)
    }
}

// Transforms run on the host pool: the emulated device holds no FFT engine.
unsafe impl FftPlanNewImpl<Self> for CpuOffload {
    fn fft_plan_new_impl(ctx: &Context<Self>, info: &FftPlanInfo) -> RustFftHandle {
        plan_for(ctx, info)
    }
}

unsafe impl FftExecImpl<Self> for CpuOffload {
    fn fft_exec_impl(info: &FftPlanInfo, handle: &RustFftHandle, tdata: &mut [f64], fdata: &mut [f64]) {
        exec(info, handle, tdata, fdata)
    }
}

#[cfg(test)]
mod tests {
    use tod_hal::reference::fft::{DftTable, hc2r_ref, r2hc_ref};

    use super::*;

    fn run_single(n: usize, direction: FftDirection, src: &[f64], scale: f64) -> Vec<f64> {
        let fft: Arc<dyn Fft<f64>> = FftPlanner::<f64>::new().plan_fft(n, direction);
        let mut buf: Vec<Complex<f64>> = vec![Complex::default(); n];
        let mut scratch: Vec<Complex<f64>> = vec![Complex::default(); fft.get_inplace_scratch_len()];
        let mut dst: Vec<f64> = vec![0.0; n];
        match direction {
            FftDirection::Forward => r2hc(fft.as_ref(), scale, src, &mut dst, &mut buf, &mut scratch),
            FftDirection::Inverse => hc2r(fft.as_ref(), scale, src, &mut dst, &mut buf, &mut scratch),
        }
        dst
    }

    #[test]
    fn packing_matches_reference() {
        for n in [1usize, 2, 3, 4, 9, 10, 31, 32] {
            let table: DftTable = DftTable::new(n);
            let x: Vec<f64> = (0..n).map(|i| ((i * i) as f64 * 0.3).cos() - 0.2).collect();

            let got: Vec<f64> = run_single(n, FftDirection::Forward, &x, 2.0);
            let mut want: Vec<f64> = vec![0.0; n];
            r2hc_ref(&table, 2.0, &x, &mut want);
            got.iter()
                .zip(&want)
                .for_each(|(a, b)| assert!((a - b).abs() < 1e-10, "n={n}: {got:?} != {want:?}"));

            let got: Vec<f64> = run_single(n, FftDirection::Inverse, &x, 0.5);
            hc2r_ref(&table, 0.5, &x, &mut want);
            got.iter()
                .zip(&want)
                .for_each(|(a, b)| assert!((a - b).abs() < 1e-10, "n={n}: {got:?} != {want:?}"));
        }
    }
}
