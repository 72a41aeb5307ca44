use rayon::{ThreadPool, prelude::*};
use tod_hal::{
    layouts::{Context, ExecTarget, PointingArgs},
    oep::PointingDetectorImpl,
    reference::pointing::{interval_samples, pointing_detector_inner},
};

use crate::{CpuHost, CpuOffload, HostPool};

/// Detectors in parallel; within a detector, intervals in order and samples
/// in parallel.
///
/// # Safety
/// See [`pointing_detector_inner`]. Distinct detectors write distinct rows,
/// distinct samples distinct quaternions.
pub(crate) unsafe fn pointing_host_parallel(pool: &ThreadPool, args: &PointingArgs<'_>) {
    pool.install(|| {
        (0..args.n_det()).into_par_iter().for_each(|idet| {
            for iview in 0..args.n_view() {
                unsafe { interval_samples(args, iview) }
                    .into_par_iter()
                    .for_each(|isamp| unsafe { pointing_detector_inner(args, idet, isamp) });
            }
        })
    })
}

/// Accelerator decomposition: one team per (detector, interval) pair of the
/// collapsed space, samples spread over the threads of the team.
///
/// # Safety
/// See [`pointing_detector_inner`]. Intervals are disjoint, so teams never
/// share an output quaternion.
pub(crate) unsafe fn pointing_device_parallel(pool: &ThreadPool, args: &PointingArgs<'_>) {
    let n_view: usize = args.n_view();
    pool.install(|| {
        (0..args.n_det() * n_view).into_par_iter().for_each(|team| {
            let idet: usize = team / n_view;
            let iview: usize = team % n_view;
            unsafe { interval_samples(args, iview) }
                .into_par_iter()
                .for_each(|isamp| unsafe { pointing_detector_inner(args, idet, isamp) });
        })
    })
}

unsafe impl PointingDetectorImpl<Self> for CpuHost {
    fn pointing_detector_impl(ctx: &Context<Self>, args: &PointingArgs<'_>, target: ExecTarget) {
        debug_assert!(target.is_host(), "cpu-host has no device to launch on");
        unsafe { pointing_host_parallel(ctx.handle().host_pool(), args) }
    }
}

unsafe impl PointingDetectorImpl<Self> for CpuOffload {
    fn pointing_detector_impl(ctx: &Context<Self>, args: &PointingArgs<'_>, target: ExecTarget) {
        match target {
            ExecTarget::Host => unsafe { pointing_host_parallel(ctx.handle().host_pool(), args) },
            ExecTarget::Device(_) => unsafe { pointing_device_parallel(ctx.handle().device_pool(), args) },
        }
    }
}
