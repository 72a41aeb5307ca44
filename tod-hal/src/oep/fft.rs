use crate::layouts::{Backend, Context, FftPlanInfo};

/// # THIS TRAIT IS AN OPEN EXTENSION POINT (unsafe)
/// * See [crate::reference::fft::DftTable] for reference code.
/// * See [crate::api::FftPlanAlloc] for the corresponding public API.
/// # Safety
/// `info` was validated (`length >= 1`, `n_batch >= 1`). The returned handle
/// must be usable by [FftExecImpl] for the lifetime of the plan.
pub unsafe trait FftPlanNewImpl<B: Backend> {
    fn fft_plan_new_impl(ctx: &Context<B>, info: &FftPlanInfo) -> B::FftHandle;
}

/// # THIS TRAIT IS AN OPEN EXTENSION POINT (unsafe)
/// * See [crate::reference::fft::fft_exec_ref] for reference code.
/// * See [crate::layouts::FftPlan::exec] for the corresponding public API.
/// # Safety
/// `tdata` and `fdata` both hold `info.n_batch * info.length` reals. Forward
/// plans read only `tdata` and overwrite all of `fdata`; backward plans read
/// only `fdata` and overwrite all of `tdata`. Outputs use the packed
/// half-complex layout of [crate::layouts::FftPlan] and are scaled by
/// `info.scale`.
pub unsafe trait FftExecImpl<B: Backend> {
    fn fft_exec_impl(info: &FftPlanInfo, handle: &B::FftHandle, tdata: &mut [f64], fdata: &mut [f64]);
}
