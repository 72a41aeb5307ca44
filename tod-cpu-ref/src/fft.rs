use tod_hal::{
    layouts::{Context, FftPlanInfo},
    oep::{FftExecImpl, FftPlanNewImpl},
    reference::fft::{DftTable, fft_exec_ref},
};

use crate::CpuRef;

// Only one algorithm is available, so both quality tiers build the same table.
unsafe impl FftPlanNewImpl<Self> for CpuRef {
    fn fft_plan_new_impl(_ctx: &Context<Self>, info: &FftPlanInfo) -> DftTable {
        DftTable::new(info.length)
    }
}

unsafe impl FftExecImpl<Self> for CpuRef {
    fn fft_exec_impl(info: &FftPlanInfo, handle: &DftTable, tdata: &mut [f64], fdata: &mut [f64]) {
        fft_exec_ref(info, handle, tdata, fdata)
    }
}
