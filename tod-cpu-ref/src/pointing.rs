use tod_hal::{
    layouts::{Context, ExecTarget, PointingArgs},
    oep::PointingDetectorImpl,
    reference::pointing::pointing_detector_ref,
};

use crate::CpuRef;

unsafe impl PointingDetectorImpl<Self> for CpuRef {
    fn pointing_detector_impl(_ctx: &Context<Self>, args: &PointingArgs<'_>, target: ExecTarget) {
        debug_assert!(target.is_host(), "cpu-ref has no device to launch on");
        // SAFETY: `args` was validated and resolved to host addresses.
        unsafe { pointing_detector_ref(args) }
    }
}
