use crate::layouts::{Backend, Context, ExecTarget, PointingArgs};

/// # THIS TRAIT IS AN OPEN EXTENSION POINT (unsafe)
/// * See [crate::reference::pointing::pointing_detector_ref] for reference code.
/// * See [crate::api::PointingDetector] for the corresponding public API.
/// # Safety
/// `args` is validated and address-resolved for `target`. The implementation
/// must compute every `(detector, interval sample)` pair of `args` exactly as
/// [crate::reference::pointing::pointing_detector_inner] does, and write
/// nothing else.
pub unsafe trait PointingDetectorImpl<B: Backend> {
    fn pointing_detector_impl(ctx: &Context<B>, args: &PointingArgs<'_>, target: ExecTarget);
}
