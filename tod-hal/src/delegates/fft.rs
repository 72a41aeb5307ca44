use tracing::debug;

use crate::{
    api::FftPlanAlloc,
    error::Result,
    layouts::{Backend, Context, Direction, FftPlan, FftPlanInfo, PlanQuality},
    oep::FftPlanNewImpl,
};

impl<B> FftPlanAlloc<B> for Context<B>
where
    B: Backend + FftPlanNewImpl<B>,
{
    fn fft_plan_alloc(
        &self,
        length: usize,
        n_batch: usize,
        quality: PlanQuality,
        direction: Direction,
        scale: f64,
    ) -> Result<FftPlan<B>> {
        let info: FftPlanInfo = FftPlanInfo::new(length, n_batch, quality, direction, scale)?;
        debug!(
            backend = B::name(),
            length,
            n_batch,
            ?quality,
            %direction,
            scale,
            "fft plan"
        );
        let handle: B::FftHandle = B::fft_plan_new_impl(self, &info);
        Ok(FftPlan::from_handle(info, handle))
    }
}
