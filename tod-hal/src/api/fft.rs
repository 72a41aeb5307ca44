use crate::{
    error::Result,
    layouts::{Backend, Direction, FftPlan, PlanQuality},
};

/// Allocates batched real FFT plans.
pub trait FftPlanAlloc<B: Backend> {
    /// Plan of `n_batch` transforms of `length` reals in a fixed `direction`,
    /// each output element multiplied by `scale`.
    fn fft_plan_alloc(
        &self,
        length: usize,
        n_batch: usize,
        quality: PlanQuality,
        direction: Direction,
        scale: f64,
    ) -> Result<FftPlan<B>>;
}
