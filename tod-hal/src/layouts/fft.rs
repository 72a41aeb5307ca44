use std::fmt::Display;

use crate::{
    error::{Error, Result},
    layouts::Backend,
    oep::FftExecImpl,
};

/// Plan-construction effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanQuality {
    /// Pick an algorithm without measuring.
    Fast,
    /// Measure candidate algorithms at plan time and keep the fastest.
    Exhaustive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Time domain → packed frequency domain.
    Forward,
    /// Packed frequency domain → time domain.
    Backward,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Fixed parameters of an [`FftPlan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FftPlanInfo {
    pub length: usize,
    pub n_batch: usize,
    pub quality: PlanQuality,
    pub direction: Direction,
    pub scale: f64,
}

impl FftPlanInfo {
    pub fn new(length: usize, n_batch: usize, quality: PlanQuality, direction: Direction, scale: f64) -> Result<Self> {
        if length == 0 || n_batch == 0 {
            return Err(Error::InvalidFftSize { length, n_batch });
        }
        Ok(Self {
            length,
            n_batch,
            quality,
            direction,
            scale,
        })
    }
}

/// Batched real FFT plan.
///
/// Owns `n_batch` time-domain and `n_batch` frequency-domain sequences of
/// `length` reals each, stored contiguously batch after batch. Frequency
/// sequences use the packed half-complex layout:
///
/// ```text
/// [ Re X0, Re X1, ..., Re X(n/2), Im X((n+1)/2 - 1), ..., Im X1 ]
/// ```
///
/// [`FftPlan::exec`] always transforms in the plan's fixed direction and
/// multiplies every output element by the plan's scale.
pub struct FftPlan<B: Backend> {
    info: FftPlanInfo,
    tdata: Vec<f64>,
    fdata: Vec<f64>,
    handle: B::FftHandle,
}

impl<B: Backend> FftPlan<B> {
    /// Allocates zeroed buffers around an already planned backend handle.
    pub fn from_handle(info: FftPlanInfo, handle: B::FftHandle) -> Self {
        let total: usize = info.length * info.n_batch;
        Self {
            info,
            tdata: vec![0.0; total],
            fdata: vec![0.0; total],
            handle,
        }
    }

    pub fn info(&self) -> &FftPlanInfo {
        &self.info
    }

    pub fn length(&self) -> usize {
        self.info.length
    }

    pub fn n_batch(&self) -> usize {
        self.info.n_batch
    }

    pub fn quality(&self) -> PlanQuality {
        self.info.quality
    }

    pub fn direction(&self) -> Direction {
        self.info.direction
    }

    pub fn scale(&self) -> f64 {
        self.info.scale
    }

    pub fn handle(&self) -> &B::FftHandle {
        &self.handle
    }

    #[inline]
    fn batch_range(&self, i: usize) -> std::ops::Range<usize> {
        assert!(
            i < self.info.n_batch,
            "batch index {i} out of range for a plan of {} batches",
            self.info.n_batch
        );
        i * self.info.length..(i + 1) * self.info.length
    }

    /// Time-domain sequence of batch `i`.
    pub fn tdata(&self, i: usize) -> &[f64] {
        &self.tdata[self.batch_range(i)]
    }

    pub fn tdata_mut(&mut self, i: usize) -> &mut [f64] {
        let range = self.batch_range(i);
        &mut self.tdata[range]
    }

    /// Packed frequency-domain sequence of batch `i`.
    pub fn fdata(&self, i: usize) -> &[f64] {
        &self.fdata[self.batch_range(i)]
    }

    pub fn fdata_mut(&mut self, i: usize) -> &mut [f64] {
        let range = self.batch_range(i);
        &mut self.fdata[range]
    }

    /// All time-domain sequences, batch-major.
    pub fn tdata_all(&self) -> &[f64] {
        &self.tdata
    }

    /// All frequency-domain sequences, batch-major.
    pub fn fdata_all(&self) -> &[f64] {
        &self.fdata
    }

    /// Runs the transform over every batch.
    pub fn exec(&mut self)
    where
        B: FftExecImpl<B>,
    {
        B::fft_exec_impl(&self.info, &self.handle, &mut self.tdata, &mut self.fdata)
    }
}
