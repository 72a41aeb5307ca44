use rand::Rng;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use rand_core::RngCore;
use rand_distr::{Distribution, Normal};

const MAXF64: f64 = 9007199254740992.0;

/// Seeded ChaCha8 stream used to synthesize boresight, focal planes, flags
/// and noise in tests and benchmarks.
pub struct Source {
    source: ChaCha8Rng,
}

impl Source {
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Independent child stream, e.g. one per detector.
    pub fn branch(&mut self) -> Self {
        let mut seed: [u8; 32] = [0u8; 32];
        self.fill_bytes(&mut seed);
        Source::new(seed)
    }

    /// Uniform in `[min, max)`.
    #[inline(always)]
    pub fn next_f64(&mut self, min: f64, max: f64) -> f64 {
        min + ((self.next_u64() << 11 >> 11) as f64) / MAXF64 * (max - min)
    }

    /// Uniform in `[0, max)`.
    #[inline(always)]
    pub fn next_usize(&mut self, max: usize) -> usize {
        self.random_range(0..max)
    }

    #[inline(always)]
    pub fn next_u8(&mut self) -> u8 {
        self.next_u32() as u8
    }

    /// Fills `dst` with Gaussian samples.
    pub fn fill_normal(&mut self, mean: f64, sigma: f64, dst: &mut [f64]) {
        let normal: Normal<f64> = match Normal::new(mean, sigma) {
            Ok(n) => n,
            Err(e) => panic!("invalid normal distribution (mean={mean}, sigma={sigma}): {e}"),
        };
        dst.iter_mut().for_each(|x| *x = normal.sample(self));
    }

    /// Fills `dst` with uniformly distributed unit quaternions.
    pub fn fill_unit_quats(&mut self, dst: &mut [f64]) {
        self.fill_normal(0.0, 1.0, dst);
        crate::reference::qarray::qa_normalize_inplace(dst);
    }
}

impl RngCore for Source {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.source.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.source.fill_bytes(bytes)
    }
}
