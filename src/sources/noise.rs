use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rodio::Source;
use std::time::Duration;

/// Gaussian white noise.
pub struct Noise {
    sample_rate: u32,
    amplitude: f32,
    rng: SmallRng,
}

impl Noise {
    /// Noise with a standard deviation of a quarter of full scale.
    pub fn new(sample_rate: u32) -> Self {
        Noise {
            sample_rate,
            amplitude: 0.25,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible noise.
    pub fn with_seed(self, seed: u64) -> Self {
        Noise {
            rng: SmallRng::seed_from_u64(seed),
            ..self
        }
    }

    /// Standard deviation relative to full scale.
    pub fn with_amplitude(self, amplitude: f32) -> Self {
        Noise { amplitude, ..self }
    }
}

impl Iterator for Noise {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        let x: f32 = StandardNormal.sample(&mut self.rng);
        let scaled = (x * self.amplitude).max(-1.0).min(1.0) * f32::from(i16::MAX);
        Some(scaled as i16)
    }
}

impl Source for Noise {
    #[inline(always)]
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    #[inline(always)]
    fn channels(&self) -> u16 {
        1
    }

    #[inline(always)]
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline(always)]
    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
