use rodio::Source;
use std::time::Duration;

/// DC offset at a fixed level; handy for checking gains, since every sample is equal.
pub struct Constant {
    sample_rate: u32,
    level: i16,
}

impl Constant {
    pub fn new(level: i16, sample_rate: u32) -> Self {
        Constant { sample_rate, level }
    }

    /// Constant at the largest positive level, which normalizes to exactly 1.
    pub fn full_scale(sample_rate: u32) -> Self {
        Constant::new(i16::MAX, sample_rate)
    }
}

impl Iterator for Constant {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        Some(self.level)
    }
}

impl Source for Constant {
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
