use rodio::Source;
use std::time::Duration;

/// Sawtooth that rises from silence to full scale once per period, then wraps.
pub struct Ramp {
    sample_rate: u32,
    period: u32,
    index: u32,
}

impl Ramp {
    /// Ramp with a period of `period` samples.
    pub fn new(period: u32, sample_rate: u32) -> Self {
        Ramp {
            sample_rate,
            period: period.max(1),
            index: 0,
        }
    }
}

impl Iterator for Ramp {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        let x = i64::from(self.index) * i64::from(i16::MAX) / i64::from(self.period);
        self.index = (self.index + 1) % self.period;
        Some(x as i16)
    }
}

impl Source for Ramp {
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
