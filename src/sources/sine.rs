use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

/// Sine tone at a fixed frequency and amplitude.
pub struct SineWave {
    sample_rate: u32,
    frequency: f32,
    amplitude: f32,
    index: u64,
}

impl SineWave {
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        SineWave {
            sample_rate,
            frequency,
            amplitude: 0.5,
            index: 0,
        }
    }

    /// Peak level relative to full scale.
    pub fn with_amplitude(self, amplitude: f32) -> Self {
        SineWave { amplitude, ..self }
    }
}

impl Iterator for SineWave {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        let t = self.index as f64 / f64::from(self.sample_rate);
        self.index += 1;
        let phase = (t * f64::from(self.frequency)).fract() as f32;
        let x = (2.0 * PI * phase).sin() * self.amplitude.max(0.0).min(1.0);
        Some((x * f32::from(i16::MAX)) as i16)
    }
}

impl Source for SineWave {
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
