//! Tunable constants of the renderer and of the output stream.

use crate::error::{Error, Result};
use crate::listener::DEFAULT_EAR_SEPARATION;

/// Speed of sound in air, in world units per second.
pub const DEFAULT_SPEED_OF_SOUND: f32 = 340.29;

/// Gain ceiling applied to the inverse-square falloff near the source.
pub const DEFAULT_MAX_GAIN: f32 = 3.0;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Small buffers track listener motion closely, which the doppler effect needs.
pub const DEFAULT_FRAMES_PER_BUFFER: u32 = 8;

/// Physical constants used by [`BinauralRenderer`](crate::BinauralRenderer).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub speed_of_sound: f32,
    pub max_gain: f32,
    pub ear_separation: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            max_gain: DEFAULT_MAX_GAIN,
            ear_separation: DEFAULT_EAR_SEPARATION,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.speed_of_sound.is_finite() || self.speed_of_sound <= 0.0 {
            return Err(Error::InvalidConfig(
                "speed of sound must be finite and positive",
            ));
        }
        if !self.max_gain.is_finite() || self.max_gain < 0.0 {
            return Err(Error::InvalidConfig(
                "max gain must be finite and non-negative",
            ));
        }
        if !self.ear_separation.is_finite() || self.ear_separation <= 0.0 {
            return Err(Error::InvalidConfig(
                "ear separation must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// Parameters of the stream opened on the output device.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub frames_per_buffer: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be positive"));
        }
        if self.frames_per_buffer == 0 {
            return Err(Error::InvalidConfig("frames per buffer must be positive"));
        }
        Ok(())
    }
}
