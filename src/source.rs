//! Mono sound sources built from decoded audio.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, info, warn};
use rodio::Source;

use crate::error::{Error, Result};
use crate::geometry::{Spatial, Vec2};

/// Raw 16 bit audio as handed over by a decoder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedAudio {
    pub channels: u16,
    pub sample_rate: u32,
    /// Number of samples the decoder announced; must equal `samples.len()`.
    pub sample_count: usize,
    pub samples: Vec<i16>,
}

impl DecodedAudio {
    /// Single-channel audio, with `sample_count` taken from the samples.
    pub fn mono(sample_rate: u32, samples: Vec<i16>) -> Self {
        DecodedAudio {
            channels: 1,
            sample_rate,
            sample_count: samples.len(),
            samples,
        }
    }

    /// Drain a finite `rodio` source into memory.
    ///
    /// Infinite sources must go through [`DecodedAudio::take`] instead.
    pub fn from_source<S>(source: S) -> Self
    where
        S: Source<Item = i16>,
    {
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        let samples: Vec<i16> = source.collect();
        DecodedAudio {
            channels,
            sample_rate,
            sample_count: samples.len(),
            samples,
        }
    }

    /// Record the first `sample_count` samples of a (possibly infinite) source.
    pub fn take<S>(source: S, sample_count: usize) -> Self
    where
        S: Source<Item = i16>,
    {
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        let samples: Vec<i16> = source.take(sample_count).collect();
        DecodedAudio {
            channels,
            sample_rate,
            sample_count: samples.len(),
            samples,
        }
    }

    /// Decode an audio file with any format `rodio` understands.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let decoder = rodio::Decoder::new(BufReader::new(file))?;
        let audio = DecodedAudio::from_source(decoder);
        debug!(
            "decoded {}: {} channel(s), {} Hz, {} samples",
            path.display(),
            audio.channels,
            audio.sample_rate,
            audio.sample_count
        );
        Ok(audio)
    }
}

/// A positioned mono waveform with samples normalized to `[-1, 1]`.
///
/// The default value is the inert empty source: it has no samples and renders silence.
#[derive(Clone, Debug, Default)]
pub struct SoundSource {
    position: Vec2,
    sample_rate: u32,
    samples: Box<[f32]>,
}

impl SoundSource {
    /// Normalize decoded mono audio into a source at the origin.
    pub fn from_decoded(audio: DecodedAudio) -> Result<Self> {
        if audio.channels != 1 {
            warn!(
                "refusing {} channel audio, only mono sources are supported",
                audio.channels
            );
            return Err(Error::UnsupportedChannelLayout {
                channels: audio.channels,
            });
        }
        if audio.sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        if audio.sample_count != audio.samples.len() {
            return Err(Error::SampleCountMismatch {
                declared: audio.sample_count,
                actual: audio.samples.len(),
            });
        }

        let samples = audio.samples.iter().map(|&s| normalize(s)).collect();

        info!(
            "loaded mono source: {} samples at {} Hz",
            audio.sample_count, audio.sample_rate
        );

        Ok(SoundSource {
            position: Vec2::ZERO,
            sample_rate: audio.sample_rate,
            samples,
        })
    }

    /// Decode and normalize a mono audio file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        SoundSource::from_decoded(DecodedAudio::open(path)?)
    }

    pub fn with_position(mut self, position: Vec2) -> Result<Self> {
        self.set_position(position)?;
        Ok(self)
    }

    pub fn set_position(&mut self, position: Vec2) -> Result<()> {
        self.position = position.validated()?;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at index `i`.
    ///
    /// Panics if `i >= sample_count()`; readers outside the waveform are expected to
    /// bounds-check or use `samples().get(i)`.
    #[inline]
    pub fn sample(&self, i: usize) -> f32 {
        self.samples[i]
    }
}

impl Spatial for SoundSource {
    fn position(&self) -> Vec2 {
        self.position
    }
}

/// Scale a 16 bit sample by the largest positive magnitude.
///
/// `i16::MIN` would land just below -1, so it is clamped.
#[inline]
fn normalize(s: i16) -> f32 {
    (f32::from(s) / f32::from(i16::MAX)).max(-1.0)
}
