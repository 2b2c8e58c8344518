//! Binaural rendering of a mono sound source for a listener moving in a plane.
//!
//! Each of the listener's two ears hears the source delayed by its time of flight and
//! attenuated with the inverse square of its distance. Moving the listener while the
//! sound plays changes those delays from one output buffer to the next, which yields
//! interaural time differences and the doppler effect.
//!
//! ```no_run
//! use flat_concert::{ConcertBuilder, SoundSource, Vec2};
//!
//! let source = SoundSource::open("speech.wav")?;
//! let concert = ConcertBuilder::new().build(source)?;
//!
//! concert.move_listener(Vec2::new(1.0, -1.0))?;
//! concert.stop()?;
//! # Ok::<(), flat_concert::Error>(())
//! ```

pub extern crate cpal;
pub extern crate rodio;

mod config;
mod error;
mod geometry;
mod listener;
mod output;
mod renderer;
mod source;
mod stream;
mod transport;

pub mod pointer;
pub mod sources;

use std::sync::Arc;

use log::warn;

pub use config::{
    OutputConfig, RenderConfig, DEFAULT_FRAMES_PER_BUFFER, DEFAULT_MAX_GAIN, DEFAULT_SAMPLE_RATE,
    DEFAULT_SPEED_OF_SOUND,
};
pub use error::{Error, Result};
pub use geometry::{Spatial, Vec2};
pub use listener::{Ear, EarSide, Listener, ListenerController, DEFAULT_EAR_SEPARATION};
pub use output::{default_device, Playback};
pub use renderer::{BinauralRenderer, EarPropagation, OutputBuffer};
pub use source::{DecodedAudio, SoundSource};
pub use stream::BinauralStream;
pub use transport::{DriverStatus, StreamStatus, TimeInfo, Transport, TransportState};

/// Configures and starts a [`Concert`].
///
/// The initial scene puts the source at the origin and the listener one unit in front
/// of it (towards negative y).
pub struct ConcertBuilder {
    device: Option<cpal::Device>,
    sample_rate: Option<u32>,
    frames_per_buffer: u32,
    render: RenderConfig,
    source_position: Vec2,
    listener_position: Vec2,
}

impl Default for ConcertBuilder {
    fn default() -> Self {
        ConcertBuilder::new()
    }
}

impl ConcertBuilder {
    pub fn new() -> Self {
        ConcertBuilder {
            device: None,
            sample_rate: None,
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
            render: RenderConfig::default(),
            source_position: Vec2::ZERO,
            listener_position: Vec2::new(0.0, -1.0),
        }
    }

    pub fn with_device(self, device: cpal::Device) -> Self {
        ConcertBuilder {
            device: Some(device),
            ..self
        }
    }

    /// Output sample rate. Defaults to the sample rate of the source.
    pub fn with_sample_rate(self, sample_rate: u32) -> Self {
        ConcertBuilder {
            sample_rate: Some(sample_rate),
            ..self
        }
    }

    /// Frames per device buffer; smaller buffers track motion more closely.
    pub fn with_frames_per_buffer(self, frames_per_buffer: u32) -> Self {
        ConcertBuilder {
            frames_per_buffer,
            ..self
        }
    }

    pub fn with_render_config(self, render: RenderConfig) -> Self {
        ConcertBuilder { render, ..self }
    }

    pub fn with_speed_of_sound(mut self, speed_of_sound: f32) -> Self {
        self.render.speed_of_sound = speed_of_sound;
        self
    }

    pub fn with_max_gain(mut self, max_gain: f32) -> Self {
        self.render.max_gain = max_gain;
        self
    }

    pub fn with_ear_separation(mut self, ear_separation: f32) -> Self {
        self.render.ear_separation = ear_separation;
        self
    }

    pub fn with_source_position(self, source_position: Vec2) -> Self {
        ConcertBuilder {
            source_position,
            ..self
        }
    }

    pub fn with_listener_position(self, listener_position: Vec2) -> Self {
        ConcertBuilder {
            listener_position,
            ..self
        }
    }

    /// Place `source` and the listener and bind a renderer to them, without any device.
    pub fn build_transport(&self, source: SoundSource) -> Result<(Transport, Scene)> {
        self.render.validate()?;
        let source = Arc::new(source.with_position(self.source_position)?);
        let listener = ListenerController::new(
            Listener::with_ear_separation(self.render.ear_separation)?
                .moved_to(self.listener_position)?,
        );
        let renderer = BinauralRenderer::new(source.clone(), listener.clone(), self.render)?;
        let (transport, _) = Transport::new(renderer);
        Ok((transport, Scene { source, listener }))
    }

    /// Render into a `rodio` source instead of opening a device.
    pub fn build_stream(self, source: SoundSource) -> Result<(BinauralStream, Scene)> {
        let output = self.output_config(&source)?;
        let (transport, scene) = self.build_transport(source)?;
        let stream = BinauralStream::new(
            transport,
            output.frames_per_buffer as usize,
            output.sample_rate,
        );
        Ok((stream, scene))
    }

    /// Start playing `source` on the output device.
    pub fn build(self, source: SoundSource) -> Result<Concert> {
        let output = self.output_config(&source)?;
        let (transport, scene) = self.build_transport(source)?;
        let playback = match self.device {
            Some(ref device) => Playback::start(device, output, transport)?,
            None => Playback::start(&default_device()?, output, transport)?,
        };

        Ok(Concert { playback, scene })
    }

    fn output_config(&self, source: &SoundSource) -> Result<OutputConfig> {
        let sample_rate = match self.sample_rate {
            Some(sample_rate) => sample_rate,
            None if source.sample_rate() > 0 => source.sample_rate(),
            None => DEFAULT_SAMPLE_RATE,
        };
        let output = OutputConfig {
            sample_rate,
            frames_per_buffer: self.frames_per_buffer,
        };
        output.validate()?;

        if source.sample_rate() > 0 && output.sample_rate != source.sample_rate() {
            warn!(
                "source sampled at {} Hz played back at {} Hz without resampling",
                source.sample_rate(),
                output.sample_rate
            );
        }
        Ok(output)
    }
}

/// The source and the listener a renderer is bound to.
#[derive(Clone)]
pub struct Scene {
    pub source: Arc<SoundSource>,
    pub listener: Arc<ListenerController>,
}

/// A source playing to a movable listener.
pub struct Concert {
    playback: Playback,
    scene: Scene,
}

impl Concert {
    /// Move the listener; takes effect from the next output buffer.
    pub fn move_listener(&self, position: Vec2) -> Result<()> {
        self.scene.listener.set_position(position)
    }

    pub fn listener(&self) -> &Arc<ListenerController> {
        &self.scene.listener
    }

    pub fn source(&self) -> &Arc<SoundSource> {
        &self.scene.source
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Stop playback; see [`Playback::stop`].
    pub fn stop(self) -> Result<()> {
        self.playback.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::Source;
    use std::thread::sleep;
    use std::time::Duration;

    fn tone() -> SoundSource {
        let audio = DecodedAudio::take(sources::SineWave::new(440.0, 44100), 44100);
        SoundSource::from_decoded(audio).unwrap()
    }

    #[test]
    fn builds_the_initial_scene() {
        let (transport, scene) = ConcertBuilder::new().build_transport(tone()).unwrap();
        assert_eq!(scene.source.position(), Vec2::ZERO);
        assert_eq!(scene.listener.snapshot().position(), Vec2::new(0.0, -1.0));
        assert_eq!(transport.renderer().cursor(), 0);
        assert_eq!(transport.state().status(), StreamStatus::Continue);
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(matches!(
            ConcertBuilder::new().with_speed_of_sound(0.0).build_transport(tone()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ConcertBuilder::new()
                .with_listener_position(Vec2::new(f32::NAN, 0.0))
                .build_transport(tone()),
            Err(Error::InvalidGeometry { .. })
        ));
        assert!(matches!(
            ConcertBuilder::new().with_frames_per_buffer(0).build(tone()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn offline_stream_follows_the_listener() {
        let (stream, scene) = ConcertBuilder::new()
            .with_listener_position(Vec2::new(-2.0, 0.0))
            .build_stream(tone())
            .unwrap();
        assert_eq!(stream.sample_rate(), 44100);

        // Listener to the left of the source: the right ear is closer and louder.
        let samples: Vec<f32> = stream.take(2 * 4410).collect();
        let energy = |channel: usize| -> f32 {
            samples.iter().skip(channel).step_by(2).map(|s| s * s).sum()
        };
        assert!(energy(1) > energy(0));

        scene.listener.set_position(Vec2::new(0.0, -1.0)).unwrap();
        assert_eq!(scene.listener.snapshot().position(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn inert_source_streams_silence_at_the_output_rate() {
        let (stream, _) = ConcertBuilder::new()
            .build_stream(SoundSource::default())
            .unwrap();
        assert_eq!(stream.sample_rate(), DEFAULT_SAMPLE_RATE);

        let (stream, _) = ConcertBuilder::new()
            .with_sample_rate(48000)
            .build_stream(SoundSource::default())
            .unwrap();
        assert_eq!(stream.sample_rate(), 48000);

        let converted: Vec<f32> = rodio::source::UniformSourceIterator::new(stream, 2, 44100)
            .take(64)
            .collect();
        assert_eq!(converted.len(), 64);
        assert!(converted.iter().all(|&s| s == 0.0));

        assert!(matches!(
            ConcertBuilder::new()
                .with_sample_rate(0)
                .build_stream(SoundSource::default()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    #[ignore = "needs an audio output device"]
    fn plays_on_the_default_device() {
        let concert = ConcertBuilder::new().build(tone()).unwrap();

        sleep(Duration::from_millis(500));
        concert.move_listener(Vec2::new(1.0, -1.0)).unwrap();
        sleep(Duration::from_millis(500));

        assert!(concert.playback().frames_rendered() > 0);
        concert.stop().unwrap();
    }
}
