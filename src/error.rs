//! Error types of the binaural engine.

use thiserror::Error;

/// Errors raised while building sources, moving the listener or driving the output device.
///
/// Nothing in the render path produces an error: out-of-range sample indices and zero
/// distances are ordinary conditions there and are handled by zero-padding and gain clamping.
#[derive(Error, Debug)]
pub enum Error {
    /// The decoded audio is not single-channel.
    #[error("unsupported channel layout: expected mono, got {channels} channels")]
    UnsupportedChannelLayout {
        /// Channel count reported by the decoder.
        channels: u16,
    },

    /// The decoded audio reports a sample rate of zero.
    #[error("invalid sample rate: must be greater than zero")]
    InvalidSampleRate,

    /// The declared sample count does not match the samples handed over.
    #[error("sample count mismatch: declared {declared}, got {actual}")]
    SampleCountMismatch {
        /// Sample count announced by the decoder.
        declared: usize,
        /// Number of samples actually present.
        actual: usize,
    },

    /// A position with a NaN or infinite coordinate.
    #[error("invalid geometry: position ({x}, {y}) is not finite")]
    InvalidGeometry {
        /// Rejected x coordinate.
        x: f32,
        /// Rejected y coordinate.
        y: f32,
    },

    /// A configuration value outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot decode audio: {0}")]
    Decoder(#[from] rodio::decoder::DecoderError),

    /// The host has no default output device.
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The device reported a failure while the stream was running.
    #[error("audio device failure: {0}")]
    Device(String),
}

/// Convenience Result type for the binaural engine.
pub type Result<T> = std::result::Result<T, Error>;
