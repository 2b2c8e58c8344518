//! Drive a [`Transport`] from a `cpal` output stream.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info, warn};

use crate::config::OutputConfig;
use crate::error::{Error, Result};
use crate::renderer::OutputBuffer;
use crate::transport::{DriverStatus, StreamStatus, TimeInfo, Transport, TransportState};

/// The host's default output device.
pub fn default_device() -> Result<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or(Error::NoOutputDevice)
}

/// What the stream callbacks leave behind for the controlling thread.
struct DeviceLink {
    state: Arc<TransportState>,
    error: Mutex<Option<String>>,
    reported: AtomicU8,
}

impl DeviceLink {
    fn new(state: Arc<TransportState>) -> Self {
        DeviceLink {
            state,
            error: Mutex::new(None),
            reported: AtomicU8::new(0),
        }
    }

    /// One data callback: render into `data` and keep the status the transport returned.
    fn fill(&self, transport: &mut Transport, data: &mut [f32], channels: usize, time: TimeInfo) {
        // cpal reports no driver conditions.
        let status = transport.process(
            &mut OutputBuffer::interleaved(data, channels),
            time,
            DriverStatus::default(),
        );
        let code = match status {
            StreamStatus::Continue => 0,
            StreamStatus::Stop => 1,
            StreamStatus::Abort => 2,
        };
        self.reported.store(code, Ordering::Relaxed);
    }

    fn reported(&self) -> StreamStatus {
        match self.reported.load(Ordering::Relaxed) {
            0 => StreamStatus::Continue,
            1 => StreamStatus::Stop,
            _ => StreamStatus::Abort,
        }
    }

    /// Error callback: keep the first message and make the transport abort.
    fn report(&self, message: String) {
        if let Ok(mut error) = self.error.lock() {
            error.get_or_insert(message);
        }
        self.state.report_fault();
    }

    fn check(&self) -> Result<()> {
        if !self.state.has_fault() {
            return Ok(());
        }
        let message = self
            .error
            .lock()
            .ok()
            .and_then(|error| error.clone())
            .unwrap_or_else(|| "unknown device error".to_string());
        Err(Error::Device(message))
    }
}

/// A running output stream.
///
/// Dropping the handle stops playback the same way [`Playback::stop`] does.
pub struct Playback {
    stream: Option<Box<dyn StreamTrait>>,
    link: Arc<DeviceLink>,
    config: OutputConfig,
}

impl Playback {
    /// Open a stereo stream on `device` and start feeding it from `transport`.
    ///
    /// The transport, and with it the renderer, source and listener it holds, moves
    /// into the stream callback and lives until the stream is torn down.
    pub fn start(device: &cpal::Device, config: OutputConfig, mut transport: Transport) -> Result<Self> {
        config.validate()?;

        let stream_config = cpal::StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.frames_per_buffer),
        };
        let channels = usize::from(stream_config.channels);

        let link = Arc::new(DeviceLink::new(transport.state().clone()));
        let data_link = link.clone();
        let error_link = link.clone();

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], info: &cpal::OutputCallbackInfo| {
                let timestamp = info.timestamp();
                let time = TimeInfo {
                    output_latency: timestamp.playback.duration_since(&timestamp.callback),
                };
                data_link.fill(&mut transport, data, channels, time);
            },
            move |err| {
                error!("audio device error: {}", err);
                error_link.report(err.to_string());
            },
        )?;
        stream.play()?;

        info!(
            "playing on {} at {} Hz, {} frames per buffer",
            device.name().unwrap_or_else(|_| "unnamed device".to_string()),
            config.sample_rate,
            config.frames_per_buffer
        );

        Ok(Playback::with_stream(Box::new(stream), link, config))
    }

    fn with_stream(stream: Box<dyn StreamTrait>, link: Arc<DeviceLink>, config: OutputConfig) -> Self {
        Playback {
            stream: Some(stream),
            link,
            config,
        }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Status returned by the most recent stream callback.
    pub fn status(&self) -> StreamStatus {
        self.link.reported()
    }

    /// Frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.link.state.frames_rendered()
    }

    /// Fail if the device reported an error since playback started.
    pub fn check(&self) -> Result<()> {
        self.link.check()
    }

    /// Stop playback.
    ///
    /// When this returns the callback has finished for good, so whatever it
    /// references can be released. A device failure seen during playback is reported
    /// here if it was not picked up through [`Playback::check`] before.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown();
        self.check()
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.link.state.request_stop();
            if let Err(err) = stream.pause() {
                warn!("cannot pause output stream: {}", err);
            }
            // Dropping the stream joins its callback.
            drop(stream);
            debug!(
                "output stream closed after {} frames",
                self.link.state.frames_rendered()
            );
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.shutdown();
    }
}
