//! Glue between an audio output driver's callback and the binaural renderer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::renderer::{BinauralRenderer, OutputBuffer};

/// What the driver should do after a callback returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    /// Keep invoking the callback.
    Continue,
    /// Play out what was written, then stop.
    Stop,
    /// Stop immediately; the device is in trouble.
    Abort,
}

/// Conditions reported by the driver alongside a callback.
///
/// Drivers that cannot detect a condition leave its flag unset; `cpal` reports none.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DriverStatus {
    /// The device ran out of data since the previous callback.
    pub output_underflow: bool,
}

/// Timing of a callback as reported by the driver.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeInfo {
    /// Delay between this callback and the moment its first frame is played.
    pub output_latency: Option<Duration>,
}

/// State shared between the callback and the thread controlling playback.
///
/// Only atomics, so the callback never waits on the controlling thread.
#[derive(Debug, Default)]
pub struct TransportState {
    stop_requested: AtomicBool,
    fault: AtomicBool,
    underruns: AtomicU64,
    frames_rendered: AtomicU64,
    output_latency_ns: AtomicU64,
}

impl TransportState {
    /// Ask the callback to go silent and report [`StreamStatus::Stop`].
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Record a device failure; the next callback reports [`StreamStatus::Abort`].
    pub fn report_fault(&self) {
        self.fault.store(true, Ordering::SeqCst);
    }

    pub fn has_fault(&self) -> bool {
        self.fault.load(Ordering::SeqCst)
    }

    /// Number of callbacks that were flagged with an output underflow.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Playback cursor of the renderer as of the last completed callback.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    /// Output latency reported with the last callback, if the driver reports it.
    pub fn output_latency(&self) -> Option<Duration> {
        match self.output_latency_ns.load(Ordering::Relaxed) {
            0 => None,
            ns => Some(Duration::from_nanos(ns)),
        }
    }

    /// Status the callback would report right now.
    pub fn status(&self) -> StreamStatus {
        if self.has_fault() {
            StreamStatus::Abort
        } else if self.stop_requested() {
            StreamStatus::Stop
        } else {
            StreamStatus::Continue
        }
    }
}

/// Callback target for an output driver.
///
/// Does no audio math of its own: it forwards the driver's buffer to the renderer and
/// translates the shared state into a [`StreamStatus`].
pub struct Transport {
    renderer: BinauralRenderer,
    state: Arc<TransportState>,
}

impl Transport {
    /// Wrap `renderer`; the returned state is the controlling thread's half.
    pub fn new(renderer: BinauralRenderer) -> (Self, Arc<TransportState>) {
        let state = Arc::new(TransportState::default());
        let transport = Transport {
            renderer,
            state: state.clone(),
        };
        (transport, state)
    }

    /// Fill `output` for one driver callback.
    ///
    /// Once stopping or aborting, the buffer is silenced and the renderer is left
    /// untouched.
    pub fn process(
        &mut self,
        output: &mut OutputBuffer,
        time: TimeInfo,
        status: DriverStatus,
    ) -> StreamStatus {
        let next = self.state.status();
        if next != StreamStatus::Continue {
            output.silence();
            return next;
        }

        if status.output_underflow {
            self.state.underruns.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(latency) = time.output_latency {
            let ns = latency.as_nanos().min(u128::from(u64::MAX)) as u64;
            self.state.output_latency_ns.store(ns, Ordering::Relaxed);
        }

        self.renderer.render(output);
        self.state
            .frames_rendered
            .store(self.renderer.cursor(), Ordering::Relaxed);

        StreamStatus::Continue
    }

    pub fn renderer(&self) -> &BinauralRenderer {
        &self.renderer
    }

    pub fn state(&self) -> &Arc<TransportState> {
        &self.state
    }
}
