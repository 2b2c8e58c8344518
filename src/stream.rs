//! Pull binaural audio through `rodio` instead of a device callback.

use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

use crate::renderer::OutputBuffer;
use crate::transport::{DriverStatus, StreamStatus, TimeInfo, Transport, TransportState};

/// Interleaved stereo stream rendered in fixed-size blocks.
///
/// Behaves like an output driver with a buffer of `frames_per_buffer` frames, so
/// listener motion is tracked with the same granularity as during live playback. The
/// stream is endless (the source is padded with silence) until its transport is
/// asked to stop. Samples are produced at the source's pace; `sample_rate` is only
/// what the stream reports to `rodio`, as a device would play them.
pub struct BinauralStream {
    transport: Transport,
    block: Vec<f32>,
    position: usize,
    sample_rate: u32,
    finished: bool,
}

impl BinauralStream {
    pub fn new(transport: Transport, frames_per_buffer: usize, sample_rate: u32) -> Self {
        let block = vec![0.0; 2 * frames_per_buffer.max(1)];
        BinauralStream {
            transport,
            position: block.len(),
            block,
            sample_rate,
            finished: false,
        }
    }

    pub fn state(&self) -> &Arc<TransportState> {
        self.transport.state()
    }

    fn refill(&mut self) -> bool {
        let status = self.transport.process(
            &mut OutputBuffer::interleaved(&mut self.block, 2),
            TimeInfo::default(),
            DriverStatus::default(),
        );
        self.position = 0;
        status == StreamStatus::Continue
    }
}

impl Source for BinauralStream {
    #[inline(always)]
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    #[inline(always)]
    fn channels(&self) -> u16 {
        2
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

impl Iterator for BinauralStream {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.position == self.block.len() && !self.refill() {
            self.finished = true;
            return None;
        }

        let sample = self.block[self.position];
        self.position += 1;
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::geometry::Vec2;
    use crate::listener::{Listener, ListenerController};
    use crate::renderer::BinauralRenderer;
    use crate::source::{DecodedAudio, SoundSource};

    fn stream_of(
        samples: Vec<i16>,
        frames_per_buffer: usize,
    ) -> (BinauralStream, Arc<ListenerController>) {
        let source = SoundSource::from_decoded(DecodedAudio::mono(4, samples)).unwrap();
        let listener = ListenerController::new(Listener::new().moved_to(Vec2::new(0.0, -1.0)).unwrap());
        let renderer =
            BinauralRenderer::new(Arc::new(source), listener.clone(), RenderConfig::default()).unwrap();
        let (transport, _) = Transport::new(renderer);
        (BinauralStream::new(transport, frames_per_buffer, 4), listener)
    }

    fn stream(frames_per_buffer: usize) -> (BinauralStream, Arc<ListenerController>) {
        stream_of(vec![i16::MAX, -i16::MAX, 0, 0], frames_per_buffer)
    }

    #[test]
    fn interleaves_left_and_right() {
        let (stream, _) = stream(3);
        assert_eq!(stream.channels(), 2);
        assert_eq!(stream.sample_rate(), 4);

        let samples: Vec<f32> = stream.take(8).collect();
        for frame in samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(samples[0] > 0.9);
        assert!(samples[2] < -0.9);
        assert_eq!(&samples[6..], &[0.0, 0.0]);
    }

    #[test]
    fn block_size_does_not_change_a_static_scene() {
        let (a, _) = stream(1);
        let (b, _) = stream(5);
        let a: Vec<f32> = a.take(20).collect();
        let b: Vec<f32> = b.take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn ends_when_stopped() {
        let (mut stream, _) = stream(2);
        assert!(stream.next().is_some());
        stream.state().request_stop();
        // The block rendered before the request is still played out.
        assert_eq!(stream.by_ref().count(), 3);
        assert!(stream.next().is_none());
    }

    #[test]
    fn picks_up_listener_moves_at_block_boundaries() {
        let (mut stream, listener) = stream_of(vec![i16::MAX; 16], 2);
        let first: Vec<f32> = stream.by_ref().take(4).collect();
        listener.set_position(Vec2::new(0.0, -10.0)).unwrap();
        let later: Vec<f32> = stream.by_ref().take(2).collect();

        assert!(first[0] > 0.9);
        // Far away the remaining signal is much quieter.
        assert!(later.iter().all(|&s| s > 0.0 && s < 0.05));
    }
}
