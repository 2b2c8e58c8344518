//! Render a mono source to the two ears of a moving listener.
//!
//! Each ear hears the source delayed by its time of flight and attenuated with the
//! inverse square of its distance. Delay and gain are computed once per rendered
//! buffer from the geometry at the start of the buffer, so the size of the buffers
//! requested by the output driver sets how finely listener motion (and the doppler
//! shift it causes) is tracked.

use std::sync::Arc;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::geometry::Spatial;
use crate::listener::{Ear, Listener, ListenerController};
use crate::source::SoundSource;

/// Caller-owned stereo output of a render call.
pub enum OutputBuffer<'a> {
    /// One slice per ear. The shorter slice sets the number of frames; the rest of the
    /// longer one is silenced.
    Planar {
        left: &'a mut [f32],
        right: &'a mut [f32],
    },
    /// Frames of `channels` samples each. The left ear goes to the first channel, the
    /// right ear to the second, any further channels are silenced. A single channel
    /// receives the average of both ears.
    Interleaved { data: &'a mut [f32], channels: usize },
}

impl<'a> OutputBuffer<'a> {
    pub fn planar(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        OutputBuffer::Planar { left, right }
    }

    pub fn interleaved(data: &'a mut [f32], channels: usize) -> Self {
        OutputBuffer::Interleaved { data, channels }
    }

    pub fn frames(&self) -> usize {
        match self {
            OutputBuffer::Planar { left, right } => left.len().min(right.len()),
            OutputBuffer::Interleaved { data, channels } => match *channels {
                0 => 0,
                n => data.len() / n,
            },
        }
    }

    #[inline]
    fn write(&mut self, frame: usize, left: f32, right: f32) {
        match self {
            OutputBuffer::Planar { left: l, right: r } => {
                l[frame] = left;
                r[frame] = right;
            }
            OutputBuffer::Interleaved { data, channels } => {
                let channels = *channels;
                let out = &mut data[frame * channels..(frame + 1) * channels];
                if channels == 1 {
                    out[0] = 0.5 * (left + right);
                } else {
                    out[0] = left;
                    out[1] = right;
                    for x in &mut out[2..] {
                        *x = 0.0;
                    }
                }
            }
        }
    }

    /// Zero the whole buffer, including any trailing partial frame.
    pub fn silence(&mut self) {
        self.silence_from(0);
    }

    /// Zero everything from `frame` on that does not belong to an earlier frame.
    fn silence_from(&mut self, frame: usize) {
        match self {
            OutputBuffer::Planar { left, right } => {
                let left = left.iter_mut().skip(frame);
                for x in left.chain(right.iter_mut().skip(frame)) {
                    *x = 0.0;
                }
            }
            OutputBuffer::Interleaved { data, channels } => {
                let start = frame.saturating_mul(*channels);
                for x in data.iter_mut().skip(start) {
                    *x = 0.0;
                }
            }
        }
    }
}

/// How the source reaches one ear during one buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EarPropagation {
    pub squared_distance: f32,
    /// Time of flight in (fractional) samples of the source.
    pub delay: f32,
    /// Whole samples of `delay`.
    pub whole: u64,
    /// Remainder of `delay` in `[0, 1)`, the weight of the later interpolation tap.
    pub fraction: f32,
    pub gain: f32,
}

impl EarPropagation {
    fn new(source: &SoundSource, ear: &Ear, config: &RenderConfig) -> Self {
        let squared_distance = ear.squared_distance(source);
        let delay = source.sample_rate() as f32 * squared_distance.sqrt() / config.speed_of_sound;
        let whole = delay.floor();
        // Absurdly distant sources overflow to an infinite delay; they are simply never heard.
        let fraction = if delay.is_finite() { delay - whole } else { 0.0 };
        let gain = if squared_distance > 0.0 {
            (1.0 / squared_distance).min(config.max_gain)
        } else {
            config.max_gain
        };

        EarPropagation {
            squared_distance,
            delay,
            whole: whole as u64,
            fraction,
            gain,
        }
    }

    /// What the ear hears at absolute frame `t`.
    #[inline]
    fn hear(&self, samples: &[f32], t: u64) -> f32 {
        let whole = self.whole.min(i64::MAX as u64) as i64;
        let index = (t as i64).saturating_sub(whole);
        let s0 = tap(samples, index);
        let s1 = tap(samples, index.saturating_add(1));
        (s0 * (1.0 - self.fraction) + s1 * self.fraction) * self.gain
    }
}

/// Source sample `k`, or silence before the start and after the end of the waveform.
#[inline]
fn tap(samples: &[f32], k: i64) -> f32 {
    if k < 0 {
        return 0.0;
    }
    samples.get(k as usize).copied().unwrap_or(0.0)
}

/// Binaural renderer bound to one source and one listener.
///
/// The renderer keeps its own playback cursor: the absolute frame of the first sample
/// produced by the next call to [`BinauralRenderer::render`]. It advances by exactly
/// the number of rendered frames.
pub struct BinauralRenderer {
    source: Arc<SoundSource>,
    listener: Arc<ListenerController>,
    config: RenderConfig,
    cursor: u64,
    last: [EarPropagation; 2],
}

impl BinauralRenderer {
    pub fn new(
        source: Arc<SoundSource>,
        listener: Arc<ListenerController>,
        config: RenderConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(BinauralRenderer {
            source,
            listener,
            config,
            cursor: 0,
            last: Default::default(),
        })
    }

    /// Fill `output` with the next frames and advance the cursor by the frame count.
    ///
    /// Performs one atomic load of the listener geometry and no allocation.
    pub fn render(&mut self, output: &mut OutputBuffer) -> usize {
        let frames = output.frames();
        let [left, right] = self.propagation(&self.listener.snapshot());
        let samples = self.source.samples();

        for i in 0..frames {
            let t = self.cursor + i as u64;
            output.write(i, left.hear(samples, t), right.hear(samples, t));
        }
        output.silence_from(frames);

        self.last = [left, right];
        self.cursor += frames as u64;
        frames
    }

    pub fn render_planar(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        self.render(&mut OutputBuffer::planar(left, right))
    }

    /// Per-ear delay and gain for `listener` hearing this renderer's source, left first.
    pub fn propagation(&self, listener: &Listener) -> [EarPropagation; 2] {
        let [left, right] = listener.ears();
        [
            EarPropagation::new(&self.source, left, &self.config),
            EarPropagation::new(&self.source, right, &self.config),
        ]
    }

    /// Propagation used by the most recent render call.
    pub fn last_propagation(&self) -> [EarPropagation; 2] {
        self.last
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<SoundSource> {
        &self.source
    }

    pub fn listener(&self) -> &Arc<ListenerController> {
        &self.listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;
    use crate::source::DecodedAudio;

    const EPS: f32 = 1e-4;

    fn source(sample_rate: u32, samples: &[f32]) -> Arc<SoundSource> {
        let raw = samples
            .iter()
            .map(|&s| (s * f32::from(i16::MAX)) as i16)
            .collect();
        Arc::new(SoundSource::from_decoded(DecodedAudio::mono(sample_rate, raw)).unwrap())
    }

    fn renderer(source: Arc<SoundSource>, at: Vec2) -> BinauralRenderer {
        let listener = ListenerController::new(Listener::new().moved_to(at).unwrap());
        BinauralRenderer::new(source, listener, RenderConfig::default()).unwrap()
    }

    fn render(renderer: &mut BinauralRenderer, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![f32::NAN; frames];
        let mut right = vec![f32::NAN; frames];
        assert_eq!(renderer.render_planar(&mut left, &mut right), frames);
        (left, right)
    }

    #[test]
    fn symmetric_listener_hears_the_same_on_both_ears() {
        let mut renderer = renderer(source(4, &[1.0, -1.0, 0.5, 0.0]), Vec2::new(0.0, -1.0));
        let (left, right) = render(&mut renderer, 4);

        assert_eq!(left, right);
        let expected = [0.970_962_9, -0.976_823_8, 0.491_342_35, 0.0];
        for (got, want) in left.iter().zip(expected.iter()) {
            assert!((got - want).abs() < EPS, "{} != {}", got, want);
        }

        let [l, r] = renderer.last_propagation();
        assert_eq!(l, r);
        assert_eq!(l.whole, 0);
        assert!((l.squared_distance - 1.005_625).abs() < EPS);
        assert!((l.delay - 0.011_787_694).abs() < EPS);
        assert_eq!(l.fraction, l.delay);
        assert!((l.gain - 0.994_406_5).abs() < EPS);
    }

    #[test]
    fn output_follows_the_interpolation_rule() {
        let samples = [1.0, -1.0, 0.5, 0.0];
        let mut renderer = renderer(source(4, &samples), Vec2::new(0.5, -1.0));
        let (left, right) = render(&mut renderer, 6);

        let normalized = renderer.source().samples().to_vec();
        let [l, r] = renderer.last_propagation();
        assert!(l.squared_distance < r.squared_distance);
        assert!(l.gain > r.gain);
        assert!(l.delay < r.delay);

        for (ear, out) in [(l, &left), (r, &right)].iter() {
            for (t, &got) in out.iter().enumerate() {
                let at = |k: i64| tap(&normalized, k);
                let k = t as i64 - ear.whole as i64;
                let want = (at(k) * (1.0 - ear.fraction) + at(k + 1) * ear.fraction) * ear.gain;
                assert_eq!(got, want);
            }
        }
        assert_eq!(&left[4..], &[0.0, 0.0]);
        assert_eq!(&right[4..], &[0.0, 0.0]);
    }

    #[test]
    fn cursor_advances_by_rendered_frames() {
        let mut renderer = renderer(source(8000, &[0.5; 32]), Vec2::new(0.0, -1.0));
        assert_eq!(renderer.cursor(), 0);
        for call in 1..=10u64 {
            render(&mut renderer, 16);
            assert_eq!(renderer.cursor(), call * 16);
        }
        render(&mut renderer, 0);
        assert_eq!(renderer.cursor(), 160);
    }

    #[test]
    fn renderers_keep_separate_cursors() {
        let source = source(8000, &[0.5; 32]);
        let mut a = renderer(source.clone(), Vec2::new(0.0, -1.0));
        let mut b = renderer(source, Vec2::new(0.0, -1.0));
        render(&mut a, 8);
        render(&mut a, 8);
        render(&mut b, 8);
        assert_eq!(a.cursor(), 16);
        assert_eq!(b.cursor(), 8);
    }

    #[test]
    fn far_listener_hears_silence_until_the_sound_arrives() {
        // 1000 Hz source 34.029 units away: roughly 100 samples of flight time.
        let mut renderer = renderer(source(1000, &[1.0; 4]), Vec2::new(0.0, -34.029));
        let (left, right) = render(&mut renderer, 200);

        let [l, r] = renderer.last_propagation();
        assert_eq!(l, r);
        assert_eq!(l.whole, 100);
        assert!(l.fraction > 0.0);
        assert!(left[..99].iter().chain(right[..99].iter()).all(|&s| s == 0.0));
        // The frame before arrival already carries the first sample's share of the later tap.
        let first = renderer.source().sample(0);
        assert_eq!(left[99], (0.0 * (1.0 - l.fraction) + first * l.fraction) * l.gain);
        assert_eq!(right[99], left[99]);
        assert!(left[100..104].iter().all(|&s| s > 0.0));
        assert!(left[104..].iter().chain(right[104..].iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn empty_source_renders_silence() {
        let mut renderer = renderer(Arc::new(SoundSource::default()), Vec2::new(0.0, -1.0));
        let (left, right) = render(&mut renderer, 32);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        assert_eq!(renderer.cursor(), 32);
    }

    #[test]
    fn gain_is_clamped_at_the_source() {
        // The left ear sits exactly on the source.
        let dc = DecodedAudio::take(crate::sources::Constant::full_scale(8000), 8);
        let dc = Arc::new(SoundSource::from_decoded(dc).unwrap());
        let mut renderer = renderer(dc, Vec2::new(0.075, 0.0));
        let (left, right) = render(&mut renderer, 4);

        let [l, r] = renderer.last_propagation();
        assert_eq!(l.squared_distance, 0.0);
        assert_eq!(l.gain, RenderConfig::default().max_gain);
        assert_eq!(left, vec![3.0; 4]);
        // 0.15 units away the inverse square is far above the ceiling too.
        assert_eq!(r.gain, 3.0);
        assert!(right.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn moving_between_calls_changes_the_delay() {
        let mut renderer = renderer(source(44100, &[0.25; 4096]), Vec2::new(0.0, -1.0));
        render(&mut renderer, 8);
        let before = renderer.last_propagation();

        renderer.listener().set_position(Vec2::new(0.0, -2.0)).unwrap();
        render(&mut renderer, 8);
        let after = renderer.last_propagation();

        for (b, a) in before.iter().zip(after.iter()) {
            assert!(a.delay > b.delay);
            assert!(a.gain < b.gain);
        }
        let expected = renderer.propagation(&renderer.listener().snapshot());
        assert_eq!(after, expected);
    }

    #[test]
    fn interleaved_output_matches_planar() {
        let source = source(4, &[1.0, -1.0, 0.5, 0.0]);
        let at = Vec2::new(0.5, -1.0);
        let (left, right) = render(&mut renderer(source.clone(), at), 4);

        let mut data = vec![f32::NAN; 4 * 3];
        let mut surround = renderer(source.clone(), at);
        assert_eq!(surround.render(&mut OutputBuffer::interleaved(&mut data, 3)), 4);
        for i in 0..4 {
            assert_eq!(data[3 * i], left[i]);
            assert_eq!(data[3 * i + 1], right[i]);
            assert_eq!(data[3 * i + 2], 0.0);
        }

        let mut mono = vec![f32::NAN; 2];
        renderer(source, at).render(&mut OutputBuffer::interleaved(&mut mono, 1));
        assert_eq!(mono[0], 0.5 * (left[0] + right[0]));
        assert_eq!(mono[1], 0.5 * (left[1] + right[1]));
    }

    #[test]
    fn unreachable_source_is_silent() {
        let mut renderer = renderer(source(44100, &[1.0; 4]), Vec2::new(0.0, -3.0e19));
        let (left, right) = render(&mut renderer, 8);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn longer_planar_slice_is_silenced_past_the_shorter_one() {
        let mut renderer = renderer(source(4, &[1.0, 1.0, 1.0, 1.0]), Vec2::new(0.0, -1.0));
        let mut left = vec![9.0; 4];
        let mut right = vec![9.0; 2];
        assert_eq!(renderer.render_planar(&mut left, &mut right), 2);
        assert!(left[0] > 0.9);
        assert_eq!(left[1], right[1]);
        assert_eq!(&left[2..], &[0.0, 0.0]);
        assert_eq!(renderer.cursor(), 2);

        let mut data = vec![9.0; 5];
        assert_eq!(renderer.render(&mut OutputBuffer::interleaved(&mut data, 2)), 2);
        assert_eq!(data[4], 0.0);
    }

    #[test]
    fn partial_frames_are_ignored() {
        let mut data = vec![0.0; 5];
        assert_eq!(OutputBuffer::interleaved(&mut data, 2).frames(), 2);
        assert_eq!(OutputBuffer::interleaved(&mut data, 0).frames(), 0);

        let mut left = vec![1.0; 3];
        let mut right = vec![1.0; 2];
        let mut buffer = OutputBuffer::planar(&mut left, &mut right);
        assert_eq!(buffer.frames(), 2);
        buffer.silence();
        assert_eq!(left, vec![0.0; 3]);
    }
}
