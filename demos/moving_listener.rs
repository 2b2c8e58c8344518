use flat_concert::{sources, ConcertBuilder, DecodedAudio, SoundSource, Vec2};
use std::thread::sleep;
use std::time::Duration;

fn main() -> flat_concert::Result<()> {
    env_logger::init();

    let source = match std::env::args().nth(1) {
        Some(path) => SoundSource::open(path)?,
        None => SoundSource::from_decoded(DecodedAudio::take(
            sources::SineWave::new(440.0, 44100),
            20 * 44100,
        ))?,
    };
    let concert = ConcertBuilder::new()
        .with_listener_position(Vec2::new(-10.0, -1.0))
        .build(source)?;

    // walk past the source from left to right at 10 units per second
    for i in 0..2000 {
        concert.move_listener(Vec2::new(-10.0 + i as f32 / 100.0, -1.0))?;
        sleep(Duration::from_millis(1));
        concert.playback().check()?;
    }

    concert.stop()
}
