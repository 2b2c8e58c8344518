/**
Plays a mono audio file with the listener circling the source.

    cargo run --example play_file -- speech.wav
*/
use flat_concert::{ConcertBuilder, SoundSource, Vec2};
use std::thread::sleep;
use std::time::Duration;

fn main() -> flat_concert::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: play_file <mono audio file>");
            std::process::exit(1);
        }
    };

    let source = SoundSource::open(path)?;
    let seconds = source.sample_count() as f32 / source.sample_rate() as f32;
    let concert = ConcertBuilder::new().build(source)?;

    let steps = (seconds * 100.0) as u32;
    for i in 0..steps {
        let angle = i as f32 / 100.0;
        concert.move_listener(Vec2::new(angle.sin(), -angle.cos()) * 2.0)?;
        sleep(Duration::from_millis(10));
    }

    log::info!("{} frames rendered", concert.playback().frames_rendered());
    concert.stop()
}
