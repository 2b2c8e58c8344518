//! Mono 16 bit test signals implementing `rodio::Source`.
//!
//! All of them are infinite; record a finite stretch with
//! [`DecodedAudio::take`](crate::DecodedAudio::take) before building a
//! [`SoundSource`](crate::SoundSource).

mod constant;
mod noise;
mod ramp;
mod sine;

pub use self::constant::Constant;
pub use self::noise::Noise;
pub use self::ramp::Ramp;
pub use self::sine::SineWave;
