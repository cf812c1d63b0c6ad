//! Audio containers for synthesized speech

pub mod wav;

pub use wav::{encode, AudioContainer, EncodingError, PcmFormat};

/// Sample rate assumed when a PCM mime type does not state one
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Read the sample rate out of a PCM mime type
///
/// `audio/L16;codec=pcm;rate=24000` yields 24000; anything without a
/// parsable `rate` parameter falls back to [`DEFAULT_SAMPLE_RATE`].
pub fn sample_rate_from_mime(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|rate| *rate > 0)
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}
