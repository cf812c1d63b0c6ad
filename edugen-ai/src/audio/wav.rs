//! Canonical 44-byte-header PCM WAV encoding
//!
//! Layout (all integers little-endian):
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 4 | `RIFF` |
//! | 4 | 4 | file size - 8 (`36 + dataSize`) |
//! | 8 | 4 | `WAVE` |
//! | 12 | 4 | `fmt ` |
//! | 16 | 4 | fmt chunk size (16) |
//! | 20 | 2 | format tag (1 = PCM) |
//! | 22 | 2 | channels |
//! | 24 | 4 | sample rate |
//! | 28 | 4 | byte rate |
//! | 32 | 2 | block align |
//! | 34 | 2 | bits per sample |
//! | 36 | 4 | `data` |
//! | 40 | 4 | data size |
//! | 44 | n | samples |

use base64::Engine;
use thiserror::Error;

pub const HEADER_LEN: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("channel count must be at least 1")]
    NoChannels,

    #[error("sample rate must be at least 1 Hz")]
    NoSampleRate,

    #[error("unsupported bit depth {0} (expected 8, 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    #[error("sample buffer of {len} bytes is not a whole number of {block_align}-byte frames")]
    PartialFrame { len: usize, block_align: u16 },

    #[error("{0} channels do not fit a 16-bit block alignment")]
    TooManyChannels(u16),

    #[error("{sample_rate} Hz at {block_align} bytes per frame overflows the 32-bit byte rate")]
    ByteRateOverflow { sample_rate: u32, block_align: u16 },

    #[error("{0} bytes of samples exceed the 4 GiB RIFF limit")]
    TooLarge(usize),
}

/// Interleaved integer PCM sample layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// Mono 16-bit, the layout speech synthesis returns
    pub fn mono_16(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    fn check(&self) -> Result<(), EncodingError> {
        if self.channels == 0 {
            return Err(EncodingError::NoChannels);
        }
        if self.sample_rate == 0 {
            return Err(EncodingError::NoSampleRate);
        }
        if !matches!(self.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(EncodingError::UnsupportedBitDepth(self.bits_per_sample));
        }
        Ok(())
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Bytes per interleaved frame, as written to the header
    pub fn block_align(&self) -> Result<u16, EncodingError> {
        self.channels
            .checked_mul(self.bytes_per_sample())
            .ok_or(EncodingError::TooManyChannels(self.channels))
    }

    /// Bytes per second, as written to the header
    pub fn byte_rate(&self) -> Result<u32, EncodingError> {
        let block_align = self.block_align()?;
        self.sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or(EncodingError::ByteRateOverflow {
                sample_rate: self.sample_rate,
                block_align,
            })
    }
}

/// A complete WAV file; immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioContainer {
    format: PcmFormat,
    bytes: Vec<u8>,
}

impl AudioContainer {
    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn data_size(&self) -> usize {
        self.bytes.len() - HEADER_LEN
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// `data:audio/wav;base64,...`
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:audio/wav;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Wrap raw PCM samples in a WAV container
///
/// Pure: identical samples and format always produce identical bytes.
///
/// # Errors
///
/// Rejects an invalid format, a buffer that ends mid-frame, and data too
/// large for 32-bit RIFF sizes.
pub fn encode(samples: &[u8], format: PcmFormat) -> Result<AudioContainer, EncodingError> {
    format.check()?;

    let block_align = format.block_align()?;
    let byte_rate = format.byte_rate()?;

    if samples.len() % usize::from(block_align) != 0 {
        return Err(EncodingError::PartialFrame {
            len: samples.len(),
            block_align,
        });
    }

    let data_size = u32::try_from(samples.len())
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or(EncodingError::TooLarge(samples.len()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + samples.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    bytes.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    bytes.extend_from_slice(&format.channels.to_le_bytes());
    bytes.extend_from_slice(&format.sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    bytes.extend_from_slice(samples);

    Ok(AudioContainer { format, bytes })
}
