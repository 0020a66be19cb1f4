//! Codec descriptor tables: track IDs, fixed header fields, and the AAC
//! decoder configuration carried in `esds`.

use crate::config::{AudioCodec, AudioConfiguration};

/// Track ID of the video track.
pub const VIDEO_TRACK_ID: u32 = 1;

/// Track ID of the audio track.
pub const AUDIO_TRACK_ID: u32 = 2;

/// Identity transformation matrix (16.16 and 2.30 fixed point).
pub(crate) const UNITY_MATRIX: [u32; 9] = [
    0x0001_0000,
    0,
    0,
    0,
    0x0001_0000,
    0,
    0,
    0,
    0x4000_0000,
];

/// Pascal-string compressor name of the `avc1` sample entry, zero padded.
pub(crate) const H264_COMPRESSOR_NAME: [u8; 32] = {
    let mut name = [0u8; 32];
    name[0] = 4;
    name[1] = b'h';
    name[2] = b'2';
    name[3] = b'6';
    name[4] = b'4';
    name
};

/// ISO 639-2 "und" packed as three 5-bit letters.
pub(crate) const LANGUAGE_UNDETERMINED: u16 =
    ((b'u' - 0x60) as u16) << 10 | ((b'n' - 0x60) as u16) << 5 | (b'd' - 0x60) as u16;

// ---------------------------------------------------------------------------
// esds constants
// ---------------------------------------------------------------------------

pub(crate) const ES_DESCRIPTOR_TAG: u8 = 0x03;
pub(crate) const DECODER_CONFIG_DESCRIPTOR_TAG: u8 = 0x04;
pub(crate) const DECODER_SPECIFIC_INFO_TAG: u8 = 0x05;
pub(crate) const SL_CONFIG_DESCRIPTOR_TAG: u8 = 0x06;

pub(crate) const ES_ID: u16 = 0;
/// objectTypeIndication for MPEG-4 audio.
pub(crate) const OBJECT_TYPE_MPEG4_AUDIO: u8 = 0x40;
pub(crate) const STREAM_TYPE_AUDIO: u8 = 0x05;
/// Predefined SL configuration reserved for MP4 files.
pub(crate) const SL_CONFIG_PREDEFINED_MP4: u8 = 2;

const AUDIO_OBJECT_TYPE_AAC_LC: u32 = 2;
const AUDIO_OBJECT_TYPE_AAC_ELD: u32 = 39;
const AUDIO_OBJECT_TYPE_ESCAPE: u32 = 31;
const AUDIO_OBJECT_TYPE_ESCAPE_OFFSET: u32 = 32;

/// Sampling frequency index used for rates missing from the table (16 kHz).
pub const FALLBACK_SAMPLING_FREQUENCY_INDEX: u8 = 8;

const SAMPLING_FREQUENCY_INDICES: [(u32, u8); 6] = [
    (8000, 11),
    (16000, 8),
    (24000, 6),
    (32000, 5),
    (44100, 4),
    (48000, 3),
];

/// Look up the MPEG-4 sampling frequency index of `sample_rate`.
///
/// Rates outside the table fall back to
/// [`FALLBACK_SAMPLING_FREQUENCY_INDEX`].
pub fn sampling_frequency_index(sample_rate: u32) -> u8 {
    SAMPLING_FREQUENCY_INDICES
        .iter()
        .find(|(rate, _)| *rate == sample_rate)
        .map(|(_, index)| *index)
        .unwrap_or(FALLBACK_SAMPLING_FREQUENCY_INDEX)
}

/// The AudioSpecificConfig payload of the decoder specific info descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    bytes: [u8; 4],
    len: usize,
}

impl AudioSpecificConfig {
    /// Encode the decoder configuration for `audio`.
    ///
    /// AAC-LC packs object type, frequency index and channel configuration
    /// into two bytes. AAC-ELD needs the escaped object type and a frame
    /// length flag, four bytes in total.
    pub fn new(audio: &AudioConfiguration) -> Self {
        let frequency = audio.sampling_frequency_index() as u32;
        let channels = audio.channels as u32;
        match audio.codec {
            AudioCodec::AacLc => {
                let data = AUDIO_OBJECT_TYPE_AAC_LC << 11 // 5 bit object type
                    | frequency << 7 // 4 bit frequency index
                    | channels << 3; // 4 bit channel configuration, 3 bit flags
                let [_, _, hi, lo] = data.to_be_bytes();
                Self {
                    bytes: [hi, lo, 0, 0],
                    len: 2,
                }
            }
            AudioCodec::AacEld => {
                let data = AUDIO_OBJECT_TYPE_ESCAPE << 27 // 5 + 6 bit object type
                    | (AUDIO_OBJECT_TYPE_AAC_ELD - AUDIO_OBJECT_TYPE_ESCAPE_OFFSET) << 21
                    | frequency << 17 // 4 bit frequency index
                    | channels << 13 // 4 bit channel configuration
                    | 1 << 12; // frame length flag (480 samples)
                Self {
                    bytes: data.to_be_bytes(),
                    len: 4,
                }
            }
        }
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are encoded.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// streamType / upStream / reserved byte of the decoder config descriptor.
///
/// The reserved bit is only set for AAC-LC, matching what deployed
/// recording viewers were validated against.
pub(crate) fn decoder_stream_type(codec: AudioCodec) -> u8 {
    match codec {
        AudioCodec::AacLc => STREAM_TYPE_AUDIO << 2 | 1,
        AudioCodec::AacEld => STREAM_TYPE_AUDIO << 2,
    }
}
