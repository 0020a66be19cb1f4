//! Recording and composer configuration.

use serde::{Deserialize, Serialize};

use crate::codec;

/// Video codec of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
}

/// Audio codec of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioCodec {
    /// AAC low complexity.
    #[default]
    AacLc,
    /// AAC enhanced low delay.
    AacEld,
}

impl AudioCodec {
    /// Number of PCM samples carried by one encoded frame.
    ///
    /// Used as the duration of the last audio sample in a fragment, whose
    /// successor has not been captured yet.
    pub fn samples_per_frame(self) -> u32 {
        match self {
            AudioCodec::AacLc => 1024,
            AudioCodec::AacEld => 480,
        }
    }
}

/// Video track parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfiguration {
    /// Codec used by the track.
    pub codec: VideoCodec,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Media timescale (ticks per second). Also used as the movie timescale.
    pub timescale: u32,
    /// Sequence parameter set NAL unit, without start code.
    pub sps: Vec<u8>,
    /// Picture parameter set NAL unit, without start code.
    pub pps: Vec<u8>,
    /// Size of the length prefix in front of each NAL unit (1 to 4 bytes).
    pub nalu_length_size: u8,
}

/// Audio track parameters.
///
/// A channel count of zero means the recording has no audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfiguration {
    /// Codec used by the track.
    pub codec: AudioCodec,
    /// Number of channels, 0 when audio is disabled.
    pub channels: u8,
    /// Sample rate in Hz. Also used as the audio media timescale.
    pub sample_rate: u32,
    /// Bit rate in bits per second.
    pub bit_rate: u32,
}

impl AudioConfiguration {
    /// An audio configuration that produces no audio track.
    pub fn disabled() -> Self {
        Self {
            codec: AudioCodec::AacLc,
            channels: 0,
            sample_rate: 0,
            bit_rate: 0,
        }
    }

    /// Whether the recording carries an audio track.
    pub fn is_enabled(&self) -> bool {
        self.channels != 0
    }

    /// MPEG-4 sampling frequency index for the configured sample rate.
    ///
    /// Only 8, 16, 24, 32, 44.1 and 48 kHz are mapped. Any other rate is
    /// reported as 16 kHz (index 8), which players will then decode at the
    /// wrong speed; callers should stick to the mapped rates.
    pub fn sampling_frequency_index(&self) -> u8 {
        codec::sampling_frequency_index(self.sample_rate)
    }
}

/// Parameters of one recording session, fixed for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingConfiguration {
    /// Video track parameters.
    pub video: VideoConfiguration,
    /// Audio track parameters.
    pub audio: AudioConfiguration,
}

impl RecordingConfiguration {
    /// Whether the movie header will contain an audio track.
    pub fn has_audio(&self) -> bool {
        self.audio.is_enabled()
    }

    /// Check the preconditions the composer relies on.
    ///
    /// # Panics
    ///
    /// Panics if the NAL unit length size is outside 1..=4 or if the SPS is
    /// too short to carry profile, constraint and level bytes.
    pub(crate) fn assert_valid(&self) {
        assert!(
            (1..=4).contains(&self.video.nalu_length_size),
            "NAL unit length size must be 1 to 4 bytes, got {}",
            self.video.nalu_length_size
        );
        assert!(
            self.video.sps.len() >= 4,
            "SPS must hold at least 4 bytes, got {}",
            self.video.sps.len()
        );
        debug_assert!(self.video.sps.len() <= u16::MAX as usize);
        debug_assert!(self.video.pps.len() <= u16::MAX as usize);
        debug_assert!(self.audio.channels <= 15, "channel configuration is 4 bits");
    }
}

/// How runs are grouped into track fragment (`traf`) boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrafLayout {
    /// One `traf` per track present in the fragment, holding all of that
    /// track's runs in supply order.
    #[default]
    PerTrack,
    /// One `traf` per run.
    PerRun,
}

/// Options fixed when a composer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComposerOptions {
    /// Grouping of runs into `traf` boxes.
    pub traf_layout: TrafLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RecordingConfiguration {
        RecordingConfiguration {
            video: VideoConfiguration {
                codec: VideoCodec::H264,
                width: 1920,
                height: 1080,
                timescale: 90000,
                sps: vec![0x67, 0x64, 0x00, 0x28, 0xAC],
                pps: vec![0x68, 0xEE, 0x3C, 0x80],
                nalu_length_size: 4,
            },
            audio: AudioConfiguration {
                codec: AudioCodec::AacEld,
                channels: 1,
                sample_rate: 24000,
                bit_rate: 32000,
            },
        }
    }

    #[test]
    fn test_audio_disabled() {
        let audio = AudioConfiguration::disabled();
        assert!(!audio.is_enabled());

        let mut cfg = config();
        assert!(cfg.has_audio());
        cfg.audio = audio;
        assert!(!cfg.has_audio());
    }

    #[test]
    fn test_samples_per_frame() {
        assert_eq!(AudioCodec::AacLc.samples_per_frame(), 1024);
        assert_eq!(AudioCodec::AacEld.samples_per_frame(), 480);
    }

    #[test]
    fn test_sampling_frequency_index() {
        let mut audio = config().audio;
        assert_eq!(audio.sampling_frequency_index(), 6);
        audio.sample_rate = 22050;
        assert_eq!(audio.sampling_frequency_index(), 8);
    }

    #[test]
    fn test_valid_config_passes() {
        config().assert_valid();
    }

    #[test]
    #[should_panic(expected = "NAL unit length size")]
    fn test_nalu_length_size_out_of_range() {
        let mut cfg = config();
        cfg.video.nalu_length_size = 0;
        cfg.assert_valid();
    }

    #[test]
    #[should_panic(expected = "SPS must hold")]
    fn test_short_sps() {
        let mut cfg = config();
        cfg.video.sps = vec![0x67, 0x42];
        cfg.assert_valid();
    }

    #[test]
    fn test_config_json_roundtrip() {
        let cfg = config();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"AacEld\""));
        let parsed: RecordingConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_default_layout_is_per_track() {
        assert_eq!(ComposerOptions::default().traf_layout, TrafLayout::PerTrack);
    }
}
