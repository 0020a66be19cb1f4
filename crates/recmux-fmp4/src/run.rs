//! Per-fragment sample runs.

use serde::{Deserialize, Serialize};

use crate::codec::{AUDIO_TRACK_ID, VIDEO_TRACK_ID};

/// Track a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    /// The H.264 track.
    Video,
    /// The AAC track.
    Audio,
}

impl TrackType {
    /// Track ID used in the movie header and fragments.
    pub fn track_id(self) -> u32 {
        match self {
            TrackType::Video => VIDEO_TRACK_ID,
            TrackType::Audio => AUDIO_TRACK_ID,
        }
    }
}

/// Metadata of one media sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SampleDescriptor {
    /// Sample size in bytes.
    pub size: u32,
    /// Sample duration in track timescale units. Must fit in 31 bits.
    pub duration: u32,
    /// Whether the sample is a key frame (IDR picture).
    pub is_key_frame: bool,
}

impl SampleDescriptor {
    /// Largest encodable duration.
    pub const MAX_DURATION: u32 = 0x7FFF_FFFF;

    /// Create a sample descriptor.
    pub fn new(size: u32, duration: u32, is_key_frame: bool) -> Self {
        debug_assert!(
            duration <= Self::MAX_DURATION,
            "sample duration exceeds 31 bits"
        );
        Self {
            size,
            duration,
            is_key_frame,
        }
    }

    /// Duration as written into a `trun` sample entry.
    pub fn wire_duration(&self) -> u32 {
        debug_assert!(
            self.duration <= Self::MAX_DURATION,
            "sample duration exceeds 31 bits"
        );
        self.duration & Self::MAX_DURATION
    }
}

/// A contiguous group of samples of one track within a fragment.
///
/// The sample payloads of all runs of a fragment are expected back to back in
/// the fragment's `mdat`, in the order the runs are supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor<'a> {
    /// Track of every sample in the run.
    pub track_type: TrackType,
    /// Decode time of the first sample, in track timescale units.
    pub decode_time: u64,
    /// Sample table of the run.
    pub samples: &'a [SampleDescriptor],
    /// Payload bytes of the run. Must equal the sum of the sample sizes.
    pub data_bytes: u32,
    data_offset_position: Option<usize>,
}

impl<'a> RunDescriptor<'a> {
    /// Create a run with an explicit payload size.
    pub fn new(
        track_type: TrackType,
        decode_time: u64,
        samples: &'a [SampleDescriptor],
        data_bytes: u32,
    ) -> Self {
        Self {
            track_type,
            decode_time,
            samples,
            data_bytes,
            data_offset_position: None,
        }
    }

    /// Create a run whose payload size is the sum of its sample sizes.
    pub fn from_samples(
        track_type: TrackType,
        decode_time: u64,
        samples: &'a [SampleDescriptor],
    ) -> Self {
        let data_bytes = samples.iter().map(|s| s.size).sum();
        Self::new(track_type, decode_time, samples, data_bytes)
    }

    /// Number of samples in the run.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Byte position of this run's `trun` data offset field in the buffer
    /// the fragment header was last written to.
    pub fn data_offset_position(&self) -> Option<usize> {
        self.data_offset_position
    }

    pub(crate) fn set_data_offset_position(&mut self, position: usize) {
        self.data_offset_position = Some(position);
    }
}

/// Description of one movie fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentConfiguration<'a> {
    /// Fragment sequence number, increasing across the recording.
    pub sequence_number: u32,
    /// Runs in the order their payloads follow in the `mdat`.
    pub runs: Vec<RunDescriptor<'a>>,
}

impl<'a> FragmentConfiguration<'a> {
    /// Create an empty fragment.
    pub fn new(sequence_number: u32) -> Self {
        Self {
            sequence_number,
            runs: Vec::new(),
        }
    }

    /// Add a run.
    pub fn with_run(mut self, run: RunDescriptor<'a>) -> Self {
        self.runs.push(run);
        self
    }

    /// Total payload bytes of all runs.
    pub fn data_bytes(&self) -> u64 {
        self.runs.iter().map(|r| r.data_bytes as u64).sum()
    }

    /// Whether any run belongs to `track_type`.
    pub fn has_track(&self, track_type: TrackType) -> bool {
        self.runs.iter().any(|r| r.track_type == track_type)
    }
}
