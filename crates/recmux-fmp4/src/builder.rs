//! Interleaved fragment assembly.
//!
//! A recorder receives encoded video and audio frames as they come out of
//! the encoders. [`FragmentBuilder`] collects them in that order, derives
//! each sample's duration from the next timestamp on the same track, and
//! groups consecutive samples of one track into runs.

use crate::config::RecordingConfiguration;
use crate::run::{FragmentConfiguration, RunDescriptor, SampleDescriptor, TrackType};

#[derive(Debug, Clone, Copy)]
struct PendingSample {
    track_type: TrackType,
    size: u32,
    timestamp: u64,
    is_key_frame: bool,
}

/// Collects the samples of one fragment in arrival order.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    sequence_number: u32,
    video_default_duration: u32,
    audio_default_duration: Option<u32>,
    pending: Vec<PendingSample>,
}

impl FragmentBuilder {
    /// Create a video-only builder.
    ///
    /// `video_default_duration` is used for the last video sample, whose
    /// successor has not arrived yet.
    pub fn new(sequence_number: u32, video_default_duration: u32) -> Self {
        Self {
            sequence_number,
            video_default_duration,
            audio_default_duration: None,
            pending: Vec::new(),
        }
    }

    /// Accept audio samples, using `default_duration` for the last one.
    pub fn with_audio(mut self, default_duration: u32) -> Self {
        self.audio_default_duration = Some(default_duration);
        self
    }

    /// Create a builder matching a recording's track layout.
    ///
    /// The last audio sample lasts one codec frame.
    pub fn for_recording(
        sequence_number: u32,
        config: &RecordingConfiguration,
        video_frame_duration: u32,
    ) -> Self {
        let builder = Self::new(sequence_number, video_frame_duration);
        if config.has_audio() {
            builder.with_audio(config.audio.codec.samples_per_frame())
        } else {
            builder
        }
    }

    /// Append a video sample. `timestamp` is in the video timescale.
    pub fn push_video(&mut self, size: u32, timestamp: u64, is_key_frame: bool) {
        self.pending.push(PendingSample {
            track_type: TrackType::Video,
            size,
            timestamp,
            is_key_frame,
        });
    }

    /// Append an audio sample. `timestamp` is in the audio timescale.
    ///
    /// Returns `false` and drops the sample when the builder has no audio
    /// track.
    pub fn push_audio(&mut self, size: u32, timestamp: u64) -> bool {
        if self.audio_default_duration.is_none() {
            tracing::trace!(size, timestamp, "dropping audio sample, no audio track");
            return false;
        }
        self.pending.push(PendingSample {
            track_type: TrackType::Audio,
            size,
            timestamp,
            is_key_frame: false,
        });
        true
    }

    /// Whether no sample has been accepted.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolve durations and runs.
    pub fn finish(self) -> FragmentSamples {
        let mut fragment = FragmentSamples {
            sequence_number: self.sequence_number,
            video_samples: Vec::new(),
            audio_samples: Vec::new(),
            runs: Vec::new(),
        };

        for (i, sample) in self.pending.iter().enumerate() {
            let next_timestamp = self.pending[i + 1..]
                .iter()
                .find(|s| s.track_type == sample.track_type)
                .map(|s| s.timestamp);
            let duration = match next_timestamp {
                Some(next) => clamp_duration(next.saturating_sub(sample.timestamp)),
                None => match sample.track_type {
                    TrackType::Video => self.video_default_duration,
                    TrackType::Audio => self.audio_default_duration.unwrap_or(0),
                },
            };

            let table = match sample.track_type {
                TrackType::Video => &mut fragment.video_samples,
                TrackType::Audio => &mut fragment.audio_samples,
            };
            let index = table.len();
            table.push(SampleDescriptor::new(sample.size, duration, sample.is_key_frame));

            match fragment.runs.last_mut() {
                Some(run) if run.track_type == sample.track_type => {
                    run.len += 1;
                    run.data_bytes += sample.size;
                }
                _ => fragment.runs.push(RunSpan {
                    track_type: sample.track_type,
                    decode_time: sample.timestamp,
                    start: index,
                    len: 1,
                    data_bytes: sample.size,
                }),
            }
        }

        tracing::debug!(
            sequence_number = fragment.sequence_number,
            video_samples = fragment.video_samples.len(),
            audio_samples = fragment.audio_samples.len(),
            runs = fragment.runs.len(),
            "assembled fragment"
        );
        fragment
    }
}

fn clamp_duration(duration: u64) -> u32 {
    duration.min(SampleDescriptor::MAX_DURATION as u64) as u32
}

/// Consecutive samples of one track, as a range of that track's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunSpan {
    track_type: TrackType,
    decode_time: u64,
    start: usize,
    len: usize,
    data_bytes: u32,
}

/// Sample tables of one assembled fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSamples {
    sequence_number: u32,
    video_samples: Vec<SampleDescriptor>,
    audio_samples: Vec<SampleDescriptor>,
    runs: Vec<RunSpan>,
}

impl FragmentSamples {
    /// Fragment description borrowing these sample tables, runs in arrival
    /// order.
    pub fn configuration(&self) -> FragmentConfiguration<'_> {
        let runs = self
            .runs
            .iter()
            .map(|span| {
                let table = match span.track_type {
                    TrackType::Video => &self.video_samples,
                    TrackType::Audio => &self.audio_samples,
                };
                RunDescriptor::new(
                    span.track_type,
                    span.decode_time,
                    &table[span.start..span.start + span.len],
                    span.data_bytes,
                )
            })
            .collect();
        FragmentConfiguration {
            sequence_number: self.sequence_number,
            runs,
        }
    }

    /// Sequence number of the fragment.
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn video_samples(&self) -> &[SampleDescriptor] {
        &self.video_samples
    }

    pub fn audio_samples(&self) -> &[SampleDescriptor] {
        &self.audio_samples
    }

    pub fn video_sample_count(&self) -> usize {
        self.video_samples.len()
    }

    pub fn audio_sample_count(&self) -> usize {
        self.audio_samples.len()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Payload bytes of the whole fragment.
    pub fn data_bytes(&self) -> u64 {
        self.runs.iter().map(|r| r.data_bytes as u64).sum()
    }
}
