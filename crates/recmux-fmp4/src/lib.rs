//! recmux-fmp4: fragmented MP4 header composition for H.264 + AAC recordings.
//!
//! A recording is written as one movie header (`ftyp` + `moov` with empty
//! sample tables) followed by any number of fragments. Each fragment is a
//! `moof` describing its sample runs and an `mdat` holding their payloads.
//! The composer writes the headers only; payload bytes are appended by the
//! caller right after the fragment header, in run order.
//!
//! # Example
//!
//! ```
//! use recmux_fmp4::{FragmentConfiguration, RunDescriptor, SampleDescriptor, TrackType};
//!
//! let samples = [
//!     SampleDescriptor::new(1000, 3000, true),
//!     SampleDescriptor::new(500, 3000, false),
//! ];
//! let mut fragment = FragmentConfiguration::new(1)
//!     .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples));
//!
//! let mut buf = [0u8; 256];
//! let header = recmux_fmp4::write_fragment_header(&mut fragment, &mut buf).unwrap();
//! // The payload of the only run starts right after the header.
//! let slot = fragment.runs[0].data_offset_position().unwrap();
//! assert_eq!(&buf[slot..slot + 4], &(header as u32).to_be_bytes());
//! ```

mod builder;
pub mod codec;
mod composer;
pub mod config;
pub mod flags;
mod fragment;
mod movie;
pub mod run;

pub use builder::{FragmentBuilder, FragmentSamples};
pub use codec::{AudioSpecificConfig, AUDIO_TRACK_ID, VIDEO_TRACK_ID};
pub use composer::{write_fragment_header, write_movie_header, Fmp4Composer};
pub use config::{
    AudioCodec, AudioConfiguration, ComposerOptions, RecordingConfiguration, TrafLayout,
    VideoCodec, VideoConfiguration,
};
pub use flags::SampleFlagOptions;
pub use recmux_box::{Error, Result};
pub use run::{FragmentConfiguration, RunDescriptor, SampleDescriptor, TrackType};
