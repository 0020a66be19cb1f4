//! recmux - fragmented MP4 writer for camera recordings.
//!
//! Re-exports the box writer ([`recmux_box`]) and the fMP4 composer
//! ([`recmux_fmp4`]), and adds owned segment helpers on top of them.
//!
//! # Example
//!
//! ```
//! use recmux::{
//!     media_segment, AudioConfiguration, Fmp4Composer, FragmentBuilder,
//!     RecordingConfiguration, VideoCodec, VideoConfiguration,
//! };
//!
//! let config = RecordingConfiguration {
//!     video: VideoConfiguration {
//!         codec: VideoCodec::H264,
//!         width: 1280,
//!         height: 720,
//!         timescale: 90000,
//!         sps: vec![0x67, 0x64, 0x00, 0x1F],
//!         pps: vec![0x68, 0xEB],
//!         nalu_length_size: 4,
//!     },
//!     audio: AudioConfiguration::disabled(),
//! };
//! let composer = Fmp4Composer::default();
//! let init = recmux::init_segment(&composer, &config).unwrap();
//! assert_eq!(&init[4..8], b"ftyp");
//!
//! let mut builder = FragmentBuilder::for_recording(1, &config, 3000);
//! builder.push_video(4, 0, true);
//! let samples = builder.finish();
//! let mut fragment = samples.configuration();
//! let segment = media_segment(&composer, &mut fragment, &[&[0, 0, 0, 0]]).unwrap();
//! assert_eq!(&segment[4..8], b"moof");
//! ```

mod segment;

pub use recmux_box::{patch_u32, BoxType, BoxWriter, BOX_HEADER_SIZE, FULL_BOX_HEADER_SIZE};
pub use recmux_fmp4::*;
pub use segment::{
    fragment_header_capacity, init_segment, media_segment, movie_header_capacity,
};

pub use recmux_box;
pub use recmux_fmp4;
