//! Sample flag and fragment box flag layouts (ISO/IEC 14496-12 8.8).

use crate::run::{RunDescriptor, TrackType};

/// `sample_depends_on` = 2: the sample does not depend on others (I picture).
pub const SAMPLE_FLAG_NOT_DEPENDS_ON: u32 = 0x0200_0000;
/// `sample_depends_on` = 1: the sample depends on others.
pub const SAMPLE_FLAG_DEPENDS_ON: u32 = 0x0100_0000;
/// `sample_is_non_sync_sample`.
pub const SAMPLE_FLAG_IS_NON_SYNC: u32 = 0x0001_0000;

/// Flags of a video key frame.
pub const SAMPLE_FLAGS_VIDEO_I_FRAME: u32 = SAMPLE_FLAG_NOT_DEPENDS_ON;
/// Flags of any other video frame.
pub const SAMPLE_FLAGS_VIDEO_NON_I_FRAME: u32 = SAMPLE_FLAG_DEPENDS_ON | SAMPLE_FLAG_IS_NON_SYNC;

/// `tfhd` flag: default-sample-flags-present.
pub const TFHD_DEFAULT_SAMPLE_FLAGS_PRESENT: u32 = 0x00_0020;
/// `tfhd` flag: default-base-is-moof.
pub const TFHD_DEFAULT_BASE_IS_MOOF: u32 = 0x02_0000;

/// `trun` flag: data-offset-present.
pub const TRUN_DATA_OFFSET_PRESENT: u32 = 0x00_0001;
/// `trun` flag: first-sample-flags-present.
pub const TRUN_FIRST_SAMPLE_FLAGS_PRESENT: u32 = 0x00_0004;
/// `trun` flag: sample-duration-present.
pub const TRUN_SAMPLE_DURATION_PRESENT: u32 = 0x00_0100;
/// `trun` flag: sample-size-present.
pub const TRUN_SAMPLE_SIZE_PRESENT: u32 = 0x00_0200;
/// `trun` flag: sample-flags-present.
pub const TRUN_SAMPLE_FLAGS_PRESENT: u32 = 0x00_0400;

/// Which sample flag fields a track fragment needs.
///
/// Video runs declare non-I-frame flags as the `tfhd` default so that only
/// key frames need explicit flags. A run with a single leading key frame
/// overrides the first sample's flags; any other key frame placement needs
/// the full per-sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleFlagOptions {
    /// `tfhd` carries default sample flags.
    pub default: bool,
    /// `trun` carries first-sample flags.
    pub first: bool,
    /// `trun` carries per-sample flags.
    pub table: bool,
}

impl SampleFlagOptions {
    /// No sample flags at all (audio).
    pub const NONE: Self = Self {
        default: false,
        first: false,
        table: false,
    };

    /// Only the `tfhd` default.
    pub const DEFAULT: Self = Self {
        default: true,
        first: false,
        table: false,
    };

    /// Decide the flag options of one run.
    pub fn for_run(run: &RunDescriptor<'_>) -> Self {
        if run.track_type != TrackType::Video {
            return Self::NONE;
        }
        if run.samples.iter().skip(1).any(|s| s.is_key_frame) {
            return Self {
                table: true,
                ..Self::NONE
            };
        }
        if run.samples.first().is_some_and(|s| s.is_key_frame) {
            return Self {
                first: true,
                ..Self::DEFAULT
            };
        }
        Self::DEFAULT
    }

    /// `tfhd` flags for these options.
    pub fn tfhd_flags(self) -> u32 {
        let mut flags = TFHD_DEFAULT_BASE_IS_MOOF;
        if self.default {
            flags |= TFHD_DEFAULT_SAMPLE_FLAGS_PRESENT;
        }
        flags
    }

    /// `trun` flags for these options.
    pub fn trun_flags(self) -> u32 {
        let mut flags =
            TRUN_DATA_OFFSET_PRESENT | TRUN_SAMPLE_DURATION_PRESENT | TRUN_SAMPLE_SIZE_PRESENT;
        if self.first {
            flags |= TRUN_FIRST_SAMPLE_FLAGS_PRESENT;
        }
        if self.table {
            flags |= TRUN_SAMPLE_FLAGS_PRESENT;
        }
        flags
    }
}
