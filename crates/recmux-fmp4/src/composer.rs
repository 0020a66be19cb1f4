//! Composer entry points.

use recmux_box::Result;

use crate::config::{ComposerOptions, RecordingConfiguration};
use crate::run::FragmentConfiguration;
use crate::{fragment, movie};

/// Writes fMP4 movie and fragment headers into caller-supplied buffers.
///
/// The composer holds only its options, so one instance can serve any number
/// of recordings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fmp4Composer {
    options: ComposerOptions,
}

impl Fmp4Composer {
    /// Create a composer with the given options.
    pub fn new(options: ComposerOptions) -> Self {
        Self { options }
    }

    /// Options this composer was created with.
    pub fn options(&self) -> ComposerOptions {
        self.options
    }

    /// Write `ftyp` followed by a sample-less `moov` to the start of `buf`.
    ///
    /// Returns the number of bytes written. Nothing beyond that is touched.
    ///
    /// # Panics
    ///
    /// Panics if the NAL unit length size is outside 1..=4 or the SPS is
    /// shorter than 4 bytes.
    pub fn write_movie_header(
        &self,
        config: &RecordingConfiguration,
        buf: &mut [u8],
    ) -> Result<usize> {
        movie::write_movie_header(config, buf)
    }

    /// Write a `moof` and the `mdat` box header to the start of `buf`.
    ///
    /// On success each run's [`data_offset_position`] points at its patched
    /// `trun` data offset, and the returned size is where the first run's
    /// payload belongs.
    ///
    /// # Panics
    ///
    /// Panics if a run's sample sizes do not add up to its `data_bytes`.
    ///
    /// [`data_offset_position`]: crate::RunDescriptor::data_offset_position
    pub fn write_fragment_header(
        &self,
        fragment: &mut FragmentConfiguration<'_>,
        buf: &mut [u8],
    ) -> Result<usize> {
        fragment::write_fragment_header(self.options.traf_layout, fragment, buf)
    }

    /// Exact size of the movie header for `config`.
    pub fn movie_header_size(&self, config: &RecordingConfiguration) -> usize {
        movie::movie_header_size(config)
    }

    /// Exact size of the fragment header for `fragment`, `mdat` header included.
    pub fn fragment_header_size(&self, fragment: &FragmentConfiguration<'_>) -> usize {
        fragment::fragment_header_size(self.options.traf_layout, fragment)
    }
}

/// Write a movie header with the default composer.
pub fn write_movie_header(config: &RecordingConfiguration, buf: &mut [u8]) -> Result<usize> {
    Fmp4Composer::default().write_movie_header(config, buf)
}

/// Write a fragment header with the default composer.
pub fn write_fragment_header(
    fragment: &mut FragmentConfiguration<'_>,
    buf: &mut [u8],
) -> Result<usize> {
    Fmp4Composer::default().write_fragment_header(fragment, buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrafLayout;
    use crate::run::{RunDescriptor, SampleDescriptor, TrackType};

    #[test]
    fn test_default_options() {
        let composer = Fmp4Composer::default();
        assert_eq!(composer.options().traf_layout, TrafLayout::PerTrack);
    }

    #[test]
    fn test_layout_changes_header_size() {
        let samples = [
            SampleDescriptor::new(10, 3000, true),
            SampleDescriptor::new(10, 3000, false),
        ];
        let fragment = FragmentConfiguration::new(1)
            .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples[..1]))
            .with_run(RunDescriptor::from_samples(TrackType::Video, 3000, &samples[1..]));

        let per_track = Fmp4Composer::default();
        let per_run = Fmp4Composer::new(ComposerOptions {
            traf_layout: TrafLayout::PerRun,
        });
        // One extra traf + tfhd + tfdt.
        assert_eq!(
            per_run.fragment_header_size(&fragment),
            per_track.fragment_header_size(&fragment) + 8 + 20 + 20
        );
    }

    #[test]
    fn test_free_function_matches_composer() {
        let samples = [SampleDescriptor::new(10, 3000, true)];
        let mut a = FragmentConfiguration::new(1)
            .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples));
        let mut b = a.clone();

        let mut buf_a = [0u8; 128];
        let mut buf_b = [0u8; 128];
        let size_a = write_fragment_header(&mut a, &mut buf_a).unwrap();
        let size_b = Fmp4Composer::default()
            .write_fragment_header(&mut b, &mut buf_b)
            .unwrap();
        assert_eq!(size_a, size_b);
        assert_eq!(buf_a, buf_b);
    }
}
