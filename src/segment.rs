//! Owned init and media segments.
//!
//! The composer writes into borrowed buffers. These helpers size the buffer
//! themselves and hand back a complete segment as [`Bytes`], ready to be
//! written to a file or served.

use bytes::{BufMut, Bytes, BytesMut};
use recmux_fmp4::{
    ComposerOptions, Fmp4Composer, FragmentConfiguration, RecordingConfiguration, Result,
    TrafLayout,
};

/// Bytes needed for the movie header of `config`.
pub fn movie_header_capacity(config: &RecordingConfiguration) -> usize {
    Fmp4Composer::default().movie_header_size(config)
}

/// Bytes that always suffice for the fragment header of `fragment`,
/// whatever `traf` layout the composer uses.
pub fn fragment_header_capacity(fragment: &FragmentConfiguration<'_>) -> usize {
    [TrafLayout::PerTrack, TrafLayout::PerRun]
        .into_iter()
        .map(|traf_layout| {
            Fmp4Composer::new(ComposerOptions { traf_layout }).fragment_header_size(fragment)
        })
        .max()
        .unwrap_or(0)
}

/// Build the init segment (`ftyp` + `moov`) of a recording.
pub fn init_segment(composer: &Fmp4Composer, config: &RecordingConfiguration) -> Result<Bytes> {
    let mut buf = BytesMut::zeroed(composer.movie_header_size(config));
    let written = composer.write_movie_header(config, &mut buf)?;
    buf.truncate(written);
    Ok(buf.freeze())
}

/// Build a complete media segment (`moof` + `mdat`).
///
/// `payloads` holds one slice per run of `fragment`, in the same order.
///
/// # Panics
///
/// Panics if the number of payloads differs from the number of runs, or if a
/// payload's length differs from its run's `data_bytes`.
pub fn media_segment(
    composer: &Fmp4Composer,
    fragment: &mut FragmentConfiguration<'_>,
    payloads: &[&[u8]],
) -> Result<Bytes> {
    assert_eq!(
        payloads.len(),
        fragment.runs.len(),
        "one payload per run is required"
    );

    let header_size = composer.fragment_header_size(fragment);
    let data_bytes = fragment.data_bytes() as usize;

    let mut buf = BytesMut::zeroed(header_size);
    let written = composer.write_fragment_header(fragment, &mut buf)?;
    buf.truncate(written);
    buf.reserve(data_bytes);

    for (run, payload) in fragment.runs.iter().zip(payloads) {
        assert_eq!(
            payload.len(),
            run.data_bytes as usize,
            "payload length does not match run data bytes"
        );
        buf.put_slice(payload);
    }

    tracing::debug!(
        sequence_number = fragment.sequence_number,
        header_size = written,
        data_bytes,
        "built media segment"
    );
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recmux_fmp4::{RunDescriptor, SampleDescriptor, TrackType};

    #[test]
    fn test_capacity_covers_both_layouts() {
        // A lone run with a late key frame needs no tfhd default flags when
        // it gets its own traf, so neither layout is always larger.
        let samples = [
            SampleDescriptor::new(1, 3000, false),
            SampleDescriptor::new(1, 3000, true),
        ];
        let fragment = FragmentConfiguration::new(1)
            .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples));

        let per_track = Fmp4Composer::default().fragment_header_size(&fragment);
        let per_run = Fmp4Composer::new(ComposerOptions {
            traf_layout: TrafLayout::PerRun,
        })
        .fragment_header_size(&fragment);
        assert_eq!(per_track, per_run + 4);
        assert_eq!(fragment_header_capacity(&fragment), per_track);
    }

    #[test]
    fn test_media_segment_appends_payloads() {
        let samples = [SampleDescriptor::new(3, 3000, true)];
        let mut fragment = FragmentConfiguration::new(1)
            .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples));
        let segment =
            media_segment(&Fmp4Composer::default(), &mut fragment, &[&[7, 8, 9]]).unwrap();
        assert_eq!(&segment[segment.len() - 3..], &[7, 8, 9]);
    }

    #[test]
    #[should_panic(expected = "one payload per run")]
    fn test_media_segment_payload_count() {
        let samples = [SampleDescriptor::new(3, 3000, true)];
        let mut fragment = FragmentConfiguration::new(1)
            .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples));
        let _ = media_segment(&Fmp4Composer::default(), &mut fragment, &[]);
    }

    #[test]
    #[should_panic(expected = "payload length")]
    fn test_media_segment_payload_length() {
        let samples = [SampleDescriptor::new(3, 3000, true)];
        let mut fragment = FragmentConfiguration::new(1)
            .with_run(RunDescriptor::from_samples(TrackType::Video, 0, &samples));
        let _ = media_segment(&Fmp4Composer::default(), &mut fragment, &[&[1, 2]]);
    }
}
