//! Movie fragment header: `moof` followed by the `mdat` box header.
//!
//! The sample payloads themselves are not written here. The caller appends
//! them after the returned header, run after run in supply order, and the
//! `trun` data offsets are patched to point at exactly that layout.

use recmux_box::{patch_u32, BoxWriter, Result, BOX_HEADER_SIZE};

use crate::config::TrafLayout;
use crate::flags::{SampleFlagOptions, SAMPLE_FLAGS_VIDEO_I_FRAME, SAMPLE_FLAGS_VIDEO_NON_I_FRAME};
use crate::run::{FragmentConfiguration, RunDescriptor, TrackType};

const MFHD_SIZE: usize = 16;
const TFHD_SIZE: usize = 16;
const TFDT_SIZE: usize = 20;
/// `trun` header, version/flags, sample count and data offset.
const TRUN_HEADER_SIZE: usize = 20;
const TRUN_SAMPLE_SIZE: usize = 8;
const FLAGS_FIELD_SIZE: usize = 4;

/// Write `moof` and the `mdat` header to the start of `buf`.
///
/// Records each run's data offset position, then patches every offset and
/// the `mdat` size once the `moof` size is known. Returns the bytes written.
pub(crate) fn write_fragment_header(
    layout: TrafLayout,
    fragment: &mut FragmentConfiguration<'_>,
    buf: &mut [u8],
) -> Result<usize> {
    let moof_size = write_moof(buf, layout, fragment)?;

    let mdat = BoxWriter::open(&mut buf[moof_size..], b"mdat")?;
    let mdat_header_size = mdat.close();

    let data_bytes = fragment.data_bytes();
    let mdat_size = mdat_header_size as u64 + data_bytes;
    debug_assert!(mdat_size <= u32::MAX as u64, "mdat size exceeds 32 bits");
    patch_u32(buf, moof_size, mdat_size as u32);

    let mut data_offset = (moof_size + mdat_header_size) as u64;
    for run in &fragment.runs {
        if let Some(position) = run.data_offset_position() {
            debug_assert!(data_offset <= u32::MAX as u64, "data offset exceeds 32 bits");
            patch_u32(buf, position, data_offset as u32);
        }
        data_offset += run.data_bytes as u64;
    }

    tracing::debug!(
        sequence_number = fragment.sequence_number,
        runs = fragment.runs.len(),
        moof_size,
        data_bytes,
        "wrote fragment header"
    );
    Ok(moof_size + mdat_header_size)
}

/// Exact number of bytes [`write_fragment_header`] writes for `fragment`.
pub(crate) fn fragment_header_size(layout: TrafLayout, fragment: &FragmentConfiguration<'_>) -> usize {
    let mut moof = BOX_HEADER_SIZE + MFHD_SIZE;
    match layout {
        TrafLayout::PerTrack => {
            for track in [TrackType::Video, TrackType::Audio] {
                if !fragment.has_track(track) {
                    continue;
                }
                let truns: usize = fragment
                    .runs
                    .iter()
                    .filter(|r| r.track_type == track)
                    .map(trun_size)
                    .sum();
                moof += traf_size(per_track_options(track), truns);
            }
        }
        TrafLayout::PerRun => {
            for run in &fragment.runs {
                moof += traf_size(SampleFlagOptions::for_run(run), trun_size(run));
            }
        }
    }
    moof + BOX_HEADER_SIZE
}

fn traf_size(options: SampleFlagOptions, truns: usize) -> usize {
    let tfhd = TFHD_SIZE + if options.default { FLAGS_FIELD_SIZE } else { 0 };
    BOX_HEADER_SIZE + tfhd + TFDT_SIZE + truns
}

fn trun_size(run: &RunDescriptor<'_>) -> usize {
    let options = SampleFlagOptions::for_run(run);
    let first = if options.first { FLAGS_FIELD_SIZE } else { 0 };
    let per_sample = TRUN_SAMPLE_SIZE + if options.table { FLAGS_FIELD_SIZE } else { 0 };
    TRUN_HEADER_SIZE + first + run.sample_count() * per_sample
}

/// `tfhd` options of a `traf` holding every run of `track`.
fn per_track_options(track: TrackType) -> SampleFlagOptions {
    match track {
        TrackType::Video => SampleFlagOptions::DEFAULT,
        TrackType::Audio => SampleFlagOptions::NONE,
    }
}

// ---------------------------------------------------------------------------
// moof (movie fragment) container
// ---------------------------------------------------------------------------

fn write_moof(
    buf: &mut [u8],
    layout: TrafLayout,
    fragment: &mut FragmentConfiguration<'_>,
) -> Result<usize> {
    let mut moof = BoxWriter::open(buf, b"moof")?;
    write_mfhd(&mut moof, fragment.sequence_number)?;

    match layout {
        TrafLayout::PerTrack => {
            for track in [TrackType::Video, TrackType::Audio] {
                let mut runs: Vec<&mut RunDescriptor<'_>> = fragment
                    .runs
                    .iter_mut()
                    .filter(|r| r.track_type == track)
                    .collect();
                if runs.is_empty() {
                    continue;
                }
                write_traf(&mut moof, track, per_track_options(track), &mut runs)?;
            }
        }
        TrafLayout::PerRun => {
            for run in fragment.runs.iter_mut() {
                let options = SampleFlagOptions::for_run(run);
                let track = run.track_type;
                write_traf(&mut moof, track, options, &mut [run])?;
            }
        }
    }

    Ok(moof.close())
}

fn write_mfhd(container: &mut BoxWriter<'_>, sequence_number: u32) -> Result<()> {
    let mut mfhd = container.open_local(b"mfhd")?;
    mfhd.append_full_box_header(0, 0)?;
    mfhd.append_u32(sequence_number)?;
    mfhd.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// traf (track fragment) container
// ---------------------------------------------------------------------------

/// Write one `traf` holding `runs`, all of which belong to `track`.
///
/// The decode time comes from the first run.
fn write_traf(
    container: &mut BoxWriter<'_>,
    track: TrackType,
    options: SampleFlagOptions,
    runs: &mut [&mut RunDescriptor<'_>],
) -> Result<()> {
    let decode_time = runs.first().map_or(0, |r| r.decode_time);

    let mut traf = container.open_local(b"traf")?;
    write_tfhd(&mut traf, track, options)?;
    write_tfdt(&mut traf, decode_time)?;
    for run in runs.iter_mut() {
        write_trun(&mut traf, run)?;
    }
    traf.close();
    Ok(())
}

fn write_tfhd(
    container: &mut BoxWriter<'_>,
    track: TrackType,
    options: SampleFlagOptions,
) -> Result<()> {
    let mut tfhd = container.open_local(b"tfhd")?;
    tfhd.append_full_box_header(0, options.tfhd_flags())?;
    tfhd.append_u32(track.track_id())?;
    if options.default {
        tfhd.append_u32(SAMPLE_FLAGS_VIDEO_NON_I_FRAME)?;
    }
    tfhd.close();
    Ok(())
}

fn write_tfdt(container: &mut BoxWriter<'_>, decode_time: u64) -> Result<()> {
    let mut tfdt = container.open_local(b"tfdt")?;
    // Version 1: 64-bit base media decode time.
    tfdt.append_full_box_header(1, 0)?;
    tfdt.append_u64(decode_time)?;
    tfdt.close();
    Ok(())
}

/// Write a `trun` for `run` and record where its data offset lives.
///
/// # Panics
///
/// Panics if the run's sample sizes do not add up to its `data_bytes`.
fn write_trun(container: &mut BoxWriter<'_>, run: &mut RunDescriptor<'_>) -> Result<()> {
    let options = SampleFlagOptions::for_run(run);

    let mut trun = container.open_local(b"trun")?;
    trun.append_full_box_header(0, options.trun_flags())?;
    trun.append_u32(run.sample_count() as u32)?;

    // Placeholder, patched once the moof size is known.
    let data_offset_position = trun.position();
    trun.append_u32(0)?;
    run.set_data_offset_position(data_offset_position);

    if options.first {
        trun.append_u32(SAMPLE_FLAGS_VIDEO_I_FRAME)?;
    }

    let mut sample_bytes: u64 = 0;
    for sample in run.samples {
        trun.append_u32(sample.wire_duration())?;
        trun.append_u32(sample.size)?;
        if options.table {
            trun.append_u32(if sample.is_key_frame {
                SAMPLE_FLAGS_VIDEO_I_FRAME
            } else {
                SAMPLE_FLAGS_VIDEO_NON_I_FRAME
            })?;
        }
        sample_bytes += sample.size as u64;
    }
    assert_eq!(
        sample_bytes, run.data_bytes as u64,
        "sample sizes of {:?} run do not add up to its data bytes",
        run.track_type
    );

    tracing::trace!(
        track = ?run.track_type,
        samples = run.sample_count(),
        ?options,
        "wrote trun"
    );
    trun.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
