//! Movie header: `ftyp` followed by a `moov` without samples.
//!
//! All sample tables in the `moov` are empty. Samples are described by the
//! movie fragments only, and `mvex` announces that fragments follow.

use recmux_box::{BoxWriter, Result, BOX_HEADER_SIZE};

use crate::codec::{
    self, AudioSpecificConfig, AUDIO_TRACK_ID, DECODER_CONFIG_DESCRIPTOR_TAG,
    DECODER_SPECIFIC_INFO_TAG, ES_DESCRIPTOR_TAG, ES_ID, H264_COMPRESSOR_NAME,
    LANGUAGE_UNDETERMINED, OBJECT_TYPE_MPEG4_AUDIO, SL_CONFIG_DESCRIPTOR_TAG,
    SL_CONFIG_PREDEFINED_MP4, UNITY_MATRIX, VIDEO_TRACK_ID,
};
use crate::config::RecordingConfiguration;
use crate::run::TrackType;

// Sizes of the fixed-layout boxes, header included.
const FTYP_SIZE: usize = 28;
const MVHD_SIZE: usize = 108;
const TKHD_SIZE: usize = 92;
const MDHD_SIZE: usize = 32;
const HDLR_SIZE: usize = 46;
const VMHD_SIZE: usize = 20;
const SMHD_SIZE: usize = 16;
const DINF_SIZE: usize = 36;
const STSD_HEADER_SIZE: usize = 16;
const AVC1_HEADER_SIZE: usize = 86;
const AVCC_HEADER_SIZE: usize = 19;
const MP4A_HEADER_SIZE: usize = 36;
const ESDS_HEADER_SIZE: usize = 37;
/// `stsz` + `stsc` + `stts` + `stco`, all empty.
const EMPTY_SAMPLE_TABLES_SIZE: usize = 20 + 16 + 16 + 16;
const MEHD_SIZE: usize = 16;
const TREX_SIZE: usize = 32;

/// Handler name of the video track, NUL terminated.
const VIDEO_HANDLER_NAME: &[u8; 14] = b"Video Handler\0";
/// Handler name of the audio track, NUL terminated.
const SOUND_HANDLER_NAME: &[u8; 14] = b"Sound Handler\0";

/// Write `ftyp` and `moov` to the start of `buf`, returning the bytes written.
pub(crate) fn write_movie_header(config: &RecordingConfiguration, buf: &mut [u8]) -> Result<usize> {
    config.assert_valid();

    let ftyp_size = write_ftyp(buf)?;
    let moov_size = write_moov(&mut buf[ftyp_size..], config)?;

    tracing::debug!(
        ftyp_size,
        moov_size,
        width = config.video.width,
        height = config.video.height,
        has_audio = config.has_audio(),
        "wrote movie header"
    );
    Ok(ftyp_size + moov_size)
}

/// Exact number of bytes [`write_movie_header`] writes for `config`.
pub(crate) fn movie_header_size(config: &RecordingConfiguration) -> usize {
    let mut moov = BOX_HEADER_SIZE + MVHD_SIZE + track_size(config, TrackType::Video);
    let mut track_count = 1;
    if config.has_audio() {
        moov += track_size(config, TrackType::Audio);
        track_count += 1;
    }
    moov += BOX_HEADER_SIZE + MEHD_SIZE + track_count * TREX_SIZE;
    FTYP_SIZE + moov
}

fn track_size(config: &RecordingConfiguration, track: TrackType) -> usize {
    let (media_header, sample_entry) = match track {
        TrackType::Video => (
            VMHD_SIZE,
            AVC1_HEADER_SIZE + AVCC_HEADER_SIZE + config.video.sps.len() + config.video.pps.len(),
        ),
        TrackType::Audio => (
            SMHD_SIZE,
            MP4A_HEADER_SIZE + ESDS_HEADER_SIZE + AudioSpecificConfig::new(&config.audio).len(),
        ),
    };
    let stbl = BOX_HEADER_SIZE + STSD_HEADER_SIZE + sample_entry + EMPTY_SAMPLE_TABLES_SIZE;
    let minf = BOX_HEADER_SIZE + media_header + DINF_SIZE + stbl;
    let mdia = BOX_HEADER_SIZE + MDHD_SIZE + HDLR_SIZE + minf;
    BOX_HEADER_SIZE + TKHD_SIZE + mdia
}

// ---------------------------------------------------------------------------
// ftyp box
// ---------------------------------------------------------------------------

/// Major brand "mp42", minor version 1, compatible brands
/// ["isom", "mp42", "avc1"].
fn write_ftyp(buf: &mut [u8]) -> Result<usize> {
    let mut ftyp = BoxWriter::open(buf, b"ftyp")?;
    ftyp.append_bytes(b"mp42")?;
    ftyp.append_u32(1)?;
    ftyp.append_bytes(b"isom")?;
    ftyp.append_bytes(b"mp42")?;
    ftyp.append_bytes(b"avc1")?;
    Ok(ftyp.close())
}

// ---------------------------------------------------------------------------
// moov (movie) container
// ---------------------------------------------------------------------------

fn write_moov(buf: &mut [u8], config: &RecordingConfiguration) -> Result<usize> {
    let mut moov = BoxWriter::open(buf, b"moov")?;
    write_mvhd(&mut moov, config)?;
    write_trak(&mut moov, config, TrackType::Video)?;
    if config.has_audio() {
        write_trak(&mut moov, config, TrackType::Audio)?;
    }
    write_mvex(&mut moov, config)?;
    Ok(moov.close())
}

fn append_matrix(w: &mut BoxWriter<'_>) -> Result<()> {
    for value in UNITY_MATRIX {
        w.append_u32(value)?;
    }
    Ok(())
}

fn write_mvhd(container: &mut BoxWriter<'_>, config: &RecordingConfiguration) -> Result<()> {
    let mut mvhd = container.open_local(b"mvhd")?;
    mvhd.append_full_box_header(0, 0)?;
    mvhd.append_u32(0)?; // creation time
    mvhd.append_u32(0)?; // modification time
    mvhd.append_u32(config.video.timescale)?;
    mvhd.append_u32(0)?; // duration: samples live in fragments
    mvhd.append_u32(0x0001_0000)?; // rate = 1.0
    mvhd.append_u16(0x0100)?; // volume = 1.0
    mvhd.append_zero(10)?; // reserved
    append_matrix(&mut mvhd)?;
    mvhd.append_zero(24)?; // pre_defined
    mvhd.append_u32(0xFFFF_FFFF)?; // next track ID: undefined
    mvhd.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// trak (track) container
// ---------------------------------------------------------------------------

fn write_trak(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let mut trak = container.open_local(b"trak")?;
    write_tkhd(&mut trak, config, track)?;
    write_mdia(&mut trak, config, track)?;
    trak.close();
    Ok(())
}

fn write_tkhd(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let is_video = track == TrackType::Video;

    let mut tkhd = container.open_local(b"tkhd")?;
    // flags = enabled | in_movie | in_preview
    tkhd.append_full_box_header(0, 7)?;
    tkhd.append_u32(0)?; // creation time
    tkhd.append_u32(0)?; // modification time
    tkhd.append_u32(track.track_id())?;
    tkhd.append_zero(4)?; // reserved
    tkhd.append_u32(0)?; // duration
    tkhd.append_zero(8)?; // reserved
    tkhd.append_u16(0)?; // layer
    tkhd.append_u16(0)?; // alternate group
    tkhd.append_u16(if is_video { 0 } else { 0x0100 })?; // volume
    tkhd.append_zero(2)?; // reserved
    append_matrix(&mut tkhd)?;
    // Width and height (16.16 fixed point)
    if is_video {
        tkhd.append_u32((config.video.width as u32) << 16)?;
        tkhd.append_u32((config.video.height as u32) << 16)?;
    } else {
        tkhd.append_u32(0)?;
        tkhd.append_u32(0)?;
    }
    tkhd.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// mdia (media) container
// ---------------------------------------------------------------------------

fn write_mdia(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let mut mdia = container.open_local(b"mdia")?;
    write_mdhd(&mut mdia, config, track)?;
    write_hdlr(&mut mdia, track)?;
    write_minf(&mut mdia, config, track)?;
    mdia.close();
    Ok(())
}

fn write_mdhd(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let timescale = match track {
        TrackType::Video => config.video.timescale,
        TrackType::Audio => config.audio.sample_rate,
    };

    let mut mdhd = container.open_local(b"mdhd")?;
    mdhd.append_full_box_header(0, 0)?;
    mdhd.append_u32(0)?; // creation time
    mdhd.append_u32(0)?; // modification time
    mdhd.append_u32(timescale)?;
    mdhd.append_u32(0)?; // duration
    mdhd.append_u16(LANGUAGE_UNDETERMINED)?;
    mdhd.append_zero(2)?; // pre_defined
    mdhd.close();
    Ok(())
}

fn write_hdlr(container: &mut BoxWriter<'_>, track: TrackType) -> Result<()> {
    let (handler_type, name) = match track {
        TrackType::Video => (b"vide", VIDEO_HANDLER_NAME),
        TrackType::Audio => (b"soun", SOUND_HANDLER_NAME),
    };

    let mut hdlr = container.open_local(b"hdlr")?;
    hdlr.append_full_box_header(0, 0)?;
    hdlr.append_zero(4)?; // pre_defined
    hdlr.append_bytes(handler_type)?;
    hdlr.append_zero(12)?; // reserved
    hdlr.append_bytes(name)?;
    hdlr.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// minf (media information) container
// ---------------------------------------------------------------------------

fn write_minf(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let mut minf = container.open_local(b"minf")?;
    match track {
        TrackType::Video => write_vmhd(&mut minf)?,
        TrackType::Audio => write_smhd(&mut minf)?,
    }
    write_dinf(&mut minf)?;
    write_stbl(&mut minf, config, track)?;
    minf.close();
    Ok(())
}

fn write_vmhd(container: &mut BoxWriter<'_>) -> Result<()> {
    let mut vmhd = container.open_local(b"vmhd")?;
    vmhd.append_full_box_header(0, 1)?;
    vmhd.append_u16(0)?; // graphics mode
    vmhd.append_zero(6)?; // opcolor
    vmhd.close();
    Ok(())
}

fn write_smhd(container: &mut BoxWriter<'_>) -> Result<()> {
    let mut smhd = container.open_local(b"smhd")?;
    smhd.append_full_box_header(0, 0)?;
    smhd.append_u16(0)?; // balance
    smhd.append_u16(0)?; // reserved
    smhd.close();
    Ok(())
}

fn write_dinf(container: &mut BoxWriter<'_>) -> Result<()> {
    let mut dinf = container.open_local(b"dinf")?;
    {
        let mut dref = dinf.open_local(b"dref")?;
        dref.append_full_box_header(0, 0)?;
        dref.append_u32(1)?; // entry count
        {
            let mut url = dref.open_local(b"url ")?;
            // flags = 1: media data is in the same file
            url.append_full_box_header(0, 1)?;
            url.close();
        }
        dref.close();
    }
    dinf.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// stbl (sample table) container
// ---------------------------------------------------------------------------

fn write_stbl(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let mut stbl = container.open_local(b"stbl")?;
    write_stsd(&mut stbl, config, track)?;
    write_empty_stsz(&mut stbl)?;
    write_empty_table(&mut stbl, b"stsc")?;
    write_empty_table(&mut stbl, b"stts")?;
    write_empty_table(&mut stbl, b"stco")?;
    stbl.close();
    Ok(())
}

fn write_stsd(
    container: &mut BoxWriter<'_>,
    config: &RecordingConfiguration,
    track: TrackType,
) -> Result<()> {
    let mut stsd = container.open_local(b"stsd")?;
    stsd.append_full_box_header(0, 0)?;
    stsd.append_u32(1)?; // entry count
    match track {
        TrackType::Video => write_avc1(&mut stsd, config)?,
        TrackType::Audio => write_mp4a(&mut stsd, config)?,
    }
    stsd.close();
    Ok(())
}

fn write_empty_stsz(container: &mut BoxWriter<'_>) -> Result<()> {
    let mut stsz = container.open_local(b"stsz")?;
    stsz.append_full_box_header(0, 0)?;
    stsz.append_u32(0)?; // sample size
    stsz.append_u32(0)?; // sample count
    stsz.close();
    Ok(())
}

/// An empty full box holding only an entry count (`stsc`, `stts`, `stco`).
fn write_empty_table(container: &mut BoxWriter<'_>, box_type: &[u8; 4]) -> Result<()> {
    let mut table = container.open_local(box_type)?;
    table.append_full_box_header(0, 0)?;
    table.append_u32(0)?; // entry count
    table.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// Sample entries
// ---------------------------------------------------------------------------

fn write_avc1(container: &mut BoxWriter<'_>, config: &RecordingConfiguration) -> Result<()> {
    let mut avc1 = container.open_local(b"avc1")?;
    avc1.append_zero(6)?; // reserved
    avc1.append_u16(1)?; // data reference index
    avc1.append_u16(0)?; // version
    avc1.append_u16(0)?; // revision level
    avc1.append_u32(0)?; // vendor
    avc1.append_u32(0)?; // temporal quality
    avc1.append_u32(0)?; // spatial quality
    avc1.append_u16(config.video.width)?;
    avc1.append_u16(config.video.height)?;
    avc1.append_u32(72 << 16)?; // horizontal resolution 72 dpi
    avc1.append_u32(72 << 16)?; // vertical resolution 72 dpi
    avc1.append_u32(0)?; // data size
    avc1.append_u16(1)?; // frame count
    avc1.append_bytes(&H264_COMPRESSOR_NAME)?;
    avc1.append_u16(24)?; // depth
    avc1.append_u16(0xFFFF)?; // color table index: none
    write_avcc(&mut avc1, config)?;
    avc1.close();
    Ok(())
}

/// AVCDecoderConfigurationRecord with one SPS and one PPS.
fn write_avcc(container: &mut BoxWriter<'_>, config: &RecordingConfiguration) -> Result<()> {
    let video = &config.video;

    let mut avcc = container.open_local(b"avcC")?;
    avcc.append_u8(1)?; // configuration version
    // profile_idc, constraint flags and level_idc straight from the SPS
    avcc.append_bytes(&video.sps[1..4])?;
    avcc.append_u8(0xFC | (video.nalu_length_size - 1))?;
    avcc.append_u8(0xE0 | 1)?; // one SPS
    avcc.append_u16(video.sps.len() as u16)?;
    avcc.append_bytes(&video.sps)?;
    avcc.append_u8(1)?; // one PPS
    avcc.append_u16(video.pps.len() as u16)?;
    avcc.append_bytes(&video.pps)?;
    avcc.close();
    Ok(())
}

fn write_mp4a(container: &mut BoxWriter<'_>, config: &RecordingConfiguration) -> Result<()> {
    let mut mp4a = container.open_local(b"mp4a")?;
    mp4a.append_zero(6)?; // reserved
    mp4a.append_u16(1)?; // data reference index
    mp4a.append_u16(0)?; // version
    mp4a.append_u16(0)?; // revision level
    mp4a.append_u32(0)?; // vendor
    mp4a.append_u16(config.audio.channels as u16)?;
    mp4a.append_u16(16)?; // sample size in bits
    mp4a.append_u16(0)?; // compression id
    mp4a.append_u16(0)?; // reserved
    mp4a.append_u32(config.audio.sample_rate << 16)?; // 16.16
    write_esds(&mut mp4a, config)?;
    mp4a.close();
    Ok(())
}

/// ES_Descriptor holding DecoderConfigDescriptor (with the AudioSpecificConfig)
/// and SLConfigDescriptor.
fn write_esds(container: &mut BoxWriter<'_>, config: &RecordingConfiguration) -> Result<()> {
    let audio = &config.audio;
    let asc = AudioSpecificConfig::new(audio);
    // DecoderConfigDescriptor payload: 13 fixed bytes + tagged AudioSpecificConfig.
    let decoder_config_len = 13 + 2 + asc.len();
    // ES_Descriptor payload: ES_ID, flags, tagged decoder config, tagged SL config.
    let es_len = 3 + 2 + decoder_config_len + 3;

    let mut esds = container.open_local(b"esds")?;
    esds.append_full_box_header(0, 0)?;

    esds.append_u8(ES_DESCRIPTOR_TAG)?;
    esds.append_u8(es_len as u8)?;
    esds.append_u16(ES_ID)?;
    esds.append_u8(0)?; // flags

    esds.append_u8(DECODER_CONFIG_DESCRIPTOR_TAG)?;
    esds.append_u8(decoder_config_len as u8)?;
    esds.append_u8(OBJECT_TYPE_MPEG4_AUDIO)?;
    esds.append_u8(codec::decoder_stream_type(audio.codec))?;
    esds.append_zero(3)?; // buffer size
    esds.append_u32(audio.bit_rate)?; // max bit rate
    esds.append_u32(audio.bit_rate)?; // average bit rate

    esds.append_u8(DECODER_SPECIFIC_INFO_TAG)?;
    esds.append_u8(asc.len() as u8)?;
    esds.append_bytes(asc.as_bytes())?;

    esds.append_u8(SL_CONFIG_DESCRIPTOR_TAG)?;
    esds.append_u8(1)?;
    esds.append_u8(SL_CONFIG_PREDEFINED_MP4)?;
    esds.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// mvex (movie extends) container
// ---------------------------------------------------------------------------

fn write_mvex(container: &mut BoxWriter<'_>, config: &RecordingConfiguration) -> Result<()> {
    let mut mvex = container.open_local(b"mvex")?;
    write_mehd(&mut mvex)?;
    write_trex(&mut mvex, VIDEO_TRACK_ID)?;
    if config.has_audio() {
        write_trex(&mut mvex, AUDIO_TRACK_ID)?;
    }
    mvex.close();
    Ok(())
}

fn write_mehd(container: &mut BoxWriter<'_>) -> Result<()> {
    let mut mehd = container.open_local(b"mehd")?;
    mehd.append_full_box_header(0, 0)?;
    mehd.append_u32(0)?; // fragment duration: unknown
    mehd.close();
    Ok(())
}

fn write_trex(container: &mut BoxWriter<'_>, track_id: u32) -> Result<()> {
    let mut trex = container.open_local(b"trex")?;
    trex.append_full_box_header(0, 0)?;
    trex.append_u32(track_id)?;
    trex.append_u32(1)?; // default sample description index
    trex.append_u32(0)?; // default sample duration
    trex.append_u32(0)?; // default sample size
    trex.append_u32(0)?; // default sample flags
    trex.close();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
