//! End-to-end recording: init segment plus media segments built from
//! interleaved encoder output.

mod common;

use common::{read_u32, read_u64, recording, video_only_recording, walk};
use recmux::{
    fragment_header_capacity, init_segment, media_segment, movie_header_capacity, Fmp4Composer,
    FragmentBuilder, TrackType,
};

/// Deterministic fake payload for a sample.
fn payload(tag: u8, size: u32) -> Vec<u8> {
    (0..size).map(|i| tag.wrapping_add(i as u8)).collect()
}

#[test]
fn test_recording_round_trip() {
    common::init_tracing();
    let config = recording();
    let composer = Fmp4Composer::default();

    let init = init_segment(&composer, &config).unwrap();
    assert_eq!(init.len(), movie_header_capacity(&config));
    let boxes = walk(&init);
    assert_eq!(boxes.len(), 2);

    // Two fragments of one second each: 30 fps video, 48 kHz AAC.
    let mut file = init.to_vec();
    for sequence_number in 1..=2u32 {
        let video_base = (sequence_number as u64 - 1) * 90_000;
        let audio_base = (sequence_number as u64 - 1) * 48_000;

        let mut builder = FragmentBuilder::for_recording(sequence_number, &config, 3000);
        let mut payloads: Vec<(TrackType, Vec<u8>)> = Vec::new();
        for frame in 0..30u64 {
            let size = if frame == 0 { 4000 } else { 600 + frame as u32 };
            builder.push_video(size, video_base + frame * 3000, frame == 0);
            payloads.push((TrackType::Video, payload(frame as u8, size)));
            if frame % 2 == 1 {
                builder.push_audio(300, audio_base + frame / 2 * 1024);
                payloads.push((TrackType::Audio, payload(0xA0, 300)));
            }
        }
        let samples = builder.finish();
        let mut fragment = samples.configuration();

        // One payload slice per run: concatenate consecutive samples.
        let mut run_payloads: Vec<Vec<u8>> = Vec::new();
        let mut previous = None;
        for (track, bytes) in &payloads {
            if previous == Some(*track) {
                if let Some(last) = run_payloads.last_mut() {
                    last.extend_from_slice(bytes);
                }
            } else {
                run_payloads.push(bytes.clone());
            }
            previous = Some(*track);
        }
        assert_eq!(run_payloads.len(), fragment.runs.len());
        let slices: Vec<&[u8]> = run_payloads.iter().map(|p| p.as_slice()).collect();

        assert!(fragment_header_capacity(&fragment) >= composer.fragment_header_size(&fragment));
        let segment = media_segment(&composer, &mut fragment, &slices).unwrap();
        let segment_start = file.len();
        file.extend_from_slice(&segment);

        let boxes = walk(&segment);
        assert_eq!(boxes.len(), 2);
        assert_eq!(&boxes[0].box_type, b"moof");
        assert_eq!(&boxes[1].box_type, b"mdat");

        let mfhd = boxes[0].find(b"mfhd").unwrap();
        assert_eq!(read_u32(&segment, mfhd.offset + 12), sequence_number);

        // Each run's data offset, relative to the moof, lands on its payload.
        for (run, bytes) in fragment.runs.iter().zip(&run_payloads) {
            let slot = run.data_offset_position().unwrap();
            let offset = read_u32(&segment, slot) as usize;
            assert_eq!(&segment[offset..offset + bytes.len()], bytes.as_slice());
            assert_eq!(&file[segment_start + offset..segment_start + offset + 4], &bytes[..4]);
        }

        let mut tfdts = Vec::new();
        boxes[0].find_all(b"tfdt", &mut tfdts);
        let decode_times: Vec<u64> = tfdts
            .iter()
            .map(|b| read_u64(&segment, b.offset + 12))
            .collect();
        assert_eq!(decode_times, vec![video_base, audio_base]);
    }

    let top: Vec<[u8; 4]> = walk(&file).iter().map(|b| b.box_type).collect();
    assert_eq!(
        top,
        vec![*b"ftyp", *b"moov", *b"moof", *b"mdat", *b"moof", *b"mdat"]
    );
}

#[test]
fn test_video_only_recording() {
    let config = video_only_recording();
    let composer = Fmp4Composer::default();

    let init = init_segment(&composer, &config).unwrap();
    assert_eq!(walk(&init)[1].count(b"trak"), 1);

    let mut builder = FragmentBuilder::for_recording(1, &config, 3000);
    builder.push_video(10, 0, true);
    assert!(!builder.push_audio(5, 0));
    builder.push_video(4, 3000, false);
    let samples = builder.finish();
    assert_eq!(samples.run_count(), 1);

    let mut fragment = samples.configuration();
    let data = payload(1, 14);
    let segment = media_segment(&composer, &mut fragment, &[data.as_slice()]).unwrap();
    let boxes = walk(&segment);
    assert_eq!(boxes[0].count(b"traf"), 1);
    assert_eq!(boxes[1].size, 8 + 14);
    assert_eq!(&segment[segment.len() - 14..], data.as_slice());
}
