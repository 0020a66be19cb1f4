//! Shared helpers for integration tests.
//!
//! [`walk`] parses an emitted byte stream back into a box tree and asserts,
//! for every box on the way, that its declared size stays inside its
//! container and that the children of every container exactly fill it.

#![allow(dead_code)]

use recmux::{AudioCodec, AudioConfiguration, RecordingConfiguration, VideoCodec, VideoConfiguration};

/// One parsed box.
#[derive(Debug, Clone)]
pub struct ParsedBox {
    pub box_type: [u8; 4],
    /// Offset of the size field within the walked data.
    pub offset: usize,
    pub size: usize,
    pub children: Vec<ParsedBox>,
}

impl ParsedBox {
    /// First descendant (depth first) of the given type.
    pub fn find(&self, box_type: &[u8; 4]) -> Option<&ParsedBox> {
        self.children.iter().find_map(|c| {
            if &c.box_type == box_type {
                Some(c)
            } else {
                c.find(box_type)
            }
        })
    }

    /// Every descendant of the given type, in stream order.
    pub fn find_all<'a>(&'a self, box_type: &[u8; 4], out: &mut Vec<&'a ParsedBox>) {
        for child in &self.children {
            if &child.box_type == box_type {
                out.push(child);
            }
            child.find_all(box_type, out);
        }
    }

    pub fn count(&self, box_type: &[u8; 4]) -> usize {
        let mut out = Vec::new();
        self.find_all(box_type, &mut out);
        out.len()
    }

    /// Offset of the first payload byte after the box header.
    pub fn payload(&self) -> usize {
        self.offset + 8
    }
}

/// Bytes to skip after the header before the children of a container start.
fn container_prefix(box_type: &[u8; 4]) -> Option<usize> {
    match box_type {
        b"moov" | b"trak" | b"mdia" | b"minf" | b"dinf" | b"stbl" | b"mvex" | b"moof"
        | b"traf" => Some(0),
        // Full box header + entry count.
        b"dref" | b"stsd" => Some(8),
        // Visual and audio sample entry fields.
        b"avc1" => Some(78),
        b"mp4a" => Some(28),
        _ => None,
    }
}

fn walk_range(data: &[u8], start: usize, end: usize) -> Vec<ParsedBox> {
    let mut boxes = Vec::new();
    let mut pos = start;
    while pos < end {
        assert!(end - pos >= 8, "truncated box header at {pos}");
        let size = read_u32(data, pos) as usize;
        let box_type: [u8; 4] = data[pos + 4..pos + 8].try_into().unwrap();
        assert!(size >= 8, "box at {pos} declares size {size}");
        assert!(
            pos + size <= end,
            "box {} at {pos} overruns its container",
            String::from_utf8_lossy(&box_type)
        );
        let children = match container_prefix(&box_type) {
            Some(prefix) => walk_range(data, pos + 8 + prefix, pos + size),
            None => Vec::new(),
        };
        boxes.push(ParsedBox {
            box_type,
            offset: pos,
            size,
            children,
        });
        pos += size;
    }
    assert_eq!(pos, end, "children do not fill their container");
    boxes
}

/// Parse `data` as a sequence of top-level boxes.
pub fn walk(data: &[u8]) -> Vec<ParsedBox> {
    walk_range(data, 0, data.len())
}

/// Helper: read a big-endian u32 from a slice.
pub fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap())
}

/// Helper: read a big-endian u64 from a slice.
pub fn read_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_be_bytes(data[offset..offset + 8].try_into().unwrap())
}

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 1080p H.264 with stereo 48 kHz AAC-LC.
pub fn recording() -> RecordingConfiguration {
    RecordingConfiguration {
        video: VideoConfiguration {
            codec: VideoCodec::H264,
            width: 1920,
            height: 1080,
            timescale: 90000,
            sps: vec![0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9, 0x40, 0x78],
            pps: vec![0x68, 0xEB, 0xE3, 0xCB],
            nalu_length_size: 4,
        },
        audio: AudioConfiguration {
            codec: AudioCodec::AacLc,
            channels: 2,
            sample_rate: 48000,
            bit_rate: 128000,
        },
    }
}

pub fn video_only_recording() -> RecordingConfiguration {
    RecordingConfiguration {
        audio: AudioConfiguration::disabled(),
        ..recording()
    }
}
