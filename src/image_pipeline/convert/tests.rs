use bytes::Bytes;

use crate::acquisition::{FrameStatus, RawFrame};
use crate::image_pipeline::convert::unpack::{store_sample, SampleLayout};
use crate::image_pipeline::convert::FrameConverter;
use crate::image_pipeline::format::{CfaPattern, PixelEncoding, BGRA8, MONO8, RGB8};
use crate::image_pipeline::planner::{DisplayCapabilities, PixelFormatPlanner};

fn frame(encoding: PixelEncoding, width: u32, height: u32, data: Vec<u8>) -> RawFrame {
    RawFrame {
        encoding,
        width,
        height,
        status: FrameStatus::Ok,
        sequence: 0,
        data: Bytes::from(data),
    }
}

fn planner() -> PixelFormatPlanner {
    PixelFormatPlanner::new(true)
}

#[test]
fn test_displayable_frame_is_zero_copy() {
    let caps = DisplayCapabilities::x11();
    let mut plan = planner().plan(MONO8, &caps, 4, 4);
    let raw = frame(MONO8, 4, 4, (0..16).collect());

    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    assert_eq!(out.data.as_ptr(), raw.data.as_ptr());
    assert_eq!(out.data.len(), raw.data.len());
    assert_eq!(out.depth_bits, 8);
}

#[test]
fn test_cfa_shown_as_mono_without_copy() {
    let bayer8 = PixelEncoding::Bayer { cfa: CfaPattern::Rggb, depth: 8, packed: false };
    let mut plan = PixelFormatPlanner::new(false).plan(bayer8, &DisplayCapabilities::x11(), 4, 2);
    let raw = frame(bayer8, 4, 2, vec![7; 8]);

    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    assert_eq!(out.encoding, MONO8);
    assert_eq!(out.data.as_ptr(), raw.data.as_ptr());
}

#[test]
fn test_converted_size_matches_target_depth() {
    let caps = DisplayCapabilities::x11();
    let mut plan = planner().plan(RGB8, &caps, 8, 8);
    let scratch = plan.scratch_len();

    let raw = frame(RGB8, 8, 8, vec![0x10; 8 * 8 * 3]);
    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    assert_eq!(out.encoding, BGRA8);
    assert_eq!(out.data.len(), 8 * 8 * 4);
    assert!(out.data.len() <= scratch);

    // A smaller frame converts into the front of the scratch buffer.
    let small = frame(RGB8, 4, 4, vec![0x10; 4 * 4 * 3]);
    let out = FrameConverter::new().convert(&small, &mut plan).unwrap();
    assert_eq!(out.data.len(), 4 * 4 * 4);
}

#[test]
fn test_rgb_is_reordered_for_display() {
    let caps = DisplayCapabilities::x11();
    let mut plan = planner().plan(RGB8, &caps, 1, 1);
    let raw = frame(RGB8, 1, 1, vec![1, 2, 3]);

    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    assert_eq!(out.data, &[3, 2, 1, 0xFF]);
}

#[test]
fn test_oversize_frame_is_skipped() {
    let caps = DisplayCapabilities::x11();
    let mut plan = planner().plan(RGB8, &caps, 4, 4);
    let raw = frame(RGB8, 8, 8, vec![0; 8 * 8 * 3]);
    assert!(FrameConverter::new().convert(&raw, &mut plan).is_none());
}

#[test]
fn test_short_buffer_is_skipped() {
    let caps = DisplayCapabilities::x11();
    let mut plan = planner().plan(MONO8, &caps, 4, 4);
    let raw = frame(MONO8, 4, 4, vec![0; 10]);
    assert!(FrameConverter::new().convert(&raw, &mut plan).is_none());

    let mut plan = planner().plan(RGB8, &caps, 4, 4);
    let raw = frame(RGB8, 4, 4, vec![0; 20]);
    assert!(FrameConverter::new().convert(&raw, &mut plan).is_none());
}

#[test]
fn test_flat_mosaic_demosaics_to_flat_bgra() {
    let bayer8 = PixelEncoding::Bayer { cfa: CfaPattern::Rggb, depth: 8, packed: false };
    let mut plan = planner().plan(bayer8, &DisplayCapabilities::x11(), 4, 4);
    let raw = frame(bayer8, 4, 4, vec![100; 16]);

    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    assert_eq!(out.data.len(), 64);
    for px in out.data.chunks_exact(4) {
        assert_eq!(px, &[100, 100, 100, 0xFF]);
    }
}

#[test]
fn test_packed_mosaic_is_staged_and_demosaiced() {
    let bayer12 = PixelEncoding::Bayer { cfa: CfaPattern::Bggr, depth: 12, packed: true };
    let mut data = vec![0u8; SampleLayout::Packed12.byte_len(16)];
    for i in 0..16 {
        store_sample(&mut data, SampleLayout::Packed12, i, 100 << 4);
    }
    let mut plan = planner().plan(bayer12, &DisplayCapabilities::x11(), 4, 4);
    let raw = frame(bayer12, 4, 4, data);

    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    for px in out.data.chunks_exact(4) {
        assert_eq!(px, &[100, 100, 100, 0xFF]);
    }
}

#[test]
fn test_packed_mono_unpacks_to_aligned_samples() {
    let packed = PixelEncoding::Mono { depth: 12, packed: true };
    let samples = [0x123u16, 0xABC, 0xFFF, 0x001];
    let mut data = vec![0u8; SampleLayout::Packed12.byte_len(4)];
    for (i, s) in samples.iter().enumerate() {
        store_sample(&mut data, SampleLayout::Packed12, i, *s);
    }
    let mut plan = planner().plan(packed, &DisplayCapabilities::x11(), 2, 2);
    let raw = frame(packed, 2, 2, data);

    let out = FrameConverter::new().convert(&raw, &mut plan).unwrap();
    let unpacked: Vec<u16> = out
        .data
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(unpacked, samples);
}

#[test]
fn test_unsupported_and_mismatched_frames_return_none() {
    let caps = DisplayCapabilities::x11();
    let mut plan = planner().plan(PixelEncoding::Yuv422, &caps, 2, 2);
    let raw = frame(PixelEncoding::Yuv422, 2, 2, vec![0x80; 8]);
    assert!(FrameConverter::new().convert(&raw, &mut plan).is_none());

    let mut plan = planner().plan(MONO8, &caps, 2, 2);
    let raw = frame(RGB8, 2, 2, vec![0; 12]);
    assert!(FrameConverter::new().convert(&raw, &mut plan).is_none());
}

#[test]
fn test_cfa_below_one_tile_is_skipped() {
    let bayer8 = PixelEncoding::Bayer { cfa: CfaPattern::Rggb, depth: 8, packed: false };
    let converter = FrameConverter::new();
    for (w, h) in [(1, 1), (2, 1), (1, 2)] {
        let mut plan = planner().plan(bayer8, &DisplayCapabilities::x11(), w, h);
        let raw = frame(bayer8, w, h, vec![50; (w * h) as usize]);
        assert!(converter.convert(&raw, &mut plan).is_none(), "{}x{}", w, h);
    }
}
