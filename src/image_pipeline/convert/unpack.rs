//! Single-component sample layouts.
//!
//! Packed formats use the GigE Vision legacy layout: two pixels in three
//! bytes, most significant bits in bytes 0 and 2, the low bits of both pixels
//! sharing byte 1.

use anyhow::{bail, ensure, Result};

use crate::image_pipeline::format::PixelEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    U8,
    U16Le,
    Packed10,
    Packed12,
}

impl SampleLayout {
    /// Layout of a monochrome or CFA encoding; `None` for anything else.
    pub fn of(encoding: PixelEncoding) -> Option<Self> {
        match encoding {
            PixelEncoding::Mono { depth, packed } | PixelEncoding::Bayer { depth, packed, .. } => {
                match (depth, packed) {
                    (1..=8, false) => Some(SampleLayout::U8),
                    (9..=16, false) => Some(SampleLayout::U16Le),
                    (10, true) => Some(SampleLayout::Packed10),
                    (12, true) => Some(SampleLayout::Packed12),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn byte_len(&self, count: usize) -> usize {
        match self {
            SampleLayout::U8 => count,
            SampleLayout::U16Le => count * 2,
            SampleLayout::Packed10 | SampleLayout::Packed12 => count.div_ceil(2) * 3,
        }
    }
}

/// Calls `visit(index, sample)` for each of the first `count` samples of `src`.
pub fn for_each_sample(
    src: &[u8],
    layout: SampleLayout,
    count: usize,
    mut visit: impl FnMut(usize, u16),
) -> Result<()> {
    let needed = layout.byte_len(count);
    ensure!(src.len() >= needed, "sample buffer holds {} bytes, {} needed", src.len(), needed);

    match layout {
        SampleLayout::U8 => {
            for (i, &b) in src[..count].iter().enumerate() {
                visit(i, b as u16);
            }
        }
        SampleLayout::U16Le => {
            for (i, c) in src.chunks_exact(2).take(count).enumerate() {
                visit(i, u16::from_le_bytes([c[0], c[1]]));
            }
        }
        SampleLayout::Packed10 | SampleLayout::Packed12 => {
            for (pair, c) in src[..needed].chunks_exact(3).enumerate() {
                let (b0, b1, b2) = (c[0] as u16, c[1] as u16, c[2] as u16);
                let (p0, p1) = if layout == SampleLayout::Packed10 {
                    ((b0 << 2) | (b1 & 0x03), (b2 << 2) | ((b1 >> 4) & 0x03))
                } else {
                    ((b0 << 4) | (b1 & 0x0F), (b2 << 4) | (b1 >> 4))
                };
                let i = pair * 2;
                visit(i, p0);
                if i + 1 < count {
                    visit(i + 1, p1);
                }
            }
        }
    }
    Ok(())
}

/// Writes sample `index` into `dst`. Packed layouts read-modify-write the
/// shared middle byte.
pub fn store_sample(dst: &mut [u8], layout: SampleLayout, index: usize, value: u16) {
    match layout {
        SampleLayout::U8 => dst[index] = value as u8,
        SampleLayout::U16Le => dst[index * 2..index * 2 + 2].copy_from_slice(&value.to_le_bytes()),
        SampleLayout::Packed10 => {
            let base = (index / 2) * 3;
            let low = (value & 0x03) as u8;
            if index % 2 == 0 {
                dst[base] = (value >> 2) as u8;
                dst[base + 1] = (dst[base + 1] & !0x03) | low;
            } else {
                dst[base + 2] = (value >> 2) as u8;
                dst[base + 1] = (dst[base + 1] & !0x30) | (low << 4);
            }
        }
        SampleLayout::Packed12 => {
            let base = (index / 2) * 3;
            let low = (value & 0x0F) as u8;
            if index % 2 == 0 {
                dst[base] = (value >> 4) as u8;
                dst[base + 1] = (dst[base + 1] & 0xF0) | low;
            } else {
                dst[base + 2] = (value >> 4) as u8;
                dst[base + 1] = (dst[base + 1] & 0x0F) | (low << 4);
            }
        }
    }
}

/// Moves a `from`-bit sample to `to` bits by shifting.
pub fn rescale(sample: u16, from: u32, to: u32) -> u16 {
    if from > to {
        sample >> (from - to)
    } else {
        sample << (to - from)
    }
}

pub fn to_u8(sample: u16, depth: u32) -> u8 {
    rescale(sample, depth, 8).min(u8::MAX as u16) as u8
}

/// Unpacks a monochrome (or CFA-as-mono) buffer into byte-aligned samples of
/// `target_depth` bits.
pub fn unpack_mono(
    src: &[u8],
    source: PixelEncoding,
    count: usize,
    dst: &mut [u8],
    target_depth: u32,
) -> Result<()> {
    let Some(layout) = SampleLayout::of(source) else {
        bail!("{} has no single-component layout", source);
    };
    let depth = source.bits_per_component();

    if target_depth <= 8 {
        ensure!(dst.len() >= count, "unpack destination too small");
        for_each_sample(src, layout, count, |i, v| dst[i] = to_u8(v, depth))
    } else {
        ensure!(dst.len() >= count * 2, "unpack destination too small");
        for_each_sample(src, layout, count, |i, v| {
            let v = rescale(v, depth, target_depth);
            dst[i * 2..i * 2 + 2].copy_from_slice(&v.to_le_bytes());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(samples: &[u16], layout: SampleLayout) -> Vec<u8> {
        let mut out = vec![0u8; layout.byte_len(samples.len())];
        for (i, &v) in samples.iter().enumerate() {
            store_sample(&mut out, layout, i, v);
        }
        out
    }

    fn collect(src: &[u8], layout: SampleLayout, count: usize) -> Vec<u16> {
        let mut out = vec![0u16; count];
        for_each_sample(src, layout, count, |i, v| out[i] = v).unwrap();
        out
    }

    #[test]
    fn test_mono12_packed_known_bytes() {
        // p0 = 0xABC, p1 = 0x123
        let bytes = [0xAB, 0x3C, 0x12];
        assert_eq!(collect(&bytes, SampleLayout::Packed12, 2), vec![0xABC, 0x123]);
    }

    #[test]
    fn test_mono10_packed_known_bytes() {
        // p0 = 0b11_1111_1101 (0x3FD), p1 = 0b00_0000_0110 (0x006)
        let bytes = [0xFF, 0b0010_0001, 0x01];
        assert_eq!(collect(&bytes, SampleLayout::Packed10, 2), vec![0x3FD, 0x006]);
    }

    #[test]
    fn test_packed_odd_count_and_shared_byte() {
        let samples = [0x3FF, 0x000, 0x155];
        let packed = pack(&samples, SampleLayout::Packed10);
        assert_eq!(packed.len(), 6);
        assert_eq!(collect(&packed, SampleLayout::Packed10, 3), samples.to_vec());

        let samples = [0x001, 0xFFE, 0x800, 0x7FF];
        let packed = pack(&samples, SampleLayout::Packed12);
        assert_eq!(collect(&packed, SampleLayout::Packed12, 4), samples.to_vec());
    }

    #[test]
    fn test_short_source_is_rejected() {
        assert!(for_each_sample(&[0u8; 5], SampleLayout::Packed12, 4, |_, _| {}).is_err());
        assert!(for_each_sample(&[0u8; 7], SampleLayout::U16Le, 4, |_, _| {}).is_err());
    }

    #[test]
    fn test_unpack_mono_to_native_and_8bit() {
        let source = PixelEncoding::Mono { depth: 12, packed: true };
        let packed = pack(&[0xFFF, 0x010], SampleLayout::Packed12);

        let mut wide = [0u8; 4];
        unpack_mono(&packed, source, 2, &mut wide, 12).unwrap();
        assert_eq!(wide, [0xFF, 0x0F, 0x10, 0x00]);

        let mut narrow = [0u8; 2];
        unpack_mono(&packed, source, 2, &mut narrow, 8).unwrap();
        assert_eq!(narrow, [0xFF, 0x01]);
    }
}
