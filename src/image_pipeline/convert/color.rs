//! Conversions into 32-bit colour.

use anyhow::{ensure, Result};

use crate::image_pipeline::convert::unpack::{for_each_sample, to_u8, SampleLayout};
use crate::image_pipeline::format::{ColorOrder, PixelEncoding};

#[inline]
fn put_pixel(dst: &mut [u8], index: usize, rgb: [u8; 3], order: ColorOrder) {
    let px = &mut dst[index * 4..index * 4 + 4];
    match order {
        ColorOrder::Rgb => px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 0xFF]),
        ColorOrder::Bgr => px.copy_from_slice(&[rgb[2], rgb[1], rgb[0], 0xFF]),
    }
}

fn check_dst(dst: &[u8], count: usize) -> Result<()> {
    ensure!(dst.len() >= count * 4, "RGB32 destination holds {} bytes, {} needed", dst.len(), count * 4);
    Ok(())
}

/// Widens `count` RGB8 pixels stored at the front of `buf` to 32-bit pixels
/// in place. Walks backwards so no source pixel is overwritten before use.
pub fn expand_rgb_to_rgba_in_place(buf: &mut [u8], count: usize, order: ColorOrder) {
    for i in (0..count).rev() {
        let rgb = [buf[i * 3], buf[i * 3 + 1], buf[i * 3 + 2]];
        put_pixel(buf, i, rgb, order);
    }
}

/// Interleaved RGB/BGR of any component depth to 32-bit colour.
pub fn rgb_to_rgba(
    src: &[u8],
    source_order: ColorOrder,
    depth: u32,
    count: usize,
    dst: &mut [u8],
    order: ColorOrder,
) -> Result<()> {
    check_dst(dst, count)?;
    let wide = depth > 8;
    let stride = if wide { 6 } else { 3 };
    ensure!(src.len() >= count * stride, "RGB source holds {} bytes, {} needed", src.len(), count * stride);

    for (i, px) in src.chunks_exact(stride).take(count).enumerate() {
        let mut c = [0u8; 3];
        for (k, slot) in c.iter_mut().enumerate() {
            *slot = if wide {
                to_u8(u16::from_le_bytes([px[k * 2], px[k * 2 + 1]]), depth)
            } else {
                px[k]
            };
        }
        if source_order == ColorOrder::Bgr {
            c.swap(0, 2);
        }
        put_pixel(dst, i, c, order);
    }
    Ok(())
}

/// 32-bit colour in one component order to the other (alpha forced opaque).
pub fn rgba_reorder(
    src: &[u8],
    source_order: ColorOrder,
    count: usize,
    dst: &mut [u8],
    order: ColorOrder,
) -> Result<()> {
    check_dst(dst, count)?;
    ensure!(src.len() >= count * 4, "RGBA source holds {} bytes, {} needed", src.len(), count * 4);

    for (i, px) in src.chunks_exact(4).take(count).enumerate() {
        let rgb = match source_order {
            ColorOrder::Rgb => [px[0], px[1], px[2]],
            ColorOrder::Bgr => [px[2], px[1], px[0]],
        };
        put_pixel(dst, i, rgb, order);
    }
    Ok(())
}

/// Gray replicated into the three colour components.
pub fn mono_to_rgba(
    src: &[u8],
    source: PixelEncoding,
    count: usize,
    dst: &mut [u8],
    order: ColorOrder,
) -> Result<()> {
    check_dst(dst, count)?;
    let layout = SampleLayout::of(source)
        .ok_or_else(|| anyhow::anyhow!("{} has no single-component layout", source))?;
    let depth = source.bits_per_component();
    for_each_sample(src, layout, count, |i, v| {
        let g = to_u8(v, depth);
        put_pixel(dst, i, [g, g, g], order);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::format::MONO8;

    #[test]
    fn test_expand_in_place() {
        let mut buf = vec![1, 2, 3, 4, 5, 6, 0, 0];
        expand_rgb_to_rgba_in_place(&mut buf, 2, ColorOrder::Rgb);
        assert_eq!(buf, vec![1, 2, 3, 0xFF, 4, 5, 6, 0xFF]);

        let mut buf = vec![1, 2, 3, 4, 5, 6, 0, 0];
        expand_rgb_to_rgba_in_place(&mut buf, 2, ColorOrder::Bgr);
        assert_eq!(buf, vec![3, 2, 1, 0xFF, 6, 5, 4, 0xFF]);
    }

    #[test]
    fn test_rgb12_resamples_to_8bit() {
        // One pixel: R=0xFFF, G=0x800, B=0x010
        let src = [0xFF, 0x0F, 0x00, 0x08, 0x10, 0x00];
        let mut dst = [0u8; 4];
        rgb_to_rgba(&src, ColorOrder::Rgb, 12, 1, &mut dst, ColorOrder::Bgr).unwrap();
        assert_eq!(dst, [0x01, 0x80, 0xFF, 0xFF]);
    }

    #[test]
    fn test_reorder_and_gray() {
        let mut dst = [0u8; 4];
        rgba_reorder(&[10, 20, 30, 0], ColorOrder::Rgb, 1, &mut dst, ColorOrder::Bgr).unwrap();
        assert_eq!(dst, [30, 20, 10, 0xFF]);

        mono_to_rgba(&[77], MONO8, 1, &mut dst, ColorOrder::Rgb).unwrap();
        assert_eq!(dst, [77, 77, 77, 0xFF]);
    }

    #[test]
    fn test_short_destination_fails() {
        let mut dst = [0u8; 3];
        assert!(rgb_to_rgba(&[1, 2, 3], ColorOrder::Rgb, 8, 1, &mut dst, ColorOrder::Rgb).is_err());
    }
}
