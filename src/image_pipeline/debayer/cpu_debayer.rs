use anyhow::{ensure, Result};
use tracing::trace;
use std::io::Cursor;
use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};

use crate::image_pipeline::convert::color::expand_rgb_to_rgba_in_place;
use crate::image_pipeline::format::{CfaPattern, ColorOrder};

fn cfa_of(pattern: CfaPattern) -> CFA {
    match pattern {
        CfaPattern::Rggb => CFA::RGGB,
        CfaPattern::Grbg => CFA::GRBG,
        CfaPattern::Gbrg => CFA::GBRG,
        CfaPattern::Bggr => CFA::BGGR,
    }
}

/// Bilinear demosaic on the CPU via the `bayer` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn new() -> Self {
        Self
    }

    /// 8-bit mosaic to interleaved RGB8 (`rgb` holds `width * height * 3` bytes).
    pub fn demosaic_rgb8(
        &self,
        mosaic: &[u8],
        width: usize,
        height: usize,
        pattern: CfaPattern,
        rgb: &mut [u8],
    ) -> Result<()> {
        self.run(mosaic, width, height, pattern, rgb, BayerDepth::Depth8, RasterDepth::Depth8, 1)
    }

    /// 16-bit little-endian mosaic to interleaved RGB16 (little-endian).
    pub fn demosaic_rgb16(
        &self,
        mosaic: &[u8],
        width: usize,
        height: usize,
        pattern: CfaPattern,
        rgb: &mut [u8],
    ) -> Result<()> {
        self.run(mosaic, width, height, pattern, rgb, BayerDepth::Depth16LE, RasterDepth::Depth16, 2)
    }

    /// 8-bit mosaic to 32-bit colour. Alpha is written opaque.
    pub fn demosaic_rgba8(
        &self,
        mosaic: &[u8],
        width: usize,
        height: usize,
        pattern: CfaPattern,
        order: ColorOrder,
        rgba: &mut [u8],
    ) -> Result<()> {
        let count = width * height;
        ensure!(rgba.len() >= count * 4, "RGBA buffer holds {} bytes, {} needed", rgba.len(), count * 4);
        self.demosaic_rgb8(mosaic, width, height, pattern, &mut rgba[..count * 3])?;
        expand_rgb_to_rgba_in_place(rgba, count, order);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        mosaic: &[u8],
        width: usize,
        height: usize,
        pattern: CfaPattern,
        out: &mut [u8],
        bayer_depth: BayerDepth,
        raster_depth: RasterDepth,
        bytes_per_sample: usize,
    ) -> Result<()> {
        let input_len = width * height * bytes_per_sample;
        let output_len = input_len * 3;
        ensure!(mosaic.len() >= input_len, "mosaic holds {} bytes, {} needed", mosaic.len(), input_len);
        ensure!(out.len() >= output_len, "RGB buffer holds {} bytes, {} needed", out.len(), output_len);

        trace!("Demosaic {}x{} {:?}, {} bytes -> {} bytes", width, height, pattern, input_len, output_len);

        let mut cursor = Cursor::new(&mosaic[..input_len]);
        let mut output_raster = RasterMut::new(width, height, raster_depth, &mut out[..output_len]);

        bayer::run_demosaic(
            &mut cursor,
            bayer_depth,
            cfa_of(pattern),
            Demosaic::Linear,
            &mut output_raster,
        ).map_err(|e| anyhow::anyhow!("Demosaic failed: {:?}", e))?;

        Ok(())
    }
}
