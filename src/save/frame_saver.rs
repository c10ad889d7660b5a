use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{info, info_span, instrument, warn};

use crate::display::{FrameSnapshot, LatestFrameRegistry};
use crate::image_pipeline::common::error::{SaveError, SaveResult};
use crate::image_pipeline::convert::unpack::{for_each_sample, rescale, SampleLayout};
use crate::image_pipeline::debayer::CpuDebayer;
use crate::image_pipeline::format::{ColorOrder, EncodingFamily, PixelEncoding};
use crate::image_pipeline::tiff::{ImageWriter, SaveConfig, SaveImage, StandardTiffWriter};
use crate::save::filename::unique_path;
use crate::save::save_buffer::{BufferTracker, SaveBuffer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub encoding: PixelEncoding,
    pub sequence: u64,
}

/// Writes the registry's latest frame to disk on request.
pub struct FrameSaver<W: ImageWriter> {
    writer: W,
    config: SaveConfig,
    registry: Arc<LatestFrameRegistry>,
    debayer: CpuDebayer,
    buffers: BufferTracker,
}

impl FrameSaver<StandardTiffWriter> {
    pub fn new(registry: Arc<LatestFrameRegistry>, config: SaveConfig) -> Self {
        Self::with_custom(StandardTiffWriter, registry, config)
    }
}

impl<W: ImageWriter> FrameSaver<W> {
    pub fn with_custom(writer: W, registry: Arc<LatestFrameRegistry>, config: SaveConfig) -> Self {
        Self {
            writer,
            config,
            registry,
            debayer: CpuDebayer::new(),
            buffers: BufferTracker::new(),
        }
    }

    /// Conversion buffers currently alive. Zero whenever no save is running.
    pub fn outstanding_buffers(&self) -> usize {
        self.buffers.live()
    }

    /// Saves the most recent complete frame, interpreted as `encoding` at
    /// `width` x `height` (the stream's setup values).
    #[instrument(skip(self, encoding), fields(encoding = %encoding))]
    pub fn save_latest(&self, encoding: PixelEncoding, width: u32, height: u32) -> SaveResult<SavedImage> {
        let snapshot = self.registry.get().ok_or(SaveError::NoFrameYet)?;

        if width == 0 || height == 0 {
            return Err(SaveError::InvalidDimensions(width, height));
        }
        let expected = encoding.frame_len(width, height);
        if snapshot.data.len() < expected {
            return Err(SaveError::ShortBuffer {
                expected,
                actual: snapshot.data.len(),
            });
        }

        let converted = encoding.unpacked();
        let conversion = {
            let _span = info_span!("prepare_image", converted = %converted).entered();
            self.prepare(&snapshot, encoding, converted, width, height)?
        };
        let (save_encoding, data): (PixelEncoding, &[u8]) = match &conversion {
            Some((target, buffer)) => (*target, &buffer[..]),
            None => (encoding, &snapshot.data[..]),
        };
        let image = SaveImage {
            encoding: save_encoding,
            width,
            height,
            data,
        };

        let path = unique_path(
            &self.config.output_dir,
            &self.config.base_name,
            self.writer.extension(),
            SystemTime::now(),
        );
        let bytes_written = {
            let _span = info_span!("write_file", path = %path.display()).entered();
            self.write_file(&image, &path)?
        };

        info!("Image saved as : {} : {} bytes written", path.display(), bytes_written);
        Ok(SavedImage {
            path,
            bytes_written,
            encoding: save_encoding,
            sequence: snapshot.sequence,
        })
    }

    /// Builds the conversion buffer a save needs, if any.
    fn prepare(
        &self,
        snapshot: &FrameSnapshot,
        encoding: PixelEncoding,
        converted: PixelEncoding,
        width: u32,
        height: u32,
    ) -> SaveResult<Option<(PixelEncoding, SaveBuffer)>> {
        let count = width as usize * height as usize;

        if converted.family() == EncodingFamily::Bayer && self.config.bayer_conversion {
            let (PixelEncoding::Bayer { cfa, .. }, Some(target)) = (converted, converted.bayer_as_rgb()) else {
                return Err(SaveError::UnsupportedFormat(converted.to_string()));
            };
            let components = target.component_count() as usize;
            let size = count * components * target.bits_per_component().div_ceil(8) as usize;
            let fill = if components == 4 { 0xFF } else { 0 };
            let mut rgb = self.buffers.filled(size, fill);

            let (w, h) = (width as usize, height as usize);
            let layout = self.layout_of(encoding)?;
            let result = if target.bits_per_component() <= 8 {
                match layout {
                    SampleLayout::U8 => {
                        self.debayer
                            .demosaic_rgba8(&snapshot.data[..count], w, h, cfa, ColorOrder::Rgb, &mut rgb)
                    }
                    _ => {
                        let mosaic = self.unpack(&snapshot.data, encoding, layout, count, 8)?;
                        self.debayer.demosaic_rgba8(&mosaic, w, h, cfa, ColorOrder::Rgb, &mut rgb)
                    }
                }
            } else {
                let mosaic = self.unpack(&snapshot.data, encoding, layout, count, 16)?;
                self.debayer.demosaic_rgb16(&mosaic, w, h, cfa, &mut rgb)
            };
            result.map_err(|e| SaveError::Demosaic(e.to_string()))?;
            return Ok(Some((target, rgb)));
        }

        if encoding.is_packed() {
            let layout = self.layout_of(encoding)?;
            let depth = converted.bits_per_component();
            let unpacked = self.unpack(&snapshot.data, encoding, layout, count, depth)?;
            let target = if converted.family() == EncodingFamily::Bayer {
                converted.as_mono()
            } else {
                converted
            };
            return Ok(Some((target, unpacked)));
        }

        Ok(None)
    }

    fn layout_of(&self, encoding: PixelEncoding) -> SaveResult<SampleLayout> {
        SampleLayout::of(encoding).ok_or_else(|| SaveError::UnsupportedFormat(encoding.to_string()))
    }

    /// Byte-aligned copy of a single-component buffer at `depth` bits.
    fn unpack(
        &self,
        src: &[u8],
        encoding: PixelEncoding,
        layout: SampleLayout,
        count: usize,
        depth: u32,
    ) -> SaveResult<SaveBuffer> {
        let from = encoding.bits_per_component();
        let bytes = if depth <= 8 { 1 } else { 2 };
        let mut out = self.buffers.allocate(count * bytes);
        for_each_sample(src, layout, count, |i, v| {
            let v = rescale(v, from, depth);
            if bytes == 1 {
                out[i] = v.min(u8::MAX as u16) as u8;
            } else {
                out[i * 2..i * 2 + 2].copy_from_slice(&v.to_le_bytes());
            }
        })
        .map_err(|e| SaveError::UnsupportedFormat(e.to_string()))?;
        Ok(out)
    }

    fn write_file(&self, image: &SaveImage<'_>, path: &std::path::Path) -> SaveResult<u64> {
        let file = File::create(path)
            .map_err(|e| SaveError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        let mut output = BufWriter::new(file);

        let written = self
            .writer
            .write_image(image, &mut output, &self.config)
            .and_then(|n| {
                std::io::Write::flush(&mut output)?;
                Ok(n)
            });
        if written.is_err() {
            drop(output);
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove partial file {}: {}", path.display(), e);
            }
        }
        written
    }
}
