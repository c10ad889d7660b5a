//! Pixel encoding types
//!
//! Device formats are GigE Vision PFNC codes. The pipeline only needs two
//! things from a code: which family it belongs to and how its samples are
//! laid out in memory, so the code is decoded once into a [`PixelEncoding`].

use std::fmt;

/// Colour filter array tile, named by its top-left 2x2 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfaPattern {
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

/// Component order of interleaved colour pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

/// Colour model of an encoding, independent of bit packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingFamily {
    Monochrome,
    Rgb,
    Bayer,
    Yuv,
    Unknown,
}

/// Decoded device pixel format.
///
/// `depth` is the number of significant bits per sample. Unpacked samples
/// deeper than 8 bits occupy a little-endian `u16`; packed samples store two
/// pixels in three bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelEncoding {
    Mono { depth: u8, packed: bool },
    Bayer { cfa: CfaPattern, depth: u8, packed: bool },
    /// Three interleaved components of `depth` bits each.
    Rgb { order: ColorOrder, depth: u8 },
    /// Four 8-bit components, alpha last.
    Rgba8 { order: ColorOrder },
    /// YUV 4:2:2, 8 bits per component.
    Yuv422,
    /// A code the pipeline has no layout for.
    Other(u32),
}

pub const MONO8: PixelEncoding = PixelEncoding::Mono { depth: 8, packed: false };
pub const MONO16: PixelEncoding = PixelEncoding::Mono { depth: 16, packed: false };
pub const RGB8: PixelEncoding = PixelEncoding::Rgb { order: ColorOrder::Rgb, depth: 8 };
pub const RGBA8: PixelEncoding = PixelEncoding::Rgba8 { order: ColorOrder::Rgb };
pub const BGRA8: PixelEncoding = PixelEncoding::Rgba8 { order: ColorOrder::Bgr };

const fn mono(depth: u8, packed: bool) -> PixelEncoding {
    PixelEncoding::Mono { depth, packed }
}

const fn bayer(cfa: CfaPattern, depth: u8, packed: bool) -> PixelEncoding {
    PixelEncoding::Bayer { cfa, depth, packed }
}

const fn rgb(order: ColorOrder, depth: u8) -> PixelEncoding {
    PixelEncoding::Rgb { order, depth }
}

use CfaPattern::{Bggr, Gbrg, Grbg, Rggb};
use ColorOrder::{Bgr, Rgb};

/// PFNC code, feature name and decoded encoding of every supported format.
const PFNC_TABLE: &[(u32, &str, PixelEncoding)] = &[
    (0x0108_0001, "Mono8", mono(8, false)),
    (0x0110_0003, "Mono10", mono(10, false)),
    (0x010C_0004, "Mono10Packed", mono(10, true)),
    (0x0110_0005, "Mono12", mono(12, false)),
    (0x010C_0006, "Mono12Packed", mono(12, true)),
    (0x0110_0025, "Mono14", mono(14, false)),
    (0x0110_0007, "Mono16", mono(16, false)),
    (0x0108_0008, "BayerGR8", bayer(Grbg, 8, false)),
    (0x0108_0009, "BayerRG8", bayer(Rggb, 8, false)),
    (0x0108_000A, "BayerGB8", bayer(Gbrg, 8, false)),
    (0x0108_000B, "BayerBG8", bayer(Bggr, 8, false)),
    (0x0110_000C, "BayerGR10", bayer(Grbg, 10, false)),
    (0x0110_000D, "BayerRG10", bayer(Rggb, 10, false)),
    (0x0110_000E, "BayerGB10", bayer(Gbrg, 10, false)),
    (0x0110_000F, "BayerBG10", bayer(Bggr, 10, false)),
    (0x0110_0010, "BayerGR12", bayer(Grbg, 12, false)),
    (0x0110_0011, "BayerRG12", bayer(Rggb, 12, false)),
    (0x0110_0012, "BayerGB12", bayer(Gbrg, 12, false)),
    (0x0110_0013, "BayerBG12", bayer(Bggr, 12, false)),
    (0x010C_0026, "BayerGR10Packed", bayer(Grbg, 10, true)),
    (0x010C_0027, "BayerRG10Packed", bayer(Rggb, 10, true)),
    (0x010C_0028, "BayerGB10Packed", bayer(Gbrg, 10, true)),
    (0x010C_0029, "BayerBG10Packed", bayer(Bggr, 10, true)),
    (0x010C_002A, "BayerGR12Packed", bayer(Grbg, 12, true)),
    (0x010C_002B, "BayerRG12Packed", bayer(Rggb, 12, true)),
    (0x010C_002C, "BayerGB12Packed", bayer(Gbrg, 12, true)),
    (0x010C_002D, "BayerBG12Packed", bayer(Bggr, 12, true)),
    (0x0110_002E, "BayerGR16", bayer(Grbg, 16, false)),
    (0x0110_002F, "BayerRG16", bayer(Rggb, 16, false)),
    (0x0110_0030, "BayerGB16", bayer(Gbrg, 16, false)),
    (0x0110_0031, "BayerBG16", bayer(Bggr, 16, false)),
    (0x0218_0014, "RGB8", rgb(Rgb, 8)),
    (0x0218_0015, "BGR8", rgb(Bgr, 8)),
    (0x0220_0016, "RGBa8", PixelEncoding::Rgba8 { order: Rgb }),
    (0x0220_0017, "BGRa8", PixelEncoding::Rgba8 { order: Bgr }),
    (0x0230_0018, "RGB10", rgb(Rgb, 10)),
    (0x0230_0019, "BGR10", rgb(Bgr, 10)),
    (0x0230_001A, "RGB12", rgb(Rgb, 12)),
    (0x0230_001B, "BGR12", rgb(Bgr, 12)),
    (0x0230_0033, "RGB16", rgb(Rgb, 16)),
    (0x0210_001F, "YUV422Packed", PixelEncoding::Yuv422),
];

impl PixelEncoding {
    /// Decodes a PFNC code. Unknown codes become [`PixelEncoding::Other`].
    pub fn from_code(code: u32) -> Self {
        PFNC_TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, _, encoding)| *encoding)
            .unwrap_or(PixelEncoding::Other(code))
    }

    /// Looks up an encoding by its `PixelFormat` feature name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        PFNC_TABLE
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, _, encoding)| *encoding)
    }

    pub fn code(&self) -> u32 {
        if let PixelEncoding::Other(code) = self {
            return *code;
        }
        PFNC_TABLE
            .iter()
            .find(|(_, _, encoding)| encoding == self)
            .map(|(code, _, _)| *code)
            .unwrap_or(0)
    }

    pub fn name(&self) -> Option<&'static str> {
        PFNC_TABLE
            .iter()
            .find(|(_, _, encoding)| encoding == self)
            .map(|(_, name, _)| *name)
    }

    pub fn family(&self) -> EncodingFamily {
        match self {
            PixelEncoding::Mono { .. } => EncodingFamily::Monochrome,
            PixelEncoding::Bayer { .. } => EncodingFamily::Bayer,
            PixelEncoding::Rgb { .. } | PixelEncoding::Rgba8 { .. } => EncodingFamily::Rgb,
            PixelEncoding::Yuv422 => EncodingFamily::Yuv,
            PixelEncoding::Other(_) => EncodingFamily::Unknown,
        }
    }

    pub fn is_packed(&self) -> bool {
        matches!(
            self,
            PixelEncoding::Mono { packed: true, .. } | PixelEncoding::Bayer { packed: true, .. }
        )
    }

    pub fn component_count(&self) -> u32 {
        match self {
            PixelEncoding::Mono { .. } | PixelEncoding::Bayer { .. } => 1,
            PixelEncoding::Rgb { .. } => 3,
            PixelEncoding::Rgba8 { .. } => 4,
            PixelEncoding::Yuv422 => 2,
            PixelEncoding::Other(_) => 1,
        }
    }

    /// Significant bits of one component.
    pub fn bits_per_component(&self) -> u32 {
        match self {
            PixelEncoding::Mono { depth, .. }
            | PixelEncoding::Bayer { depth, .. }
            | PixelEncoding::Rgb { depth, .. } => *depth as u32,
            PixelEncoding::Rgba8 { .. } | PixelEncoding::Yuv422 => 8,
            PixelEncoding::Other(code) => (code >> 16) & 0xFF,
        }
    }

    /// Significant bits of one pixel (the display "depth").
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            PixelEncoding::Other(code) => (code >> 16) & 0xFF,
            _ => self.bits_per_component() * self.component_count(),
        }
    }

    /// Bytes one pixel occupies once its samples are byte-aligned.
    pub fn bytes_per_pixel(&self) -> usize {
        let per_component = self.bits_per_component().div_ceil(8) as usize;
        per_component * self.component_count() as usize
    }

    /// Size in bytes of a `width` x `height` frame in this encoding.
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        if self.is_packed() {
            pixels.div_ceil(2) * 3
        } else {
            pixels * self.bytes_per_pixel()
        }
    }

    /// The format the transfer layer reports after unpacking.
    pub fn unpacked(&self) -> Self {
        match *self {
            PixelEncoding::Mono { depth, .. } => PixelEncoding::Mono { depth, packed: false },
            PixelEncoding::Bayer { cfa, depth, .. } => PixelEncoding::Bayer { cfa, depth, packed: false },
            other => other,
        }
    }

    /// CFA data reinterpreted as plain monochrome samples.
    pub fn as_mono(&self) -> Self {
        match *self {
            PixelEncoding::Bayer { depth, packed, .. } => PixelEncoding::Mono { depth, packed },
            other => other,
        }
    }

    /// Colour encoding a CFA frame is saved as after demosaicing.
    ///
    /// 8-bit tiles become RGBA8; deeper tiles keep their precision as RGB16.
    pub fn bayer_as_rgb(&self) -> Option<Self> {
        match *self {
            PixelEncoding::Bayer { depth, .. } if depth <= 8 => Some(RGBA8),
            PixelEncoding::Bayer { .. } => Some(PixelEncoding::Rgb { order: ColorOrder::Rgb, depth: 16 }),
            _ => None,
        }
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08x}", self.code()),
        }
    }
}
