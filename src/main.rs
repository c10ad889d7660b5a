use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use gev_display_rs::acquisition::{SimulatedCamera, SimulatedCameraConfig};
use gev_display_rs::display::Renderer;
use gev_display_rs::image_pipeline::{PixelEncoding, TiffCompression};
use gev_display_rs::logger;
use gev_display_rs::session::{AcquisitionSession, Command, CommandOutcome, SessionConfig, MENU};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::DeflateBalanced => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Live camera display with save-on-demand", long_about = None)]
struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Device pixel format (GenICam name, e.g. Mono8, BayerRG8, Mono12Packed)
    #[arg(short, long, default_value = "BayerRG8")]
    pixel_format: String,

    /// Time between frames in continuous mode
    #[arg(long, default_value_t = 33)]
    frame_interval_ms: u64,

    /// Mark every n-th frame as incomplete
    #[arg(long)]
    incomplete_every: Option<u64>,

    /// Bound on one wait for the next frame
    #[arg(long, default_value_t = 1000)]
    poll_timeout_ms: u64,

    /// Show CFA frames as grayscale mosaics and save them unconverted
    #[arg(long)]
    no_bayer_conversion: bool,

    /// Directory saved images are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = CompressionArg::None)]
    compression: CompressionArg,

    /// Open a window instead of logging the display rate
    #[arg(long)]
    window: bool,
}

fn make_renderer(args: &Args) -> Box<dyn FnOnce() -> gev_display_rs::image_pipeline::Result<Box<dyn Renderer>> + Send> {
    #[cfg(feature = "window")]
    if args.window {
        let (width, height) = (args.width, args.height);
        return Box::new(move || {
            let window = gev_display_rs::display::WindowRenderer::open("gev_display", width, height)?;
            Ok(Box::new(window) as Box<dyn Renderer>)
        });
    }
    #[cfg(not(feature = "window"))]
    if args.window {
        tracing::warn!("Built without the `window` feature; logging the display rate instead");
    }
    Box::new(|| Ok(Box::new(gev_display_rs::display::TracingRenderer::default()) as Box<dyn Renderer>))
}

fn main() -> Result<()> {
    logger::init();

    let args = Args::parse();
    info!("Starting gev_display...");

    let encoding = PixelEncoding::from_name(&args.pixel_format)
        .with_context(|| format!("unknown pixel format '{}'", args.pixel_format))?;

    let camera = Arc::new(SimulatedCamera::open(SimulatedCameraConfig {
        width: args.width,
        height: args.height,
        encoding,
        frame_interval: Duration::from_millis(args.frame_interval_ms),
        incomplete_every: args.incomplete_every,
        ..Default::default()
    })?);

    let config = SessionConfig::builder()
        .poll_timeout(Duration::from_millis(args.poll_timeout_ms))
        .bayer_conversion(!args.no_bayer_conversion)
        .compression(args.compression.into())
        .output_dir(args.output_dir.clone())
        .build();

    let renderer = make_renderer(&args);
    let mut session = AcquisitionSession::open(camera, config, renderer)?;

    println!("{}", MENU);
    let mut stdin = std::io::stdin().lock().bytes();
    loop {
        let key = match stdin.next() {
            Some(Ok(byte)) => byte as char,
            Some(Err(e)) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
            None => break,
        };
        if key == '\r' || key == '\n' {
            continue;
        }
        let Some(command) = Command::parse(key) else {
            continue;
        };

        match session.execute(command) {
            Ok(CommandOutcome::Quit) => break,
            Ok(outcome) => {
                let message = outcome.to_string();
                if !message.is_empty() {
                    println!("{}", message);
                }
            }
            Err(e) => println!("Error executing {}: {}", command, e),
        }
    }

    if let Some(stats) = session.shutdown() {
        info!(
            rendered = stats.rendered,
            incomplete = stats.dropped_incomplete,
            timeouts = stats.timeouts,
            "Display statistics"
        );
    }
    Ok(())
}
