use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const USAGE: &str = "\
Usage: imscroll [OPTIONS] [DIR]

Scrolls the images found under DIR across a strip as they are released.

Options:
  --dir <DIR>               Directory to read images from (default: .)
  --frames <N>              Stop after N frames (headless only)
  --fps <N>                 Target frame rate (default: 100)
  --width <PX>              Surface width (default: 1200)
  --height <PX>             Surface height (default: 160)
  --feed-interval-ms <MS>   Delay between released images (default: 250)
  --no-recursive            Only look at the top level of DIR
  --snapshot <FILE>         Write the last frame as PNG (headless only)
  --gtk                     Open an interactive window
  -h, --help                Print this help";

#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub dir: PathBuf,
    pub frames: Option<u64>,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub feed_interval: Duration,
    pub recursive: bool,
    pub snapshot: Option<PathBuf>,
    pub gtk: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            frames: None,
            fps: imscroll::config::DEFAULT_FPS,
            width: 1200,
            height: 160,
            feed_interval: Duration::from_millis(250),
            recursive: true,
            snapshot: None,
            gtk: false,
        }
    }
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("Missing value for {}", flag))
}

/// Parses command-line arguments (without the program name).
///
/// Returns `None` when help was requested.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<RunArgs>> {
    let mut parsed = RunArgs::default();
    let mut dir: Option<PathBuf> = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--dir" => dir = Some(PathBuf::from(value_for(&mut args, "--dir")?)),
            "--frames" => {
                let value = value_for(&mut args, "--frames")?;
                parsed.frames = Some(
                    value
                        .parse::<u64>()
                        .context("Failed to parse --frames as a non-negative integer")?,
                );
            }
            "--fps" => {
                parsed.fps = value_for(&mut args, "--fps")?
                    .parse::<u32>()
                    .context("Failed to parse --fps as a positive integer")?;
            }
            "--width" => {
                parsed.width = value_for(&mut args, "--width")?
                    .parse::<u32>()
                    .context("Failed to parse --width as a positive integer")?;
            }
            "--height" => {
                parsed.height = value_for(&mut args, "--height")?
                    .parse::<u32>()
                    .context("Failed to parse --height as a positive integer")?;
            }
            "--feed-interval-ms" => {
                let ms = value_for(&mut args, "--feed-interval-ms")?
                    .parse::<u64>()
                    .context("Failed to parse --feed-interval-ms as a non-negative integer")?;
                parsed.feed_interval = Duration::from_millis(ms);
            }
            "--no-recursive" => parsed.recursive = false,
            "--snapshot" => {
                parsed.snapshot = Some(PathBuf::from(value_for(&mut args, "--snapshot")?));
            }
            "--gtk" => parsed.gtk = true,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            _ => {
                if dir.is_some() {
                    bail!("Only one directory may be given");
                }
                dir = Some(PathBuf::from(arg));
            }
        }
    }

    if parsed.fps == 0 {
        bail!("--fps must be greater than 0");
    }
    if parsed.width == 0 || parsed.height == 0 {
        bail!("--width and --height must be greater than 0");
    }
    if parsed.gtk && parsed.snapshot.is_some() {
        bail!("--snapshot is only available in headless mode");
    }
    if let Some(dir) = dir {
        parsed.dir = dir;
    }
    Ok(Some(parsed))
}
