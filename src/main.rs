mod cli;
#[cfg(feature = "gtk")]
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use imscroll::driver::FrameDriver;
use imscroll::feed::{DirFeedConfig, DirectoryFeed};
use imscroll::loader::{FsFetcher, LoadMode, LoadPipeline};
use imscroll::resolve::LocalResolver;
use imscroll::session::ScrollerSession;
use imscroll::surface::RasterSurface;
use imscroll::ScrollerConfig;

use cli::RunArgs;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("imscroll=info".parse()?),
        )
        .init();

    let Some(args) = cli::parse_args(std::env::args().skip(1))? else {
        println!("{}", cli::USAGE);
        return Ok(());
    };

    if args.gtk {
        return run_window(args);
    }
    run_headless(&args)
}

#[cfg(feature = "gtk")]
fn run_window(args: RunArgs) -> Result<()> {
    ui::run(args)
}

#[cfg(not(feature = "gtk"))]
fn run_window(_args: RunArgs) -> Result<()> {
    anyhow::bail!("imscroll was built without the `gtk` feature")
}

/// Shared by the headless and windowed front-ends.
pub(crate) fn open_feed(args: &RunArgs) -> Result<(DirectoryFeed, LoadPipeline)> {
    let feed_config = DirFeedConfig {
        recursive: args.recursive,
        interval: args.feed_interval,
        ..DirFeedConfig::default()
    };
    let feed = DirectoryFeed::open(&args.dir, &feed_config)?;
    info!(dir = ?args.dir, images = feed.discovered(), "Found images");

    let pipeline = LoadPipeline::new(
        Arc::new(LocalResolver::new(&args.dir)),
        Arc::new(FsFetcher),
        LoadMode::Threaded,
    );
    Ok((feed, pipeline))
}

fn run_headless(args: &RunArgs) -> Result<()> {
    let (feed, pipeline) = open_feed(args)?;
    let config = ScrollerConfig::default().with_fps(args.fps);
    let mut surface = RasterSurface::new(args.width, args.height);
    let mut session = ScrollerSession::mount(config, feed, pipeline, &surface)
        .context("Failed to mount scroller on raster surface")?;

    let mut driver = FrameDriver::from_config(session.config());
    if let Some(frames) = args.frames {
        driver = driver.with_max_frames(frames);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    let summary = runtime.block_on(driver.run(&mut session, &mut surface, async {
        let _ = tokio::signal::ctrl_c().await;
    }));
    session.teardown();

    if let Some(path) = &args.snapshot {
        surface
            .save_png(path)
            .with_context(|| format!("Failed to write snapshot {:?}", path))?;
        info!(path = ?path, "Wrote snapshot");
    }

    let stats = session.stats();
    println!(
        "frames={} fps={:.1} requested={} loaded={} failed={} settled={} min_offset={:.1}",
        summary.frames,
        summary.achieved_fps(),
        stats.requested,
        stats.loaded,
        stats.failed,
        stats.settled,
        stats.min_offset
    );
    Ok(())
}
