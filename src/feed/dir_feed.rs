//! Directory-backed feed for local runs.
//!
//! Discovers image files with walkdir and releases them one at a time at a
//! fixed interval, standing in for a query that downloads training images
//! while the scroller is already on screen.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::StatusFeed;
use crate::models::ImageRef;
use crate::resolve::LOCAL_ENGINE;

/// File extensions treated as images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

#[derive(Debug, Clone)]
pub struct DirFeedConfig {
    pub recursive: bool,
    pub follow_symlinks: bool,
    /// Delay between two released files. Zero releases everything at once.
    pub interval: Duration,
    /// Stop after this many files (0 = unlimited).
    pub limit: usize,
}

impl Default for DirFeedConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            interval: Duration::from_millis(250),
            limit: 0,
        }
    }
}

/// A feed over the image files of one directory.
///
/// References are paths relative to the root, tagged with the local engine.
#[derive(Debug)]
pub struct DirectoryFeed {
    root: PathBuf,
    refs: Vec<ImageRef>,
    interval: Duration,
    started: Instant,
}

impl DirectoryFeed {
    pub fn open(root: &Path, config: &DirFeedConfig) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Feed root is not a directory: {}", root.display());
        }
        let mut refs = Self::discover(root, config)
            .with_context(|| format!("Failed to scan {:?}", root))?;
        if config.limit > 0 {
            refs.truncate(config.limit);
        }
        debug!(root = ?root, count = refs.len(), "Opened directory feed");

        Ok(Self {
            root: root.to_path_buf(),
            refs,
            interval: config.interval,
            started: Instant::now(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files found at open time, whether released yet or not.
    pub fn discovered(&self) -> usize {
        self.refs.len()
    }

    fn discover(root: &Path, config: &DirFeedConfig) -> Result<Vec<ImageRef>> {
        let mut walker = WalkDir::new(root)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name();
        if !config.recursive {
            walker = walker.max_depth(1);
        }

        let mut refs = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path);
            refs.push(ImageRef::new(
                relative.to_string_lossy().into_owned(),
                LOCAL_ENGINE,
            ));
        }
        Ok(refs)
    }

    fn released(&self) -> usize {
        if self.interval.is_zero() {
            return self.refs.len();
        }
        let ticks = self.started.elapsed().as_nanos() / self.interval.as_nanos();
        (ticks as usize).saturating_add(1).min(self.refs.len())
    }
}

impl StatusFeed for DirectoryFeed {
    fn available(&self) -> Option<usize> {
        Some(self.released())
    }

    fn get(&self, index: usize) -> Option<ImageRef> {
        if index < self.released() {
            self.refs.get(index).cloned()
        } else {
            None
        }
    }
}
