//! Identifier resolution: turning an `ImageRef` into something fetchable.
//!
//! Resolution failures are reported as `ScrollerError::Resolution` and are
//! handled by the pipeline exactly like a failed load.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{Result, ScrollerError};
use crate::models::ImageRef;

/// Engine tag used for references that name local files.
pub const LOCAL_ENGINE: &str = "local";

const POSITIVE_MARKER: &str = "/postrainimgs/";
const CURATED_MARKER: &str = "/curatedtrainimgs/";

/// A fetchable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Url(Url),
    File(PathBuf),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Url(url) => write!(f, "{}", url),
            Address::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub trait Resolver: Send + Sync {
    fn resolve(&self, reference: &ImageRef) -> Result<Address>;
}

/// Maps backend image paths onto the site's static image routes.
///
/// `/.../postrainimgs/<dir>/<file>` becomes
/// `<home>postrainimgs/<engine>/<dir>/<file>` and
/// `/.../curatedtrainimgs/<a>/<b>/<file>` becomes
/// `<home>curatedtrainimgs/<engine>/<a>/<b>/<file>`.
///
/// The result is always an http(s) [`Address::Url`]. [`FsFetcher`] only
/// reads local files, so hosts using this resolver supply their own
/// [`ImageFetcher`] for web addresses.
///
/// [`FsFetcher`]: crate::loader::FsFetcher
/// [`ImageFetcher`]: crate::loader::ImageFetcher
#[derive(Debug, Clone)]
pub struct SiteResolver {
    home: Url,
}

impl SiteResolver {
    /// `home` is the site root, including any site prefix.
    pub fn new(home: &str) -> Result<Self> {
        let mut home = Url::parse(home)
            .map_err(|e| ScrollerError::InvalidConfig(format!("bad site root {:?}: {}", home, e)))?;
        if !home.path().ends_with('/') {
            let path = format!("{}/", home.path());
            home.set_path(&path);
        }
        Ok(Self { home })
    }

    fn route(&self, route: &str, engine: &str, tail: &str) -> Result<Address> {
        let relative = format!("{}/{}/{}", route, urlencoding::encode(engine), tail);
        self.home
            .join(&relative)
            .map(Address::Url)
            .map_err(|_| ScrollerError::Resolution { path: relative })
    }
}

/// Last `count` `/`-separated segments of `path`, each percent-encoded.
fn encoded_tail(path: &str, count: usize) -> String {
    let segments: Vec<&str> = path.rsplit('/').take(count).collect();
    segments
        .iter()
        .rev()
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl Resolver for SiteResolver {
    fn resolve(&self, reference: &ImageRef) -> Result<Address> {
        let path = reference.path();
        if path.contains(POSITIVE_MARKER) {
            // Spaces arrive pre-escaped and must survive a second decode.
            let path = path.replacen("%20", "%2520", 1);
            self.route("postrainimgs", reference.engine(), &encoded_tail(&path, 2))
        } else if path.contains(CURATED_MARKER) {
            self.route("curatedtrainimgs", reference.engine(), &encoded_tail(path, 3))
        } else {
            Err(ScrollerError::Resolution {
                path: path.to_string(),
            })
        }
    }
}

/// Resolves references to files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    root: PathBuf,
}

impl LocalResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Resolver for LocalResolver {
    fn resolve(&self, reference: &ImageRef) -> Result<Address> {
        let relative = Path::new(reference.path());
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes_root || relative.as_os_str().is_empty() {
            return Err(ScrollerError::Resolution {
                path: reference.path().to_string(),
            });
        }
        Ok(Address::File(self.root.join(relative)))
    }
}
