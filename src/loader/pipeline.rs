//! Load pipeline with a single in-flight slot.
//!
//! - At most one load is outstanding; `request` fails with `LoadBusy` otherwise
//! - Completions travel over a flume channel and are only consumed by `poll`,
//!   which the session calls at the very start of a frame
//! - Every request carries a generation; completions for anything other than
//!   the current slot are dropped

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::anyhow;
use flume::{Receiver, Sender};
use image::RgbaImage;
use tracing::{debug, trace, warn};

use super::fetch::ImageFetcher;
use crate::error::{Result, ScrollerError};
use crate::models::{DrawableHandle, ImageRef};
use crate::resolve::{Address, Resolver};

/// Where fetches run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// On a dedicated loader thread.
    Threaded,
    /// Synchronously inside `request`. The result is still only applied on
    /// the next `poll`, so frame ordering is unchanged.
    Inline,
}

/// Result of a finished load, as seen by the frame loop.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(DrawableHandle),
    Failed {
        reference: ImageRef,
        error: ScrollerError,
    },
}

/// Counters for the lifetime of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Completions dropped because their generation was no longer current.
    pub stale: usize,
}

struct LoadRequest {
    generation: u64,
    reference: ImageRef,
    address: Address,
}

struct LoadCompletion {
    generation: u64,
    reference: ImageRef,
    result: anyhow::Result<RgbaImage>,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    reference: ImageRef,
    started: Instant,
}

pub struct LoadPipeline {
    resolver: Arc<dyn Resolver>,
    fetcher: Arc<dyn ImageFetcher>,
    mode: LoadMode,
    request_tx: Option<Sender<LoadRequest>>,
    result_tx: Sender<LoadCompletion>,
    result_rx: Receiver<LoadCompletion>,
    worker: Option<JoinHandle<()>>,
    generation: u64,
    in_flight: Option<InFlight>,
    requested: HashSet<ImageRef>,
    stats: LoadStats,
    shut_down: bool,
}

impl LoadPipeline {
    pub fn new(resolver: Arc<dyn Resolver>, fetcher: Arc<dyn ImageFetcher>, mode: LoadMode) -> Self {
        let (result_tx, result_rx) = flume::unbounded();
        let mut pipeline = Self {
            resolver,
            fetcher,
            mode,
            request_tx: None,
            result_tx,
            result_rx,
            worker: None,
            generation: 0,
            in_flight: None,
            requested: HashSet::new(),
            stats: LoadStats::default(),
            shut_down: false,
        };
        if mode == LoadMode::Threaded {
            pipeline.spawn_worker();
        }
        pipeline
    }

    fn spawn_worker(&mut self) {
        // One slot never needs more than one queued request.
        let (request_tx, request_rx) = flume::bounded::<LoadRequest>(1);
        let result_tx = self.result_tx.clone();
        let fetcher = Arc::clone(&self.fetcher);

        let spawned = thread::Builder::new()
            .name("imscroll-loader".to_string())
            .spawn(move || worker_loop(request_rx, result_tx, fetcher));

        match spawned {
            Ok(handle) => {
                debug!("Started loader thread");
                self.request_tx = Some(request_tx);
                self.worker = Some(handle);
            }
            Err(e) => {
                warn!(error = %e, "Failed to spawn loader thread, loading inline");
                self.mode = LoadMode::Inline;
            }
        }
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// True when no load is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Reference currently being loaded.
    pub fn in_flight(&self) -> Option<&ImageRef> {
        self.in_flight.as_ref().map(|f| &f.reference)
    }

    pub fn was_requested(&self, reference: &ImageRef) -> bool {
        self.requested.contains(reference)
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Starts loading `reference`.
    ///
    /// Requires an idle slot and a reference not requested before. A
    /// reference that cannot be resolved still occupies the slot until its
    /// failure is consumed by `poll`.
    pub fn request(&mut self, reference: ImageRef) -> Result<()> {
        if self.shut_down {
            return Err(ScrollerError::TornDown);
        }
        if let Some(current) = &self.in_flight {
            return Err(ScrollerError::LoadBusy {
                in_flight: current.reference.clone(),
            });
        }
        if !self.requested.insert(reference.clone()) {
            return Err(ScrollerError::DuplicateRequest(reference));
        }

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.stats.requested += 1;
        self.in_flight = Some(InFlight {
            generation,
            reference: reference.clone(),
            started: Instant::now(),
        });
        debug!(%reference, generation, "Requesting image");

        let address = match self.resolver.resolve(&reference) {
            Ok(address) => address,
            Err(e) => {
                self.complete(generation, reference, Err(anyhow!(e)));
                return Ok(());
            }
        };

        match (self.mode, &self.request_tx) {
            (LoadMode::Threaded, Some(tx)) => {
                let request = LoadRequest {
                    generation,
                    reference: reference.clone(),
                    address,
                };
                if tx.send(request).is_err() {
                    self.complete(generation, reference, Err(anyhow!("loader thread has stopped")));
                }
            }
            _ => {
                let result = guarded_fetch(self.fetcher.as_ref(), &address);
                self.complete(generation, reference, result);
            }
        }
        Ok(())
    }

    fn complete(&self, generation: u64, reference: ImageRef, result: anyhow::Result<RgbaImage>) {
        let _ = self.result_tx.send(LoadCompletion {
            generation,
            reference,
            result,
        });
    }

    /// Takes the outcome of the in-flight load if it has finished.
    ///
    /// Never blocks. Completions from abandoned generations are discarded.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        while let Ok(completion) = self.result_rx.try_recv() {
            let current = match &self.in_flight {
                Some(f) if f.generation == completion.generation => f,
                _ => {
                    self.stats.stale += 1;
                    debug!(
                        reference = %completion.reference,
                        generation = completion.generation,
                        "Dropping stale load completion"
                    );
                    continue;
                }
            };
            trace!(
                reference = %completion.reference,
                elapsed_ms = current.started.elapsed().as_millis() as u64,
                "Load finished"
            );
            self.in_flight = None;
            return Some(self.outcome(completion));
        }
        None
    }

    fn outcome(&mut self, completion: LoadCompletion) -> LoadOutcome {
        let reference = completion.reference;
        let error = match completion.result {
            Ok(pixels) if pixels.width() > 0 && pixels.height() > 0 => {
                self.stats.loaded += 1;
                return LoadOutcome::Loaded(DrawableHandle::new(reference, pixels));
            }
            Ok(_) => ScrollerError::LoadFailure {
                reference: reference.clone(),
                reason: "image has no pixels".to_string(),
            },
            Err(e) => match e.downcast::<ScrollerError>() {
                Ok(resolution @ ScrollerError::Resolution { .. }) => resolution,
                Ok(other) => ScrollerError::LoadFailure {
                    reference: reference.clone(),
                    reason: other.to_string(),
                },
                Err(e) => ScrollerError::LoadFailure {
                    reference: reference.clone(),
                    reason: format!("{:#}", e),
                },
            },
        };
        self.stats.failed += 1;
        LoadOutcome::Failed { reference, error }
    }

    /// Forgets the in-flight load; its completion will be dropped as stale.
    pub fn abandon(&mut self) {
        if let Some(f) = self.in_flight.take() {
            debug!(reference = %f.reference, "Abandoning in-flight load");
        }
    }

    /// Stops the loader thread after any running fetch finishes.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.abandon();
        // Closing the request channel ends the worker loop.
        self.request_tx = None;
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        debug!(stats = ?self.stats, "Load pipeline shut down");
    }
}

impl Drop for LoadPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs a fetch, turning a panic inside the fetcher into an ordinary error
/// so the slot is always released.
fn guarded_fetch(fetcher: &dyn ImageFetcher, address: &Address) -> anyhow::Result<RgbaImage> {
    panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(address))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!(%address, %message, "Image fetcher panicked");
        Err(anyhow!("fetcher panicked: {}", message))
    })
}

fn worker_loop(
    rx: Receiver<LoadRequest>,
    tx: Sender<LoadCompletion>,
    fetcher: Arc<dyn ImageFetcher>,
) {
    while let Ok(req) = rx.recv() {
        let result = guarded_fetch(fetcher.as_ref(), &req.address);
        if let Err(e) = &result {
            trace!(reference = %req.reference, error = %e, "Fetch failed");
        }
        if tx
            .send(LoadCompletion {
                generation: req.generation,
                reference: req.reference,
                result,
            })
            .is_err()
        {
            break;
        }
    }
    debug!("Loader thread stopped");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::resolve::LOCAL_ENGINE;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Resolves every reference to a file path equal to its identifier.
    pub(crate) struct EchoResolver;

    impl Resolver for EchoResolver {
        fn resolve(&self, reference: &ImageRef) -> Result<Address> {
            if reference.path().starts_with("unresolvable") {
                return Err(ScrollerError::Resolution {
                    path: reference.path().to_string(),
                });
            }
            Ok(Address::File(PathBuf::from(reference.path())))
        }
    }

    /// Fetcher serving synthetic images. Paths look like `name_WxH`; a path
    /// starting with `broken` fails and one starting with `panic` panics.
    /// Records every fetch in order.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pub(crate) log: Mutex<Vec<String>>,
        pub(crate) delay: Duration,
    }

    impl ImageFetcher for FakeFetcher {
        fn fetch(&self, address: &Address) -> anyhow::Result<RgbaImage> {
            let Address::File(path) = address else {
                anyhow::bail!("unexpected address {}", address);
            };
            let name = path.to_string_lossy().into_owned();
            self.log.lock().push(name.clone());
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            if name.starts_with("broken") {
                anyhow::bail!("connection reset");
            }
            if name.starts_with("panic") {
                panic!("decoder blew up on {}", name);
            }
            let (w, h) = name
                .rsplit('_')
                .next()
                .and_then(|dims| dims.split_once('x'))
                .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
                .unwrap_or((10, 10));
            Ok(RgbaImage::new(w, h))
        }
    }

    pub(crate) fn image_ref(name: &str) -> ImageRef {
        ImageRef::new(name, LOCAL_ENGINE)
    }

    fn inline_pipeline() -> (LoadPipeline, Arc<FakeFetcher>) {
        let fetcher = Arc::new(FakeFetcher::default());
        let pipeline = LoadPipeline::new(Arc::new(EchoResolver), fetcher.clone(), LoadMode::Inline);
        (pipeline, fetcher)
    }

    #[test]
    fn test_inline_load_is_delivered_on_poll() {
        let (mut pipeline, _) = inline_pipeline();
        pipeline.request(image_ref("a_200x100")).unwrap();
        assert!(!pipeline.is_idle());

        match pipeline.poll() {
            Some(LoadOutcome::Loaded(handle)) => {
                assert_eq!((handle.natural_width, handle.natural_height), (200, 100));
            }
            other => panic!("expected loaded outcome, got {:?}", other),
        }
        assert!(pipeline.is_idle());
        assert_eq!(pipeline.stats().loaded, 1);
    }

    #[test]
    fn test_second_request_while_busy_is_rejected() {
        let (mut pipeline, _) = inline_pipeline();
        pipeline.request(image_ref("a")).unwrap();
        assert!(matches!(
            pipeline.request(image_ref("b")),
            Err(ScrollerError::LoadBusy { .. })
        ));
    }

    #[test]
    fn test_duplicate_reference_is_rejected() {
        let (mut pipeline, fetcher) = inline_pipeline();
        pipeline.request(image_ref("a")).unwrap();
        pipeline.poll();
        assert!(matches!(
            pipeline.request(image_ref("a")),
            Err(ScrollerError::DuplicateRequest(_))
        ));
        assert_eq!(fetcher.log.lock().len(), 1);
    }

    #[test]
    fn test_failed_fetch_frees_the_slot() {
        let (mut pipeline, _) = inline_pipeline();
        pipeline.request(image_ref("broken_1")).unwrap();
        match pipeline.poll() {
            Some(LoadOutcome::Failed { error, .. }) => {
                assert!(matches!(error, ScrollerError::LoadFailure { .. }));
                assert!(error.to_string().contains("connection reset"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(pipeline.is_idle());
        pipeline.request(image_ref("next")).unwrap();
    }

    #[test]
    fn test_resolution_error_is_reported_as_failure() {
        let (mut pipeline, fetcher) = inline_pipeline();
        pipeline.request(image_ref("unresolvable/x")).unwrap();
        match pipeline.poll() {
            Some(LoadOutcome::Failed { error, .. }) => {
                assert!(matches!(error, ScrollerError::Resolution { .. }));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(fetcher.log.lock().is_empty());
        assert_eq!(pipeline.stats().failed, 1);
    }

    #[test]
    fn test_abandoned_completion_is_stale() {
        let (mut pipeline, _) = inline_pipeline();
        pipeline.request(image_ref("a")).unwrap();
        pipeline.abandon();
        assert!(pipeline.poll().is_none());
        assert_eq!(pipeline.stats().stale, 1);
        assert!(pipeline.is_idle());
    }

    fn wait_for_outcome(pipeline: &mut LoadPipeline) -> LoadOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = pipeline.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "load timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_inline_fetch_panic_becomes_failure() {
        let (mut pipeline, _) = inline_pipeline();
        pipeline.request(image_ref("panic_1")).unwrap();
        match pipeline.poll() {
            Some(LoadOutcome::Failed { error, .. }) => {
                assert!(matches!(error, ScrollerError::LoadFailure { .. }));
                assert!(error.to_string().contains("decoder blew up"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(pipeline.is_idle());
    }

    #[test]
    fn test_loader_thread_survives_fetch_panic() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut pipeline =
            LoadPipeline::new(Arc::new(EchoResolver), fetcher.clone(), LoadMode::Threaded);

        pipeline.request(image_ref("panic_a")).unwrap();
        assert!(matches!(
            wait_for_outcome(&mut pipeline),
            LoadOutcome::Failed { .. }
        ));
        assert!(pipeline.is_idle());

        pipeline.request(image_ref("b_20x10")).unwrap();
        match wait_for_outcome(&mut pipeline) {
            LoadOutcome::Loaded(handle) => assert_eq!(handle.natural_width, 20),
            other => panic!("expected loaded outcome, got {:?}", other),
        }
        assert_eq!(pipeline.stats().failed, 1);
        assert_eq!(pipeline.stats().loaded, 1);
    }

    #[test]
    fn test_threaded_loads_complete_in_order() {
        let fetcher = Arc::new(FakeFetcher {
            delay: Duration::from_millis(5),
            ..Default::default()
        });
        let mut pipeline =
            LoadPipeline::new(Arc::new(EchoResolver), fetcher.clone(), LoadMode::Threaded);

        for name in ["a", "b", "c"] {
            pipeline.request(image_ref(name)).unwrap();
            let deadline = Instant::now() + Duration::from_secs(5);
            let outcome = loop {
                if let Some(outcome) = pipeline.poll() {
                    break outcome;
                }
                assert!(Instant::now() < deadline, "load of {} timed out", name);
                std::thread::sleep(Duration::from_millis(1));
            };
            assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        }
        assert_eq!(*fetcher.log.lock(), vec!["a", "b", "c"]);

        pipeline.shutdown();
        assert!(matches!(
            pipeline.request(image_ref("d")),
            Err(ScrollerError::TornDown)
        ));
    }
}
