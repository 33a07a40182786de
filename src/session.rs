//! One mounted scroller.
//!
//! A session owns the strip, the scroll state, the drag state and the load
//! slot for a single surface. Everything is mutated from `tick` on the
//! caller's thread; the loader thread only ever hands results back through
//! the pipeline.

use tracing::{debug, info, warn};

use crate::config::ScrollerConfig;
use crate::error::{Result, ScrollerError};
use crate::feed::StatusFeed;
use crate::indicator::{Spinner, StatusLine};
use crate::input::{DragState, EventDisposition, PointerEvent};
use crate::loader::{LoadOutcome, LoadPipeline};
use crate::models::ImageRef;
use crate::physics::{DriftParams, PhysicsEngine, StepReport};
use crate::scroll::{MomentumParams, ScrollState};
use crate::strip::StripModel;
use crate::surface::Surface;

/// What happened during one `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Index of the item appended at the start of the frame.
    pub appended: Option<usize>,
    /// Reference whose load failure was absorbed this frame.
    pub failed: Option<ImageRef>,
    /// Reference whose load started this frame.
    pub requested: Option<ImageRef>,
    /// Physics summary; `None` while the strip is still empty.
    pub step: Option<StepReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub frames: u64,
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
    pub settled: usize,
    pub min_offset: f64,
}

pub struct ScrollerSession<F: StatusFeed> {
    config: ScrollerConfig,
    feed: F,
    pipeline: LoadPipeline,
    strip: StripModel,
    physics: PhysicsEngine,
    momentum: MomentumParams,
    scroll: ScrollState,
    drag: DragState,
    spinner: Spinner,
    status: StatusLine,
    draw_text: bool,
    /// Feed index of the next reference to request.
    next_index: usize,
    frame: u64,
    torn_down: bool,
}

impl<F: StatusFeed> ScrollerSession<F> {
    /// Prepares a session for `surface`.
    ///
    /// Fails with `UnsupportedEnvironment` when the surface cannot draw
    /// images or arcs; the host should then show something static instead
    /// and never start a frame loop.
    pub fn mount<S: Surface + ?Sized>(
        config: ScrollerConfig,
        feed: F,
        pipeline: LoadPipeline,
        surface: &S,
    ) -> Result<Self> {
        config.validate()?;
        let capabilities = surface.capabilities();
        capabilities.check()?;

        let (width, height) = surface.size();
        if width <= 0.0 || height <= 0.0 {
            return Err(ScrollerError::InvalidConfig(format!(
                "surface must have a drawing area, got {}x{}",
                width, height
            )));
        }
        let strip_height = config.strip_height.unwrap_or(height);
        if !capabilities.text {
            debug!("Surface cannot draw text, status line disabled");
        }
        info!(width, height, strip_height, load_mode = ?pipeline.mode(), "Mounted scroller");

        Ok(Self {
            physics: PhysicsEngine::new(DriftParams::from(&config)),
            momentum: MomentumParams::from(&config),
            spinner: Spinner::new(config.spinner.clone()),
            status: StatusLine::new(&config),
            strip: StripModel::new(width, strip_height),
            scroll: ScrollState::new(),
            drag: DragState::new((0.0, 0.0), (width, height)),
            draw_text: capabilities.text,
            next_index: 0,
            frame: 0,
            torn_down: false,
            config,
            feed,
            pipeline,
        })
    }

    /// Page position of the surface's top-left corner, used to translate
    /// pointer coordinates.
    pub fn set_surface_origin(&mut self, x: f64, y: f64) {
        self.drag.set_origin((x, y));
    }

    pub fn config(&self) -> &ScrollerConfig {
        &self.config
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn strip(&self) -> &StripModel {
        &self.strip
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn pipeline(&self) -> &LoadPipeline {
        &self.pipeline
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// True once every published reference has been requested and the load
    /// slot is empty.
    pub fn is_caught_up(&self) -> bool {
        self.pipeline.is_idle() && self.feed.available().map_or(false, |n| n <= self.next_index)
    }

    pub fn stats(&self) -> SessionStats {
        let loads = self.pipeline.stats();
        SessionStats {
            frames: self.frame,
            requested: loads.requested,
            loaded: self.strip.len(),
            failed: loads.failed,
            settled: self.strip.settled_count(),
            min_offset: self.scroll.min_offset(),
        }
    }

    /// Runs one frame: update then render.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S) -> FrameReport {
        let report = self.update();
        self.render(surface);
        report
    }

    /// Advances state by one frame without drawing.
    pub fn update(&mut self) -> FrameReport {
        if self.torn_down {
            return FrameReport {
                frame: self.frame,
                ..Default::default()
            };
        }
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };

        // Completed loads land before any motion so a physics pass never sees
        // the strip change under it.
        match self.pipeline.poll() {
            Some(LoadOutcome::Loaded(handle)) => {
                report.appended = Some(self.strip.append(handle));
            }
            Some(LoadOutcome::Failed { reference, error }) => {
                warn!(%reference, error = %error, "Skipping image that failed to load");
                report.failed = Some(reference);
            }
            None => {}
        }
        report.requested = self.request_next();

        let sample = self.drag.sample();
        if self.strip.is_empty() {
            self.status.advance_marquee(self.strip.surface_width());
        } else {
            report.step = Some(self.physics.step(
                &mut self.strip,
                &mut self.scroll,
                sample.pointer_down(),
            ));
            self.scroll.update(sample, &self.momentum);
        }
        report
    }

    fn request_next(&mut self) -> Option<ImageRef> {
        if !self.pipeline.is_idle() {
            return None;
        }
        let available = self.feed.available()?;
        if available <= self.next_index {
            return None;
        }
        let reference = self.feed.get(self.next_index)?;
        self.next_index += 1;

        match self.pipeline.request(reference.clone()) {
            Ok(()) => Some(reference),
            Err(e) => {
                warn!(index = self.next_index - 1, error = %e, "Not loading image");
                None
            }
        }
    }

    /// Draws the current state.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.torn_down {
            return;
        }
        surface.clear();

        if self.strip.is_empty() {
            self.spinner.draw(surface);
            if self.draw_text {
                self.status.draw_marquee(surface);
            }
            return;
        }

        let offset = self.scroll.offset();
        let surface_width = self.strip.surface_width();
        let strip_height = self.strip.strip_height();
        for item in self.strip.items().iter().filter(|item| !item.is_parked()) {
            let x = item.x() - offset;
            if x + item.width() < 0.0 || x > surface_width {
                continue;
            }
            surface.draw_image(item.handle(), x, 0.0, item.width(), strip_height);
        }

        if self.draw_text {
            self.status
                .draw_label(surface, self.strip.len(), self.feed.negative_count());
        }
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> EventDisposition {
        if self.torn_down {
            return EventDisposition::default();
        }
        self.drag.handle(event)
    }

    /// Stops the loader and freezes the session. Further ticks do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.pipeline.shutdown();
        self.drag.reset();
        self.torn_down = true;
        let stats = self.stats();
        info!(
            frames = stats.frames,
            loaded = stats.loaded,
            failed = stats.failed,
            "Scroller torn down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SharedFeed;
    use crate::loader::pipeline::tests::{image_ref, EchoResolver, FakeFetcher};
    use crate::loader::LoadMode;
    use crate::surface::{Capabilities, DrawCommand, RecordingSurface};
    use std::sync::Arc;

    fn session_with(
        names: &[&str],
        surface: &RecordingSurface,
    ) -> (ScrollerSession<SharedFeed>, SharedFeed, Arc<FakeFetcher>) {
        let feed = SharedFeed::with_refs(names.iter().map(|n| image_ref(n)));
        let fetcher = Arc::new(FakeFetcher::default());
        let pipeline = LoadPipeline::new(Arc::new(EchoResolver), fetcher.clone(), LoadMode::Inline);
        let session =
            ScrollerSession::mount(ScrollerConfig::default(), feed.clone(), pipeline, surface)
                .unwrap();
        (session, feed, fetcher)
    }

    fn run(session: &mut ScrollerSession<SharedFeed>, surface: &mut RecordingSurface, frames: usize) {
        for _ in 0..frames {
            session.tick(surface);
            session.strip().check_invariants().unwrap();
        }
    }

    #[test]
    fn test_mount_rejects_surface_without_images() {
        let surface = RecordingSurface::new(800.0, 100.0).with_capabilities(Capabilities {
            images: false,
            ..Capabilities::FULL
        });
        let pipeline = LoadPipeline::new(
            Arc::new(EchoResolver),
            Arc::new(FakeFetcher::default()),
            LoadMode::Inline,
        );
        let result = ScrollerSession::mount(
            ScrollerConfig::default(),
            SharedFeed::new(),
            pipeline,
            &surface,
        );
        assert!(matches!(
            result,
            Err(ScrollerError::UnsupportedEnvironment { .. })
        ));
    }

    #[test]
    fn test_single_image_drifts_in_and_settles() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&["a_200x100"], &surface);

        let first = session.tick(&mut surface);
        assert_eq!(first.requested, Some(image_ref("a_200x100")));
        assert_eq!(first.appended, None);

        let second = session.tick(&mut surface);
        assert_eq!(second.appended, Some(0));
        let item = session.strip().get(0).unwrap();
        assert_eq!(item.width(), 200.0);

        run(&mut session, &mut surface, 500);
        let item = session.strip().get(0).unwrap();
        assert_eq!(item.x(), 0.0);
        assert!(item.is_settled());
        assert_eq!(session.scroll().min_offset(), 0.0);
    }

    #[test]
    fn test_loads_happen_in_feed_order_one_at_a_time() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, fetcher) = session_with(&["a_100x100", "b_100x100", "c_100x100"], &surface);

        let mut requested = Vec::new();
        for _ in 0..10 {
            let report = session.tick(&mut surface);
            if let Some(reference) = report.requested {
                // The slot must have been idle before this request started.
                assert!(report.appended.is_some() || requested.is_empty());
                requested.push(reference.path().to_string());
            }
        }
        assert_eq!(requested, vec!["a_100x100", "b_100x100", "c_100x100"]);
        assert_eq!(*fetcher.log.lock(), requested);
        assert_eq!(session.stats().requested, 3);
        assert_eq!(session.strip().len(), 3);
    }

    #[test]
    fn test_failed_load_is_skipped_and_next_starts_immediately() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&["a_100x100", "broken_b", "c_100x100"], &surface);

        session.tick(&mut surface);
        session.tick(&mut surface);
        let report = session.tick(&mut surface);
        assert_eq!(report.failed, Some(image_ref("broken_b")));
        assert_eq!(report.requested, Some(image_ref("c_100x100")));

        run(&mut session, &mut surface, 2);
        let names: Vec<_> = session
            .strip()
            .items()
            .iter()
            .map(|i| i.handle().reference.path().to_string())
            .collect();
        assert_eq!(names, vec!["a_100x100", "c_100x100"]);
        assert_eq!(session.stats().failed, 1);
    }

    #[test]
    fn test_unresolvable_reference_counts_as_failure() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, fetcher) = session_with(&["unresolvable", "a_100x100"], &surface);
        run(&mut session, &mut surface, 4);

        assert_eq!(session.stats().failed, 1);
        assert_eq!(session.strip().len(), 1);
        assert_eq!(*fetcher.log.lock(), vec!["a_100x100".to_string()]);
    }

    /// Serves a blank 40x20 image for any http(s) address.
    #[derive(Default)]
    struct HttpFetcher {
        urls: parking_lot::Mutex<Vec<String>>,
    }

    impl crate::loader::ImageFetcher for HttpFetcher {
        fn fetch(&self, address: &crate::resolve::Address) -> anyhow::Result<image::RgbaImage> {
            match address {
                crate::resolve::Address::Url(url) if url.scheme().starts_with("http") => {
                    self.urls.lock().push(url.to_string());
                    Ok(image::RgbaImage::new(40, 20))
                }
                other => anyhow::bail!("not a web address: {}", other),
            }
        }
    }

    #[test]
    fn test_site_paths_load_through_a_web_fetcher() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let feed = SharedFeed::with_refs([
            ImageRef::new("/data/cache/postrainimgs/car/00001.jpg", "cpuvisor"),
            ImageRef::new("/tmp/elsewhere/2.jpg", "cpuvisor"),
            ImageRef::new("/srv/curatedtrainimgs/set/cat/3.jpg", "cpuvisor"),
        ]);
        let resolver = crate::resolve::SiteResolver::new("http://localhost:8000/visor").unwrap();
        let fetcher = Arc::new(HttpFetcher::default());
        let pipeline = LoadPipeline::new(Arc::new(resolver), fetcher.clone(), LoadMode::Inline);
        let mut session =
            ScrollerSession::mount(ScrollerConfig::default(), feed, pipeline, &surface).unwrap();
        run(&mut session, &mut surface, 8);

        assert_eq!(session.strip().len(), 2);
        assert_eq!(session.stats().failed, 1);
        assert_eq!(
            *fetcher.urls.lock(),
            vec![
                "http://localhost:8000/visor/postrainimgs/cpuvisor/car/00001.jpg".to_string(),
                "http://localhost:8000/visor/curatedtrainimgs/cpuvisor/set/cat/3.jpg".to_string(),
            ]
        );
        // 40x20 scaled to the 100px strip.
        assert_eq!(session.strip().get(0).unwrap().width(), 200.0);
    }

    #[test]
    fn test_feed_growth_is_picked_up() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, feed, _) = session_with(&[], &surface);
        run(&mut session, &mut surface, 3);
        assert!(session.strip().is_empty());

        feed.push(image_ref("late_100x100"));
        run(&mut session, &mut surface, 2);
        assert_eq!(session.strip().len(), 1);
        assert!(session.is_caught_up());
    }

    #[test]
    fn test_spinner_and_marquee_until_first_image() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&[], &surface);
        session.tick(&mut surface);

        let frame = surface.last_frame();
        assert!(matches!(frame[0], DrawCommand::Arc(_)));
        assert!(matches!(
            &frame[1],
            DrawCommand::Text { text, x, .. } if text == "... searching for images ..." && *x == 1.0
        ));
    }

    #[test]
    fn test_renders_items_with_status_label() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&["a_200x100"], &surface);
        run(&mut session, &mut surface, 500);

        let frame = surface.last_frame();
        assert_eq!(
            frame[0],
            DrawCommand::Image {
                reference: image_ref("a_200x100"),
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 100.0,
            }
        );
        assert!(matches!(
            &frame[1],
            DrawCommand::Text { text, .. } if text == "1 training images"
        ));
    }

    #[test]
    fn test_no_text_without_text_support() {
        let mut surface = RecordingSurface::new(800.0, 100.0).with_capabilities(Capabilities {
            text: false,
            ..Capabilities::FULL
        });
        let (mut session, _, _) = session_with(&["a_200x100"], &surface);
        run(&mut session, &mut surface, 50);
        assert!(surface
            .commands()
            .iter()
            .all(|c| !matches!(c, DrawCommand::Text { .. })));
    }

    #[test]
    fn test_drag_past_bound_springs_back() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&["a_200x100"], &surface);
        run(&mut session, &mut surface, 500);
        assert_eq!(session.scroll().offset(), 0.0);

        let disposition = session.handle_pointer_event(PointerEvent::Down { x: 400.0, y: 50.0 });
        assert!(disposition.suppress_default);
        session.handle_pointer_event(PointerEvent::Move { x: 350.0, y: 50.0 });
        session.tick(&mut surface);
        assert_eq!(session.scroll().offset(), 50.0);

        session.handle_pointer_event(PointerEvent::Up);
        let mut ticks = 0;
        while session.scroll().offset() != 0.0 {
            session.tick(&mut surface);
            assert!(session.scroll().offset() >= session.scroll().min_offset());
            ticks += 1;
            assert!(ticks < 1000, "offset never returned to 0");
        }
        assert_eq!(session.scroll().momentum(), 0.0);
    }

    #[test]
    fn test_rest_state_is_idempotent() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&["a_300x100", "b_300x100", "c_300x100"], &surface);
        run(&mut session, &mut surface, 2000);

        let before: Vec<f64> = session.strip().items().iter().map(|i| i.x()).collect();
        let offset = session.scroll().offset();
        run(&mut session, &mut surface, 50);
        let after: Vec<f64> = session.strip().items().iter().map(|i| i.x()).collect();
        assert_eq!(before, after);
        assert_eq!(session.scroll().offset(), offset);
    }

    #[test]
    fn test_min_offset_never_recovers() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let names = ["a_300x100", "b_500x100", "c_200x100", "d_900x100", "e_100x100"];
        let (mut session, _, _) = session_with(&names, &surface);

        let mut last = session.scroll().min_offset();
        for _ in 0..3000 {
            session.tick(&mut surface);
            session.strip().check_invariants().unwrap();
            assert!(session.scroll().min_offset() <= last);
            last = session.scroll().min_offset();
        }
        assert_eq!(session.strip().settled_count(), names.len());
    }

    #[test]
    fn test_teardown_freezes_session() {
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let (mut session, _, _) = session_with(&["a_200x100"], &surface);
        run(&mut session, &mut surface, 5);
        session.teardown();

        let frame = session.frame();
        let commands = surface.commands().len();
        session.tick(&mut surface);
        assert_eq!(session.frame(), frame);
        assert_eq!(surface.commands().len(), commands);
        assert_eq!(
            session.handle_pointer_event(PointerEvent::Down { x: 10.0, y: 10.0 }),
            EventDisposition::default()
        );
        assert!(session.is_torn_down());
    }
}
