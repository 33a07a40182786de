// Scroller window: a fixed-size picture fed from a software surface, with
// the status line as a label overlay. Pointer input is forwarded to the
// session and the frame loop runs on a glib timeout.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use gdk4::{MemoryFormat, MemoryTexture, Texture};
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, EventControllerMotion, EventSequenceState,
    GestureDrag, Label, Overlay, Picture,
};
use tracing::debug;

use imscroll::feed::DirectoryFeed;
use imscroll::surface::{ArcStroke, Capabilities, RasterSurface, Surface, TextStyle};
use imscroll::{DrawableHandle, PointerEvent, ScrollerConfig, ScrollerSession};

use crate::cli::RunArgs;

const STATUS_MARGIN: i32 = 5;

/// Raster canvas plus the last status text drawn onto it.
struct WindowSurface {
    raster: RasterSurface,
    status: Option<String>,
}

impl WindowSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RasterSurface::new(width, height),
            status: None,
        }
    }

    fn texture(&self) -> Option<Texture> {
        let canvas = self.raster.canvas();
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let bytes = glib::Bytes::from(canvas.as_raw().as_slice());
        let texture = MemoryTexture::new(
            width as i32,
            height as i32,
            MemoryFormat::R8g8b8a8,
            &bytes,
            (width * 4) as usize,
        );
        Some(texture.upcast())
    }
}

impl Surface for WindowSurface {
    fn size(&self) -> (f64, f64) {
        self.raster.size()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    fn clear(&mut self) {
        self.raster.clear();
        self.status = None;
    }

    fn draw_image(&mut self, handle: &DrawableHandle, x: f64, y: f64, width: f64, height: f64) {
        self.raster.draw_image(handle, x, y, width, height);
    }

    fn stroke_arc(&mut self, arc: &ArcStroke) {
        self.raster.stroke_arc(arc);
    }

    // The label overlay takes care of placement.
    fn fill_text(&mut self, text: &str, _x: f64, _y: f64, _style: &TextStyle) {
        self.status = Some(text.to_string());
    }
}

struct WindowState {
    session: ScrollerSession<DirectoryFeed>,
    surface: WindowSurface,
}

type SharedState = Rc<RefCell<WindowState>>;

pub(super) fn present(app: &Application, args: &RunArgs) -> Result<()> {
    let (feed, pipeline) = crate::open_feed(args)?;
    let surface = WindowSurface::new(args.width, args.height);
    let config = ScrollerConfig::default().with_fps(args.fps);
    let session = ScrollerSession::mount(config, feed, pipeline, &surface)
        .context("Failed to mount scroller in window")?;
    let interval = session.config().frame_interval();
    let state: SharedState = Rc::new(RefCell::new(WindowState { session, surface }));

    let picture = Picture::new();
    picture.set_size_request(args.width as i32, args.height as i32);
    picture.set_can_shrink(false);

    let label = Label::new(None);
    label.set_halign(Align::End);
    label.set_valign(Align::Start);
    label.set_margin_end(STATUS_MARGIN);
    label.set_margin_top(3);

    let overlay = Overlay::new();
    overlay.set_child(Some(&picture));
    overlay.add_overlay(&label);
    setup_input(&overlay, &state);

    let window = ApplicationWindow::builder()
        .application(app)
        .title("imscroll")
        .resizable(false)
        .child(&overlay)
        .build();

    let tick_state = Rc::clone(&state);
    let picture_weak = picture.downgrade();
    let label_weak = label.downgrade();
    glib::timeout_add_local(interval, move || {
        let (Some(picture), Some(label)) = (picture_weak.upgrade(), label_weak.upgrade()) else {
            return glib::ControlFlow::Break;
        };
        let mut state = tick_state.borrow_mut();
        if state.session.is_torn_down() {
            return glib::ControlFlow::Break;
        }
        let WindowState { session, surface } = &mut *state;
        session.tick(surface);
        if let Some(texture) = surface.texture() {
            picture.set_paintable(Some(&texture));
        }
        label.set_text(surface.status.as_deref().unwrap_or(""));
        glib::ControlFlow::Continue
    });

    window.connect_close_request(move |_| {
        state.borrow_mut().session.teardown();
        glib::Propagation::Proceed
    });

    debug!(interval_ms = interval.as_millis() as u64, "Window frame loop scheduled");
    window.present();
    Ok(())
}

fn forward(state: &SharedState, event: PointerEvent) -> bool {
    state
        .borrow_mut()
        .session
        .handle_pointer_event(event)
        .suppress_default
}

fn setup_input(overlay: &Overlay, state: &SharedState) {
    let motion = EventControllerMotion::new();
    let s = Rc::clone(state);
    motion.connect_motion(move |_, x, y| {
        forward(&s, PointerEvent::Move { x, y });
    });
    let s = Rc::clone(state);
    motion.connect_enter(move |_, x, y| {
        forward(&s, PointerEvent::Enter { x, y });
    });
    let s = Rc::clone(state);
    motion.connect_leave(move |_| {
        forward(&s, PointerEvent::Leave);
    });
    overlay.add_controller(motion);

    // Left button only; claiming the sequence keeps other handlers from
    // starting a selection or DnD while the strip is being dragged.
    let drag = GestureDrag::new();
    drag.set_button(1);
    let s = Rc::clone(state);
    drag.connect_drag_begin(move |gesture, x, y| {
        if forward(&s, PointerEvent::Down { x, y }) {
            gesture.set_state(EventSequenceState::Claimed);
        }
    });
    let s = Rc::clone(state);
    drag.connect_drag_update(move |gesture, offset_x, offset_y| {
        if let Some((x, y)) = gesture.start_point() {
            forward(
                &s,
                PointerEvent::Move {
                    x: x + offset_x,
                    y: y + offset_y,
                },
            );
        }
    });
    let s = Rc::clone(state);
    drag.connect_drag_end(move |_, _, _| {
        forward(&s, PointerEvent::Up);
    });
    overlay.add_controller(drag);
}
