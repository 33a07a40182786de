//! Waiting spinner and status text.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::config::{ScrollerConfig, SpinnerConfig};
use crate::surface::{ArcStroke, Surface, TextStyle};

/// Top margin of the status line.
const STATUS_Y: f64 = 3.0;

/// Right margin of the image-count label.
const STATUS_RIGHT_MARGIN: f64 = 5.0;

const SPINNER_START_PERCENT: f64 = 1.0;

/// Arc that sweeps clockwise from twelve o'clock, restarting after a full
/// turn.
#[derive(Debug, Clone)]
pub struct Spinner {
    config: SpinnerConfig,
    percent: f64,
}

impl Spinner {
    pub fn new(config: SpinnerConfig) -> Self {
        Self {
            config,
            percent: SPINNER_START_PERCENT,
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Draws the current arc centred on the surface and advances one step.
    ///
    /// When the sweep passes the end the surface is left cleared for this
    /// frame and the arc starts over.
    pub fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.percent > self.config.end_percent {
            self.percent = SPINNER_START_PERCENT;
            return;
        }
        let (width, height) = surface.size();
        surface.stroke_arc(&self.arc(width / 2.0, height / 2.0));
        self.percent += self.config.step_percent;
    }

    pub fn arc(&self, cx: f64, cy: f64) -> ArcStroke {
        let progress = self.percent / 100.0;
        ArcStroke {
            cx,
            cy,
            radius: self.config.radius,
            start: -FRAC_PI_2,
            end: 2.0 * PI * progress - FRAC_PI_2,
            line_width: self.config.line_width,
            color: self.config.color,
        }
    }
}

/// Marquee shown while searching and the image-count label shown after.
#[derive(Debug, Clone)]
pub struct StatusLine {
    searching_text: String,
    marquee_style: TextStyle,
    label_style: TextStyle,
    marquee_x: f64,
}

impl StatusLine {
    pub fn new(config: &ScrollerConfig) -> Self {
        Self {
            searching_text: config.searching_text.clone(),
            marquee_style: config.marquee_style.clone(),
            label_style: config.status_style.clone(),
            marquee_x: 0.0,
        }
    }

    pub fn marquee_x(&self) -> f64 {
        self.marquee_x
    }

    /// Scrolls the marquee one pixel right, wrapping past the right edge.
    pub fn advance_marquee(&mut self, surface_width: f64) {
        self.marquee_x += 1.0;
        if self.marquee_x > surface_width {
            self.marquee_x = -(self.searching_text.chars().count() as f64);
        }
    }

    pub fn draw_marquee<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.fill_text(&self.searching_text, self.marquee_x, STATUS_Y, &self.marquee_style);
    }

    /// Right-aligned count of images on the strip.
    pub fn draw_label<S: Surface + ?Sized>(&self, surface: &mut S, loaded: usize, negatives: usize) {
        let text = status_label(loaded, negatives);
        let (width, _) = surface.size();
        let x = width - surface.measure_text(&text, &self.label_style) - STATUS_RIGHT_MARGIN;
        surface.fill_text(&text, x, STATUS_Y, &self.label_style);
    }
}

pub fn status_label(loaded: usize, negatives: usize) -> String {
    let mut label = format!("{} training images", loaded);
    if negatives > 0 {
        label.push_str(&format!(" (+ {} negative training images)", negatives));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    #[test]
    fn test_spinner_sweeps_from_twelve_oclock() {
        let spinner = Spinner::new(SpinnerConfig::default());
        let arc = spinner.arc(0.0, 0.0);
        assert_eq!(arc.start, -FRAC_PI_2);
        assert!((arc.end - (2.0 * PI * 0.01 - FRAC_PI_2)).abs() < 1e-12);
        assert_eq!(arc.radius, 28.0);
        assert_eq!(arc.line_width, 10.0);
    }

    #[test]
    fn test_spinner_restarts_after_full_turn() {
        let mut spinner = Spinner::new(SpinnerConfig::default());
        let mut surface = RecordingSurface::new(400.0, 100.0);

        for _ in 0..101 {
            spinner.draw(&mut surface);
        }
        assert_eq!(surface.commands().len(), 101);
        match surface.commands().last() {
            Some(DrawCommand::Arc(arc)) => {
                assert_eq!((arc.cx, arc.cy), (200.0, 50.0));
                assert!((arc.end - (2.0 * PI * 1.01 - FRAC_PI_2)).abs() < 1e-9);
            }
            other => panic!("expected arc, got {:?}", other),
        }

        spinner.draw(&mut surface);
        assert_eq!(surface.commands().len(), 101);
        assert_eq!(spinner.percent(), 1.0);
    }

    #[test]
    fn test_marquee_wraps_past_right_edge() {
        let mut status = StatusLine::new(&ScrollerConfig::default());
        for _ in 0..10 {
            status.advance_marquee(10.0);
        }
        assert_eq!(status.marquee_x(), 10.0);
        status.advance_marquee(10.0);
        assert_eq!(status.marquee_x(), -28.0);
    }

    #[test]
    fn test_label_mentions_negatives_only_when_present() {
        assert_eq!(status_label(3, 0), "3 training images");
        assert_eq!(
            status_label(12, 40),
            "12 training images (+ 40 negative training images)"
        );
    }

    #[test]
    fn test_label_is_right_aligned() {
        let status = StatusLine::new(&ScrollerConfig::default());
        let mut surface = RecordingSurface::new(800.0, 100.0);
        status.draw_label(&mut surface, 1, 0);

        let style = ScrollerConfig::default().status_style;
        let expected = 800.0 - surface.measure_text("1 training images", &style) - 5.0;
        assert_eq!(
            surface.commands(),
            &[DrawCommand::Text {
                text: "1 training images".to_string(),
                x: expected,
                y: 3.0,
            }]
        );
    }
}
