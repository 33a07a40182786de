use super::{ArcStroke, Capabilities, Surface, TextStyle};
use crate::models::{DrawableHandle, ImageRef};

/// A draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Image {
        reference: ImageRef,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Arc(ArcStroke),
    Text {
        text: String,
        x: f64,
        y: f64,
    },
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Debug)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    capabilities: Capabilities,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            capabilities: Capabilities::FULL,
            commands: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands issued since the last clear.
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear))
            .map_or(0, |i| i + 1);
        &self.commands[start..]
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_image(&mut self, handle: &DrawableHandle, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::Image {
            reference: handle.reference.clone(),
            x,
            y,
            width,
            height,
        });
    }

    fn stroke_arc(&mut self, arc: &ArcStroke) {
        self.commands.push(DrawCommand::Arc(*arc));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, _style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
        });
    }
}
