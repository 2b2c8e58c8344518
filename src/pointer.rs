//! Turning pointer drags on a window into listener positions.
//!
//! Windowing itself is up to the application; these helpers only hold the mapping
//! from pixels to world units and the state of a drag.

use crate::geometry::Vec2;

/// World units covered by one pixel in the default mapping.
pub const DEFAULT_UNITS_PER_PIXEL: f32 = 6.0 / 350.0;

/// Maps window pixels to the listening plane: origin at the window centre, y up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenMapping {
    pub width: u32,
    pub height: u32,
    pub units_per_pixel: f32,
}

impl ScreenMapping {
    pub fn new(width: u32, height: u32) -> Self {
        ScreenMapping {
            width,
            height,
            units_per_pixel: DEFAULT_UNITS_PER_PIXEL,
        }
    }

    pub fn with_units_per_pixel(self, units_per_pixel: f32) -> Self {
        ScreenMapping {
            units_per_pixel,
            ..self
        }
    }

    pub fn to_world(&self, x: i32, y: i32) -> Vec2 {
        let cx = (self.width / 2) as i32;
        let cy = (self.height / 2) as i32;
        Vec2::new((x - cx) as f32, -(y - cy) as f32) * self.units_per_pixel
    }

    pub fn to_screen(&self, p: Vec2) -> (i32, i32) {
        let cx = (self.width / 2) as f32;
        let cy = (self.height / 2) as f32;
        let px = p / self.units_per_pixel;
        ((cx + px.x).round() as i32, (cy - px.y).round() as i32)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Tracks a drag with one button held down.
#[derive(Copy, Clone, Debug)]
pub struct DragTracker {
    mapping: ScreenMapping,
    button: PointerButton,
    dragging: bool,
}

impl DragTracker {
    /// Drag with the right button, as the listener is moved in the demo scene.
    pub fn new(mapping: ScreenMapping) -> Self {
        DragTracker {
            mapping,
            button: PointerButton::Right,
            dragging: false,
        }
    }

    pub fn with_button(self, button: PointerButton) -> Self {
        DragTracker { button, ..self }
    }

    pub fn mapping(&self) -> &ScreenMapping {
        &self.mapping
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.mapping.width = width;
        self.mapping.height = height;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pressed(&mut self, button: PointerButton) {
        if button == self.button {
            self.dragging = true;
        }
    }

    pub fn released(&mut self, button: PointerButton) {
        if button == self.button {
            self.dragging = false;
        }
    }

    /// World position to move to, if a drag is in progress.
    pub fn moved(&self, x: i32, y: i32) -> Option<Vec2> {
        if self.dragging {
            Some(self.mapping.to_world(x, y))
        } else {
            None
        }
    }
}
