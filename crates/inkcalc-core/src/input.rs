//! Pointer input routing and draw/erase mode state.

use crate::color::InkColor;
use crate::surface::Surface;
use kurbo::Point;

/// Where a pointer coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerSource {
    /// Mouse events already carry canvas-local offsets.
    Mouse { offset: Point },
    /// Touch events carry viewport-absolute coordinates.
    Touch { client: Point },
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(PointerSource),
    Move(PointerSource),
    Up,
    Leave,
}

/// Interaction mode. Erasing never carries an active ink color; the color to
/// return to is only remembered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawMode {
    Draw(InkColor),
    Erase { resume: InkColor },
}

impl DrawMode {
    /// Check if the eraser is active.
    pub fn is_erasing(&self) -> bool {
        matches!(self, Self::Erase { .. })
    }

    /// The palette color: the ink color when drawing, the remembered one when
    /// erasing.
    pub fn color(&self) -> InkColor {
        match *self {
            Self::Draw(color) | Self::Erase { resume: color } => color,
        }
    }
}

impl Default for DrawMode {
    fn default() -> Self {
        Self::Draw(InkColor::WHITE)
    }
}

/// Current drawing state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawState {
    pub mode: DrawMode,
    /// Whether a pointer is down and drawing.
    pub is_active: bool,
}

/// Translates pointer input into surface strokes.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    state: DrawState,
    /// On-screen origin of the canvas, used to localize touch coordinates.
    canvas_origin: Point,
}

impl InputRouter {
    /// Create a new router in draw mode with the default ink color.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn mode(&self) -> DrawMode {
        self.state.mode
    }

    /// The palette color (see [`DrawMode::color`]).
    pub fn active_color(&self) -> InkColor {
        self.state.mode.color()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Set the on-screen origin of the canvas bounding rectangle.
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.canvas_origin = origin;
    }

    /// Convert a pointer coordinate into canvas-local space.
    pub fn canvas_position(&self, source: PointerSource) -> Point {
        match source {
            PointerSource::Mouse { offset } => offset,
            PointerSource::Touch { client } => Point::new(
                client.x - self.canvas_origin.x,
                client.y - self.canvas_origin.y,
            ),
        }
    }

    /// Select an ink color. Always leaves erase mode.
    pub fn set_color(&mut self, color: impl Into<InkColor>) {
        self.state.mode = DrawMode::Draw(color.into());
    }

    /// Flip between drawing and erasing, keeping the selected color.
    pub fn toggle_eraser(&mut self) {
        self.state.mode = match self.state.mode {
            DrawMode::Draw(color) => DrawMode::Erase { resume: color },
            DrawMode::Erase { resume } => DrawMode::Draw(resume),
        };
    }

    /// Process a pointer event.
    /// Returns true if the host should suppress the platform default action.
    pub fn handle_pointer_event(&mut self, event: PointerEvent, surface: &mut Surface) -> bool {
        match event {
            PointerEvent::Down(source) => self.on_pointer_down(source, surface),
            PointerEvent::Move(source) => self.on_pointer_move(source, surface),
            PointerEvent::Up => {
                self.on_pointer_up(surface);
                false
            }
            PointerEvent::Leave => {
                self.on_pointer_leave(surface);
                false
            }
        }
    }

    pub fn on_pointer_down(&mut self, source: PointerSource, surface: &mut Surface) -> bool {
        let position = self.canvas_position(source);
        surface.begin_stroke(position);
        self.state.is_active = true;
        true
    }

    pub fn on_pointer_move(&mut self, source: PointerSource, surface: &mut Surface) -> bool {
        if !self.state.is_active {
            return false;
        }
        let position = self.canvas_position(source);
        surface.extend_stroke(position, &self.state.mode);
        true
    }

    pub fn on_pointer_up(&mut self, surface: &mut Surface) {
        surface.end_stroke();
        self.state.is_active = false;
    }

    /// Leaving the canvas closes the stroke the same way releasing does.
    pub fn on_pointer_leave(&mut self, surface: &mut Surface) {
        self.on_pointer_up(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(x: f64, y: f64) -> PointerSource {
        PointerSource::Mouse {
            offset: Point::new(x, y),
        }
    }

    #[test]
    fn test_mode_switching() {
        let red = InkColor::rgb(255, 0, 0);
        let blue = InkColor::rgb(0, 0, 255);
        let mut input = InputRouter::new();

        input.set_color(red);
        input.toggle_eraser();
        assert!(input.mode().is_erasing());
        assert_eq!(input.active_color(), red);

        input.set_color(blue);
        assert_eq!(input.mode(), DrawMode::Draw(blue));
    }

    #[test]
    fn test_toggle_resumes_color() {
        let green = InkColor::rgb(0, 255, 0);
        let mut input = InputRouter::new();
        input.set_color(green);

        input.toggle_eraser();
        input.toggle_eraser();
        assert_eq!(input.mode(), DrawMode::Draw(green));
    }

    #[test]
    fn test_touch_is_localized() {
        let mut input = InputRouter::new();
        input.set_canvas_origin(Point::new(10.0, 40.0));

        let touch = PointerSource::Touch {
            client: Point::new(110.0, 140.0),
        };
        assert_eq!(input.canvas_position(touch), Point::new(100.0, 100.0));
        assert_eq!(input.canvas_position(mouse(5.0, 6.0)), Point::new(5.0, 6.0));
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut surface = Surface::new(50, 50).unwrap();
        let mut input = InputRouter::new();

        assert!(!input.handle_pointer_event(PointerEvent::Move(mouse(10.0, 10.0)), &mut surface));
        assert!(!input.is_active());
    }

    #[test]
    fn test_leave_closes_stroke() {
        let mut surface = Surface::new(50, 50).unwrap();
        let mut input = InputRouter::new();

        assert!(input.handle_pointer_event(PointerEvent::Down(mouse(5.0, 5.0)), &mut surface));
        assert!(input.handle_pointer_event(PointerEvent::Move(mouse(20.0, 5.0)), &mut surface));
        input.handle_pointer_event(PointerEvent::Leave, &mut surface);

        assert!(!input.is_active());
        assert!(!surface.is_stroke_open());

        // Next stroke starts fresh instead of connecting to the old one.
        input.handle_pointer_event(PointerEvent::Down(mouse(5.0, 40.0)), &mut surface);
        assert!(surface.is_stroke_open());
        input.handle_pointer_event(PointerEvent::Up, &mut surface);
        assert_eq!(surface.snapshot_pixels().alpha(10, 25), Some(0));
    }
}
