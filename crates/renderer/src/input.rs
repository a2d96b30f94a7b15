use winit::dpi::PhysicalSize;
use winit::event::{MouseButton, TouchPhase};

/// Pointer position in drawable pixels (y measured from the top) plus the
/// activity value exposed to shaders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    /// Pressed-button mask for mice, 1 for an active touch, 0 when idle.
    pub activity: u32,
}

impl PointerState {
    /// `(x, y, activity)` with y flipped to a bottom-left origin.
    pub fn as_uniform(&self, drawable_height: f32) -> [f32; 3] {
        [self.x, drawable_height - self.y, self.activity as f32]
    }
}

/// Relation between the coordinate space events arrive in and the drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Size of the surface in event coordinates.
    pub display: (f64, f64),
    pub drawable: PhysicalSize<u32>,
}

impl SurfaceGeometry {
    /// Event and drawable coordinates coincide.
    pub fn identity(drawable: PhysicalSize<u32>) -> Self {
        Self {
            display: (f64::from(drawable.width), f64::from(drawable.height)),
            drawable,
        }
    }

    fn to_drawable(self, position: (f64, f64)) -> (f32, f32) {
        let (display_w, display_h) = self.display;
        let scale_x = if display_w > 0.0 {
            f64::from(self.drawable.width) / display_w
        } else {
            1.0
        };
        let scale_y = if display_h > 0.0 {
            f64::from(self.drawable.height) / display_h
        } else {
            1.0
        };
        ((position.0 * scale_x) as f32, (position.1 * scale_y) as f32)
    }
}

/// DOM-style bit for a mouse button.
fn button_bit(button: MouseButton) -> u32 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Right => 2,
        MouseButton::Middle => 4,
        MouseButton::Back => 8,
        MouseButton::Forward => 16,
        MouseButton::Other(_) => 0,
    }
}

/// Owns the pointer state; last event wins.
#[derive(Debug, Clone)]
pub struct InteractionTracker {
    state: PointerState,
    buttons: u32,
    geometry: SurfaceGeometry,
}

impl InteractionTracker {
    pub fn new(geometry: SurfaceGeometry) -> Self {
        Self {
            state: PointerState::default(),
            buttons: 0,
            geometry,
        }
    }

    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    pub fn pointer_moved(&mut self, position: (f64, f64)) {
        self.move_to(position);
        self.state.activity = self.buttons;
    }

    pub fn button_pressed(&mut self, button: MouseButton) {
        self.buttons |= button_bit(button);
        self.state.activity = self.buttons;
    }

    /// Position is left untouched.
    pub fn button_released(&mut self, button: MouseButton) {
        self.buttons &= !button_bit(button);
        self.state.activity = 0;
    }

    pub fn touch(&mut self, phase: TouchPhase, position: (f64, f64)) {
        match phase {
            TouchPhase::Started | TouchPhase::Moved => {
                self.move_to(position);
                self.state.activity = 1;
            }
            TouchPhase::Ended | TouchPhase::Cancelled => self.cancel(),
        }
    }

    /// Pointer left the surface or the gesture was aborted.
    pub fn cancel(&mut self) {
        self.buttons = 0;
        self.state.activity = 0;
    }

    pub fn snapshot(&self) -> PointerState {
        self.state
    }

    fn move_to(&mut self, position: (f64, f64)) {
        let (x, y) = self.geometry.to_drawable(position);
        self.state.x = x;
        self.state.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> InteractionTracker {
        InteractionTracker::new(SurfaceGeometry::identity(PhysicalSize::new(100, 50)))
    }

    #[test]
    fn press_and_release_toggle_activity() {
        let mut tracker = tracker();
        tracker.pointer_moved((10.0, 20.0));
        assert_eq!(tracker.snapshot().activity, 0);

        tracker.button_pressed(MouseButton::Left);
        assert_eq!(tracker.snapshot().activity, 1);

        tracker.button_released(MouseButton::Left);
        let state = tracker.snapshot();
        assert_eq!(state.activity, 0);
        assert_eq!((state.x, state.y), (10.0, 20.0));
    }

    #[test]
    fn activity_reports_button_mask_while_dragging() {
        let mut tracker = tracker();
        tracker.button_pressed(MouseButton::Left);
        tracker.button_pressed(MouseButton::Right);
        tracker.pointer_moved((5.0, 5.0));
        assert_eq!(tracker.snapshot().activity, 3);
    }

    #[test]
    fn touch_sets_unit_activity_and_cancel_clears_it() {
        let mut tracker = tracker();
        tracker.touch(TouchPhase::Started, (30.0, 40.0));
        assert_eq!(
            tracker.snapshot(),
            PointerState {
                x: 30.0,
                y: 40.0,
                activity: 1
            }
        );
        tracker.touch(TouchPhase::Cancelled, (0.0, 0.0));
        let state = tracker.snapshot();
        assert_eq!(state.activity, 0);
        assert_eq!((state.x, state.y), (30.0, 40.0));
    }

    #[test]
    fn positions_scale_from_display_to_drawable() {
        let mut tracker = InteractionTracker::new(SurfaceGeometry {
            display: (100.0, 50.0),
            drawable: PhysicalSize::new(200, 100),
        });
        tracker.pointer_moved((25.0, 10.0));
        let state = tracker.snapshot();
        assert_eq!((state.x, state.y), (50.0, 20.0));
        assert_eq!(state.as_uniform(100.0), [50.0, 80.0, 0.0]);
    }
}
