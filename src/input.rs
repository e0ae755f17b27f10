use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixels per wheel "line" when a touchpad reports pixel deltas.
const PIXELS_PER_LINE: f32 = 120.0;

/// Pointer state accumulated between two ticks.
///
/// Positions and deltas are in logical pixels, matching [`Viewport`](crate::Viewport).
#[derive(Debug)]
pub struct Input {
    buttons_down: HashSet<MouseButton>,
    pointer_position: Option<Vec2>,
    pointer_delta: Vec2,
    scroll_delta: Vec2,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            buttons_down: HashSet::new(),
            pointer_position: None,
            pointer_delta: Vec2::ZERO,
            scroll_delta: Vec2::ZERO,
        }
    }
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call after each tick to drop the per-tick deltas.
    pub fn begin_frame(&mut self) {
        self.pointer_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Process a window event. `scale_factor` converts physical to logical pixels.
    pub fn handle_event(&mut self, event: &WindowEvent, scale_factor: f64) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale_factor);
                self.pointer_moved(Vec2::new(logical.x, logical.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer_position = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / PIXELS_PER_LINE
                    }
                };
                self.scroll(d);
            }
            WindowEvent::Focused(false) => {
                // Releases that happen outside the window never arrive.
                self.buttons_down.clear();
            }
            _ => {}
        }
    }

    /// Record a pointer move to `position` (logical pixels).
    pub fn pointer_moved(&mut self, position: Vec2) {
        if let Some(previous) = self.pointer_position {
            self.pointer_delta += position - previous;
        }
        self.pointer_position = Some(position);
    }

    /// Record wheel movement in lines; positive y scrolls away from the user.
    pub fn scroll(&mut self, lines: Vec2) {
        self.scroll_delta += lines;
    }

    pub fn press(&mut self, button: MouseButton) {
        self.buttons_down.insert(button);
    }

    pub fn release(&mut self, button: MouseButton) {
        self.buttons_down.remove(&button);
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Pointer movement since the last tick.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    /// Scroll wheel delta since the last tick (in lines).
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_only_anchors() {
        let mut input = Input::new();
        input.pointer_moved(Vec2::new(100.0, 100.0));
        assert_eq!(input.pointer_delta(), Vec2::ZERO);

        input.pointer_moved(Vec2::new(110.0, 95.0));
        input.pointer_moved(Vec2::new(120.0, 90.0));
        assert_eq!(input.pointer_delta(), Vec2::new(20.0, -10.0));
    }

    #[test]
    fn begin_frame_clears_deltas_but_not_buttons() {
        let mut input = Input::new();
        input.press(MouseButton::Left);
        input.pointer_moved(Vec2::ZERO);
        input.pointer_moved(Vec2::new(5.0, 5.0));
        input.scroll(Vec2::new(0.0, 1.0));

        input.begin_frame();

        assert_eq!(input.pointer_delta(), Vec2::ZERO);
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
        assert!(input.mouse_down(MouseButton::Left));
    }
}
