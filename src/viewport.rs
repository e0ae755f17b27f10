//! Viewport size and pixel ratio.
//!
//! The viewport is measured in logical pixels; the drawing buffer the renderer
//! allocates is the logical size times the (clamped) pixel ratio.

use winit::dpi::PhysicalSize;

/// Upper bound applied to the device pixel ratio unless configured otherwise.
pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical size of the draw surface plus the pixel ratio used to render it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
    /// Drawing-buffer pixels per logical pixel, already clamped.
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Build a viewport, clamping `device_pixel_ratio` to [`DEFAULT_MAX_PIXEL_RATIO`].
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self::with_max_ratio(width, height, device_pixel_ratio, DEFAULT_MAX_PIXEL_RATIO)
    }

    pub fn with_max_ratio(width: f32, height: f32, device_pixel_ratio: f32, max_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio, max_ratio),
        }
    }

    /// Derive the viewport from a window's physical size and scale factor.
    pub fn from_window(size: PhysicalSize<u32>, scale_factor: f64, max_ratio: f32) -> Self {
        let logical = size.to_logical::<f32>(scale_factor);
        Self::with_max_ratio(logical.width, logical.height, scale_factor as f32, max_ratio)
    }

    /// Width over height, or 1 for a degenerate viewport.
    pub fn aspect(&self) -> f32 {
        if self.is_degenerate() {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// A minimized window reports a zero dimension; nothing can be drawn.
    pub fn is_degenerate(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }

    /// Size of the drawing buffer in physical pixels, never below 1×1.
    pub fn buffer_size(&self) -> (u32, u32) {
        buffer_size(self.width, self.height, self.pixel_ratio)
    }
}

/// `min(device_pixel_ratio, max_ratio)`, falling back to 1 for nonsense input.
pub fn clamp_pixel_ratio(device_pixel_ratio: f32, max_ratio: f32) -> f32 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(max_ratio)
    } else {
        1.0
    }
}

/// Drawing-buffer size for a logical size at a pixel ratio: `floor(size × ratio)`.
pub fn buffer_size(width: f32, height: f32, pixel_ratio: f32) -> (u32, u32) {
    let w = (width * pixel_ratio).floor() as u32;
    let h = (height * pixel_ratio).floor() as u32;
    (w.max(1), h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        for dpr in [0.5f32, 1.0, 1.25, 2.0, 2.5, 3.0, 4.0] {
            let v = Viewport::new(800.0, 600.0, dpr);
            assert_eq!(v.pixel_ratio, dpr.min(2.0));
        }
    }

    #[test]
    fn bogus_ratio_falls_back_to_one() {
        assert_eq!(clamp_pixel_ratio(0.0, 2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f32::NAN, 2.0), 1.0);
    }

    #[test]
    fn from_window_uses_logical_size() {
        let v = Viewport::from_window(PhysicalSize::new(3200, 1800), 2.0, 2.0);
        assert_eq!((v.width, v.height), (1600.0, 900.0));
        assert_eq!(v.pixel_ratio, 2.0);
        assert_eq!(v.buffer_size(), (3200, 1800));
    }

    #[test]
    fn high_density_display_renders_at_capped_ratio() {
        let v = Viewport::from_window(PhysicalSize::new(3000, 1500), 3.0, 2.0);
        assert_eq!((v.width, v.height), (1000.0, 500.0));
        assert_eq!(v.buffer_size(), (2000, 1000));
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Viewport::new(0.0, 600.0, 1.0).is_degenerate());
        assert!(!Viewport::new(1.0, 1.0, 1.0).is_degenerate());
        assert_eq!(buffer_size(0.0, 0.0, 2.0), (1, 1));
        assert_eq!(Viewport::new(0.0, 0.0, 1.0).aspect(), 1.0);
    }

    #[test]
    fn odd_window_keeps_every_physical_pixel() {
        let v = Viewport::from_window(PhysicalSize::new(1001, 601), 2.0, 2.0);
        assert_eq!((v.width, v.height), (500.5, 300.5));
        assert_eq!(v.buffer_size(), (1001, 601));
    }

    #[test]
    fn fractional_logical_size_floors_after_scaling() {
        let v = Viewport::new(333.4, 200.6, 1.5);
        assert_eq!(v.buffer_size(), (500, 300));
    }
}
