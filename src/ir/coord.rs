//! Points tagged with their coordinate space.

use std::marker::PhantomData;

use super::space::Pixel;

/// A 2D point with a type-level marker for the coordinate space.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Coord<Pixel> {
    /// Clamps the point into the `[0, width] x [0, height]` image rectangle.
    ///
    /// Window systems keep reporting the cursor while a drag leaves the
    /// image, so pointer positions are clamped before they reach a box.
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        Self::new(
            self.x.clamp(0.0, width as f64),
            self.y.clamp(0.0, height as f64),
        )
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
