//! Sampling sweeps over the variable `x`.
//!
//! A `Sweep` describes the half-open range `[start, end)` walked with a fixed
//! step. Sample positions are computed from their index (`start + i * step`)
//! rather than by repeatedly adding the step, so long sweeps do not drift.
//!
//! A `Viewport` describes the drawing surface an external renderer plots on.
//! It derives the sweep covering the surface's width and maps `(x, y)` points
//! to surface coordinates with the origin at the center.

use crate::errors::SweepError;

/// Upper bound on the number of positions in one sweep.
pub const MAX_SAMPLES: usize = 100_000_000;

/// A range of `x` values sampled at a fixed step.
///
/// # Example
/// ```
/// use plot_expr::Sweep;
///
/// let sweep = Sweep::new(-1.0, 1.0, 0.5).unwrap();
/// assert_eq!(sweep.iter().collect::<Vec<_>>(), vec![-1.0, -0.5, 0.0, 0.5]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sweep {
    start: f64,
    end: f64,
    step: f64,
    len: usize,
}

impl Sweep {
    /// Creates a sweep from `start` (inclusive) to `end` (exclusive).
    ///
    /// # Errors
    /// Returns `SweepError` if:
    /// - `step` is not a positive finite number
    /// - `start` or `end` is not finite, or `end` lies before `start`
    /// - `step` is too small to change `start`
    /// - the range holds more than `MAX_SAMPLES` positions
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, SweepError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(SweepError::InvalidStep(step));
        }
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(SweepError::InvalidRange { start, end });
        }
        if start + step == start {
            return Err(SweepError::StepBelowResolution { start, step });
        }

        let estimate = ((end - start) / step).ceil();
        if !estimate.is_finite() || estimate > MAX_SAMPLES as f64 {
            return Err(SweepError::TooManySamples {
                start,
                end,
                step,
                max: MAX_SAMPLES,
            });
        }

        // The estimate can be off by one either way after rounding; settle on
        // the count of indices whose position stays strictly below `end`.
        let mut len = estimate as usize;
        while len > 0 && start + (len - 1) as f64 * step >= end {
            len -= 1;
        }
        while start + len as f64 * step < end {
            len += 1;
        }

        Ok(Self {
            start,
            end,
            step,
            len,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of the `index`-th sample.
    #[inline]
    pub fn x_at(&self, index: usize) -> f64 {
        self.start + index as f64 * self.step
    }

    /// Iterates over the sample positions in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(move |i| self.x_at(i))
    }

    /// All sample positions collected into a vector.
    pub fn positions(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

/// A drawing surface measured in pixels, with `scale` pixels per unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            scale: 20.0,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Half of the visible width, in units of `x`.
    pub fn half_width(&self) -> f64 {
        (f64::from(self.width) / 2.0) / self.scale
    }

    /// The sweep covering the whole width at a resolution of a hundred samples per pixel.
    ///
    /// # Errors
    /// Returns `SweepError::InvalidScale` if the scale is not a positive finite number.
    pub fn sweep(&self) -> Result<Sweep, SweepError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SweepError::InvalidScale(self.scale));
        }
        let half = self.half_width();
        Sweep::new(-half, half, 0.01 / self.scale)
    }

    /// Maps a point to surface coordinates, `y` growing downwards.
    ///
    /// The result may lie outside the surface or be non-finite; renderers are
    /// expected to skip such points.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            f64::from(self.width) / 2.0 + self.scale * x,
            f64::from(self.height) / 2.0 - self.scale * y,
        )
    }

    /// Returns true if the point lands on the surface.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (px, py) = self.to_pixel(x, y);
        (0.0..f64::from(self.width)).contains(&px) && (0.0..f64::from(self.height)).contains(&py)
    }
}
