//! Brightness/contrast windowing.
//!
//! A [`Window`] maps the intensity range `[vmin, vmax]` linearly onto black to
//! white. Values outside the range are clipped to the nearest bound. The
//! bounds are never swapped: moving one bound past the other is resolved by
//! the window's [`ClampPolicy`], so `vmin <= vmax` holds at all times.

use image::{GrayImage, ImageBuffer};
use ndarray::ArrayView2;
use rayon::prelude::*;

/// How a bound moved past the other bound is resolved
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ClampPolicy {
    /// The moved bound stops at the other bound
    #[default]
    ClampMoved,
    /// The moved bound keeps its value and drags the other bound along
    PushOther,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    vmin: f32,
    vmax: f32,
    policy: ClampPolicy,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            vmin: 0.0,
            vmax: 4096.0,
            policy: ClampPolicy::default(),
        }
    }
}

impl Window {
    /// A window over `[vmin, vmax]`. A `vmin` above `vmax` is clamped down to
    /// `vmax`.
    pub fn new(vmin: f32, vmax: f32) -> Self {
        Self {
            vmin: vmin.min(vmax),
            vmax,
            policy: ClampPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ClampPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn vmin(&self) -> f32 {
        self.vmin
    }

    pub fn vmax(&self) -> f32 {
        self.vmax
    }

    pub fn set_vmin(&mut self, vmin: f32) {
        if vmin <= self.vmax {
            self.vmin = vmin;
            return;
        }
        match self.policy {
            ClampPolicy::ClampMoved => self.vmin = self.vmax,
            ClampPolicy::PushOther => {
                self.vmin = vmin;
                self.vmax = vmin;
            }
        }
    }

    pub fn set_vmax(&mut self, vmax: f32) {
        if vmax >= self.vmin {
            self.vmax = vmax;
            return;
        }
        match self.policy {
            ClampPolicy::ClampMoved => self.vmax = self.vmin,
            ClampPolicy::PushOther => {
                self.vmax = vmax;
                self.vmin = vmax;
            }
        }
    }

    /// Display intensity of a single value
    #[inline]
    pub fn map(&self, value: f32) -> u8 {
        let range = self.vmax - self.vmin;
        if range <= 0.0 {
            return 0;
        }
        let normalized = ((value - self.vmin) / range).clamp(0.0, 1.0);
        (normalized * 255.0).round() as u8
    }

    /// Renders `image` as an 8-bit grayscale image. The source is left
    /// untouched.
    pub fn render(&self, image: ArrayView2<'_, i32>) -> Option<GrayImage> {
        let (height, width) = image.dim();
        let standard = image.as_standard_layout();
        let pixel_data: Vec<u8> = standard
            .as_slice()?
            .par_iter()
            .map(|&v| self.map(v as f32))
            .collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }
}
