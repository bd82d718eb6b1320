/// Size of the drawable surface in logical pixels plus the pixel ratio the
/// renderer multiplies it by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub pixel_ratio_cap: f32,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, pixel_ratio_cap: f32) -> Self {
        Self { width, height, pixel_ratio: 1.0, pixel_ratio_cap }
    }

    /// Device pixel ratio clamped to `(0, cap]`; bogus ratios fall back to 1.
    pub fn effective_pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(self.pixel_ratio_cap)
        } else {
            1.0_f32.min(self.pixel_ratio_cap)
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Physical pixel size of the surface, never zero on either axis.
    pub fn drawable_size(&self) -> (u32, u32) {
        let w = (self.width as f32 * self.pixel_ratio).round() as u32;
        let h = (self.height as f32 * self.pixel_ratio).round() as u32;
        (w.max(1), h.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_ratio_is_capped() {
        let vp = ViewportState::new(800, 600, 2.0);
        assert_eq!(vp.effective_pixel_ratio(3.0), 2.0);
        assert_eq!(vp.effective_pixel_ratio(1.5), 1.5);
        assert_eq!(vp.effective_pixel_ratio(f32::NAN), 1.0);
        assert_eq!(vp.effective_pixel_ratio(0.0), 1.0);
    }

    #[test]
    fn test_drawable_size_scales_with_ratio() {
        let mut vp = ViewportState::new(801, 600, 2.0);
        vp.pixel_ratio = 1.5;
        assert_eq!(vp.drawable_size(), (1202, 900));
        assert!((vp.aspect() - 801.0 / 600.0).abs() < 1e-6);
    }
}
