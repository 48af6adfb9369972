/// Parameters for [`Interface::initialize`](super::Interface::initialize).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InitParams {
    /// Render resolution in pixels. Screen-space triangle coordinates are
    /// relative to this, not to the window's current size.
    pub width: u32,
    pub height: u32,
    /// Color depth of the render surface: 16, 24 or 32.
    pub bits_per_pixel: u32,
    /// Ask for presentation synced to the display refresh.
    pub vsync: bool,
    /// Zero-based index of the device to render with. What an index selects
    /// is backend-defined.
    pub device_index: u32,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            bits_per_pixel: 16,
            vsync: true,
            device_index: 0,
        }
    }
}

impl InitParams {
    /// Width over height; `1.0` for a degenerate height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
