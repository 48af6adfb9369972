use std::collections::TryReserveError;

/// Pixel value cleared into the back buffer at the start of a frame.
pub(super) const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Color depths the software surface can present.
pub(super) const SUPPORTED_BPP: [u32; 3] = [16, 24, 32];

/// Back and front color buffers, RGBA8 in memory regardless of the
/// presented depth.
#[derive(Debug)]
pub(super) struct Surface {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    pub back: Vec<[u8; 4]>,
    pub front: Vec<[u8; 4]>,
}

impl Surface {
    pub fn allocate(width: u32, height: u32, bits_per_pixel: u32) -> Result<Self, TryReserveError> {
        let len = width as usize * height as usize;
        let surface = Self {
            width,
            height,
            bits_per_pixel,
            back: filled(len, CLEAR_COLOR)?,
            front: filled(len, CLEAR_COLOR)?,
        };
        log::debug!("software surface acquired: {width}x{height}x{bits_per_pixel}");
        Ok(surface)
    }

    /// Copies the back buffer into the front buffer at the surface's depth.
    pub fn present(&mut self) {
        let quantize: fn([u8; 4]) -> [u8; 4] = match self.bits_per_pixel {
            16 => to_rgb565,
            24 => opaque,
            _ => identity,
        };
        for (dst, src) in self.front.iter_mut().zip(&self.back) {
            *dst = quantize(*src);
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        log::debug!("software surface released");
    }
}

/// Per-pixel depth, smaller is closer.
#[derive(Debug)]
pub(super) struct DepthBuffer {
    pub values: Vec<f32>,
}

impl DepthBuffer {
    pub const FAR: f32 = f32::INFINITY;

    pub fn allocate(width: u32, height: u32) -> Result<Self, TryReserveError> {
        let values = filled(width as usize * height as usize, Self::FAR)?;
        log::debug!("software depth buffer acquired");
        Ok(Self { values })
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        log::debug!("software depth buffer released");
    }
}

/// Last presented frame of a software backend.
#[derive(Debug, Copy, Clone)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    pixels: &'a [[u8; 4]],
}

impl<'a> Frame<'a> {
    pub(super) fn new(surface: &'a Surface) -> Self {
        Self {
            width: surface.width,
            height: surface.height,
            pixels: &surface.front,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel at `(x, y)`, origin top-left.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Rows top to bottom.
    #[inline]
    pub fn pixels(&self) -> &'a [[u8; 4]] {
        self.pixels
    }
}

fn filled<T: Copy>(len: usize, value: T) -> Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, value);
    Ok(v)
}

fn to_rgb565([r, g, b, _]: [u8; 4]) -> [u8; 4] {
    let (r5, g6, b5) = (r >> 3, g >> 2, b >> 3);
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2), 255]
}

fn opaque([r, g, b, _]: [u8; 4]) -> [u8; 4] {
    [r, g, b, 255]
}

fn identity(px: [u8; 4]) -> [u8; 4] {
    px
}
