use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Triangle corner.
///
/// Position is homogeneous. After screen-space projection `x`/`y` are pixels,
/// `z` is normalized depth and `w` keeps the clip-space W so backends can
/// interpolate attributes with perspective correction.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,

    pub nx: f32,
    pub ny: f32,
    pub nz: f32,

    pub u: f32,
    pub v: f32,

    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Vertex {
    /// Opaque white vertex at `(x, y, z, 1)`.
    pub const fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            w: 1.0,
            nx: 0.0,
            ny: 0.0,
            nz: 0.0,
            u: 0.0,
            v: 0.0,
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }
    }

    #[inline]
    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.u = u;
        self.v = v;
        self
    }

    #[inline]
    pub fn with_color(mut self, [r, g, b, a]: [u8; 4]) -> Self {
        self.r = r;
        self.g = g;
        self.b = b;
        self.a = a;
        self
    }

    #[inline]
    pub fn with_normal(mut self, n: Vec3) -> Self {
        self.nx = n.x;
        self.ny = n.y;
        self.nz = n.z;
        self
    }

    #[inline]
    pub fn position(&self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, self.w)
    }

    #[inline]
    pub fn set_position(&mut self, p: Vec4) {
        self.x = p.x;
        self.y = p.y;
        self.z = p.z;
        self.w = p.w;
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.nx, self.ny, self.nz)
    }

    #[inline]
    pub fn color(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
