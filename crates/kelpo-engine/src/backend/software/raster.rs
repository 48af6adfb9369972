use glam::{Vec2, Vec4};

use crate::polygon::{Rgba5551, Triangle, Vertex};

/// Level-0 copy of an uploaded texture.
#[derive(Debug, Clone)]
pub(super) struct CachedTexture {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<Rgba5551>,
}

impl CachedTexture {
    /// Nearest texel for `(u, v)`, clamped to the edges.
    fn sample(&self, u: f32, v: f32) -> Rgba5551 {
        let tx = ((u * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1);
        let ty = ((v * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1);
        self.texels[(ty as usize) * self.width as usize + tx as usize]
    }
}

/// Color and depth planes a triangle is rasterized into.
pub(super) struct Target<'a> {
    pub width: u32,
    pub height: u32,
    pub color: &'a mut [[u8; 4]],
    pub depth: &'a mut [f32],
}

struct Corner {
    p: Vec2,
    z: f32,
    inv_w: f32,
    /// u/w, v/w, then color/w.
    attrs: [f32; 6],
}

impl Corner {
    fn new(v: &Vertex) -> Option<Self> {
        if !(v.w > f32::EPSILON && v.w.is_finite()) {
            return None;
        }
        let inv_w = 1.0 / v.w;
        let c = Vec4::new(v.r as f32, v.g as f32, v.b as f32, v.a as f32) * inv_w;
        Some(Self {
            p: Vec2::new(v.x, v.y),
            z: v.z,
            inv_w,
            attrs: [v.u * inv_w, v.v * inv_w, c.x, c.y, c.z, c.w],
        })
    }
}

#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Fills the pixels whose centers fall inside `tri`.
///
/// `texture` is `None` for untextured triangles (and for ones whose texture
/// could not be resolved). Returns the number of pixels written.
pub(super) fn draw_triangle(target: &mut Target<'_>, tri: &Triangle, texture: Option<&CachedTexture>) -> usize {
    let [Some(a), Some(b), Some(c)] = tri.vertices.each_ref().map(Corner::new) else {
        return 0;
    };

    let area = edge(a.p, b.p, c.p);
    if area == 0.0 || !area.is_finite() {
        return 0;
    }

    let min = a.p.min(b.p).min(c.p);
    let max = a.p.max(b.p).max(c.p);
    if max.x < 0.0 || max.y < 0.0 || min.x >= target.width as f32 || min.y >= target.height as f32 {
        return 0;
    }
    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil() as u32).min(target.width - 1);
    let y1 = (max.y.ceil() as u32).min(target.height - 1);

    let mut written = 0;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
            let (wa, wb, wc) = (edge(b.p, c.p, p) / area, edge(c.p, a.p, p) / area, edge(a.p, b.p, p) / area);
            if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                continue;
            }

            let index = (py * target.width + px) as usize;
            let z = wa * a.z + wb * b.z + wc * c.z;
            if z > target.depth[index] {
                continue;
            }

            let inv_w = wa * a.inv_w + wb * b.inv_w + wc * c.inv_w;
            let mut attrs = [0.0f32; 6];
            for (i, out) in attrs.iter_mut().enumerate() {
                *out = (wa * a.attrs[i] + wb * b.attrs[i] + wc * c.attrs[i]) / inv_w;
            }
            let vertex_color = [attrs[2], attrs[3], attrs[4], attrs[5]];

            let color = match texture {
                Some(tex) => {
                    let texel = tex.sample(attrs[0], attrs[1]);
                    if !texel.alpha() {
                        continue;
                    }
                    modulate(texel.to_rgba8(), vertex_color)
                }
                None => vertex_color.map(to_u8),
            };

            target.color[index] = color;
            target.depth[index] = z;
            written += 1;
        }
    }

    written
}

fn modulate(texel: [u8; 4], color: [f32; 4]) -> [u8; 4] {
    std::array::from_fn(|i| to_u8(texel[i] as f32 * color[i] / 255.0))
}

#[inline]
fn to_u8(c: f32) -> u8 {
    c.round().clamp(0.0, 255.0) as u8
}
