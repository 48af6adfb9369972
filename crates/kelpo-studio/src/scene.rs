//! Procedural assets for the demo: a textured cube and a stand-in font.

use anyhow::{Context, Result};
use glam::Vec3;
use kelpo_engine::text::GLYPHS_PER_ROW;
use kelpo_engine::{Batch, Rgba5551, Texture, TextureId, Triangle, Vertex};

const CHECKER_SIDE: u32 = 64;
const CHECKER_CELL: u32 = 8;

/// A 64x64 two-tone checkerboard with a full mip chain.
pub fn checker_texture() -> Result<Texture> {
    let light = Rgba5551::from_rgb888(230, 230, 230);
    let dark = Rgba5551::from_rgb888(200, 90, 40);

    let mut levels = Vec::new();
    let mut side = CHECKER_SIDE;
    loop {
        let cell = (CHECKER_CELL * side / CHECKER_SIDE).max(1);
        let level = (0..side * side)
            .map(|i| {
                let (x, y) = (i % side, i / side);
                if (x / cell + y / cell) % 2 == 0 { light } else { dark }
            })
            .collect();
        levels.push(level);
        if side == 1 {
            break;
        }
        side /= 2;
    }

    Texture::from_levels(CHECKER_SIDE, CHECKER_SIDE, levels).context("checker mip levels do not match their sizes")
}

/// Unit cube centered on the origin, two triangles per face, each face tinted.
pub fn cube(texture: TextureId) -> Result<Batch<Triangle>> {
    // (normal, u axis, v axis, tint)
    let faces: [([f32; 3], [f32; 3], [f32; 3], [u8; 4]); 6] = [
        ([0.0, 0.0, -1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [255, 255, 255, 255]),
        ([0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [255, 200, 200, 255]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0], [200, 255, 200, 255]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, -1.0, 0.0], [200, 200, 255, 255]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [255, 255, 180, 255]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [180, 255, 255, 255]),
    ];

    let mut mesh = Batch::with_capacity(faces.len() * 2);
    for (n, u, v, tint) in faces {
        let corner = |su: f32, sv: f32| {
            let p: [f32; 3] = std::array::from_fn(|i| n[i] + su * u[i] + sv * v[i]);
            Vertex::at(p[0], p[1], p[2])
                .with_uv((su + 1.0) / 2.0, (1.0 - sv) / 2.0)
                .with_color(tint)
                .with_normal(Vec3::from(n))
        };
        let (a, b, c, d) = (corner(-1.0, 1.0), corner(1.0, 1.0), corner(1.0, -1.0), corner(-1.0, -1.0));

        mesh.extend_from_slice(&[Triangle::textured([a, b, c], texture), Triangle::textured([a, c, d], texture)])
            .context("cube mesh")?;
    }
    Ok(mesh)
}

/// Font atlas used when no `--font` is given: every printable glyph is a
/// solid block inset in its cell; the space cell stays empty (keyed out).
pub fn block_font() -> Result<Texture> {
    const SIDE: u32 = 256;
    let cell = SIDE / GLYPHS_PER_ROW;
    let inset = cell / 8;

    let mut rgb = Vec::with_capacity((SIDE * SIDE * 3) as usize);
    for y in 0..SIDE {
        for x in 0..SIDE {
            let glyph = (y / cell) * GLYPHS_PER_ROW + x / cell;
            let (cx, cy) = (x % cell, y % cell);
            let inside = (inset..cell - inset).contains(&cx) && (inset..cell - inset).contains(&cy);
            let lit = glyph != 0 && inside;
            rgb.extend_from_slice(&[if lit { 255u8 } else { 0 }; 3]);
        }
    }

    Texture::create_from_rgb888(SIDE, SIDE, &rgb).context("block font atlas")
}
