use glam::{Mat3, Mat4, Vec4};

use crate::batch::{Batch, BatchError};
use crate::polygon::{Triangle, Vertex};

/// Outcome of [`project_to_screen`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ProjectionStats {
    /// Triangles appended to the destination batch.
    pub projected: usize,
    /// Triangles dropped because a vertex had clip-space `w <= 0` (or non-finite).
    pub skipped: usize,
}

/// Appends a copy of every triangle in `src` to `dst`.
#[inline]
pub fn duplicate(src: &Batch<Triangle>, dst: &mut Batch<Triangle>) -> Result<(), BatchError> {
    src.duplicate_into(dst)
}

/// Rotates vertex positions about the origin: X (pitch), then Y (yaw), then Z (roll).
///
/// Normals are left as they are. Nothing downstream consumes them yet; a
/// lighting stage would need to rotate them too.
pub fn rotate(batch: &mut Batch<Triangle>, angle_x: f32, angle_y: f32, angle_z: f32) {
    let rotation = Mat3::from_rotation_z(angle_z)
        * Mat3::from_rotation_y(angle_y)
        * Mat3::from_rotation_x(angle_x);

    for_each_vertex(batch, |v| {
        let p = rotation * v.position().truncate();
        v.x = p.x;
        v.y = p.y;
        v.z = p.z;
    });
}

/// Adds `(dx, dy, dz)` to every vertex position.
pub fn translate(batch: &mut Batch<Triangle>, dx: f32, dy: f32, dz: f32) {
    for_each_vertex(batch, |v| {
        v.x += dx;
        v.y += dy;
        v.z += dz;
    });
}

/// Applies an arbitrary model matrix to every vertex position (normals untouched).
pub fn transform(batch: &mut Batch<Triangle>, matrix: &Mat4) {
    for_each_vertex(batch, |v| {
        let p = *matrix * v.position();
        v.set_position(p);
    });
}

/// Projects every triangle of `src` into screen space and appends it to `dst`.
///
/// Per vertex: `clip = clip_matrix * p`, divide `x, y, z` by `clip.w`, then
/// `screen_matrix * ndc`. The output vertex keeps `clip.w` as its `w` so
/// backends can do perspective-correct interpolation.
///
/// A triangle with any vertex at `w <= f32::EPSILON` (on or behind the eye
/// plane) or with a non-finite `w` is skipped and counted in the returned
/// stats. There is no other clipping.
///
/// On allocation failure `dst` keeps every triangle appended before the failure.
pub fn project_to_screen(
    src: &Batch<Triangle>,
    dst: &mut Batch<Triangle>,
    clip_matrix: &Mat4,
    screen_matrix: &Mat4,
) -> Result<ProjectionStats, BatchError> {
    let mut stats = ProjectionStats::default();
    dst.reserve(src.len())?;

    'triangles: for tri in src.iter() {
        let mut out = *tri;

        for v in &mut out.vertices {
            let clip = *clip_matrix * v.position();
            if !(clip.w > f32::EPSILON && clip.w.is_finite()) {
                stats.skipped += 1;
                continue 'triangles;
            }

            let ndc = Vec4::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w, 1.0);
            let screen = *screen_matrix * ndc;
            v.set_position(Vec4::new(screen.x, screen.y, screen.z, clip.w));
        }

        dst.push_copy(&out)?;
        stats.projected += 1;
    }

    if stats.skipped > 0 {
        log::trace!("projection skipped {} triangles behind the eye", stats.skipped);
    }

    Ok(stats)
}

fn for_each_vertex(batch: &mut Batch<Triangle>, mut f: impl FnMut(&mut Vertex)) {
    for tri in batch.iter_mut() {
        for v in &mut tri.vertices {
            f(v);
        }
    }
}
