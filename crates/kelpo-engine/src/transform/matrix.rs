use glam::{Mat4, Vec3, Vec4};

/// Rotation (X, then Y, then Z) followed by translation.
pub fn model_matrix(angles: Vec3, translation: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_rotation_z(angles.z)
        * Mat4::from_rotation_y(angles.y)
        * Mat4::from_rotation_x(angles.x)
}

/// Left-handed perspective projection: +Z points into the screen, clip `w`
/// equals view-space depth, and depth after the divide lies in `[0, 1]`
/// between `z_near` and `z_far`.
pub fn clip_space_matrix(fov_y_radians: f32, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
    Mat4::perspective_lh(fov_y_radians, aspect, z_near, z_far)
}

/// Maps normalized device coordinates to pixels.
///
/// `x` in `[-1, 1]` → `[0, width]`, `y` in `[-1, 1]` → `[height, 0]` (Y grows
/// downward). `z` and `w` pass through unchanged.
pub fn screen_space_matrix(width: f32, height: f32) -> Mat4 {
    let half_w = width / 2.0;
    let half_h = height / 2.0;
    Mat4::from_cols(
        Vec4::new(half_w, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -half_h, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(half_w, half_h, 0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn screen_matrix_maps_corners() {
        let m = screen_space_matrix(640.0, 480.0);
        let top_left = m * Vec4::new(-1.0, 1.0, 0.5, 1.0);
        let bottom_right = m * Vec4::new(1.0, -1.0, 0.5, 1.0);
        let center = m * Vec4::new(0.0, 0.0, 0.25, 1.0);

        assert!((top_left.x - 0.0).abs() < EPS && (top_left.y - 0.0).abs() < EPS);
        assert!((bottom_right.x - 640.0).abs() < EPS && (bottom_right.y - 480.0).abs() < EPS);
        assert!((center.x - 320.0).abs() < EPS && (center.y - 240.0).abs() < EPS);
        assert!((center.z - 0.25).abs() < EPS);
    }

    #[test]
    fn clip_matrix_w_is_view_depth() {
        let m = clip_space_matrix(60f32.to_radians(), 4.0 / 3.0, 0.1, 100.0);
        let p = m * Vec4::new(0.3, -0.2, 7.5, 1.0);
        assert!((p.w - 7.5).abs() < EPS);

        let near = m * Vec4::new(0.0, 0.0, 0.1, 1.0);
        let far = m * Vec4::new(0.0, 0.0, 100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn model_matrix_rotates_before_translating() {
        let m = model_matrix(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2), Vec3::new(10.0, 0.0, 0.0));
        let p = m * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 10.0).abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }
}
