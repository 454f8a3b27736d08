use glam::{Quat, Vec3};

/// A keyframe value type that can be blended between two samples.
pub trait Interpolatable: Copy + Clone + Sized {
    /// Value used when a curve has no keys at all.
    const IDENTITY: Self;

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    const IDENTITY: Self = 0.0;

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    const IDENTITY: Self = Vec3::ZERO;

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Quat {
    const IDENTITY: Self = Quat::IDENTITY;

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        slerp_shortest(start, end, t)
    }
}

/// Spherical interpolation along the shorter of the two arcs.
///
/// `q` and `-q` encode the same rotation; the end point is flipped into the
/// hemisphere of `start` so the path never exceeds 180°.
#[must_use]
pub fn slerp_shortest(start: Quat, end: Quat, t: f32) -> Quat {
    let end = if start.dot(end) < 0.0 { -end } else { end };
    start.slerp(end, t).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn slerp_takes_short_arc_for_negated_end() {
        let start = Quat::from_rotation_z(0.1);
        let end = -Quat::from_rotation_z(0.3);
        let mid = slerp_shortest(start, end, 0.5);
        assert!(mid.angle_between(Quat::from_rotation_z(0.2)) < 1e-4);
    }

    #[test]
    fn slerp_endpoints() {
        let start = Quat::IDENTITY;
        let end = Quat::from_rotation_y(PI * 0.5);
        assert!(slerp_shortest(start, end, 0.0).angle_between(start) < 1e-5);
        assert!(slerp_shortest(start, end, 1.0).angle_between(end) < 1e-4);
    }

    #[test]
    fn vec3_lerp_is_componentwise() {
        let v = Vec3::interpolate_linear(Vec3::ZERO, Vec3::new(2.0, 4.0, -8.0), 0.25);
        assert_eq!(v, Vec3::new(0.5, 1.0, -2.0));
    }
}
