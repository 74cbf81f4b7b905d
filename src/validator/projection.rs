//! World-space projection of highlighted elements.
//!
//! Highlights are lifted off the surface along the vertex normal so stacked
//! layers stay readable: face fills sit slightly below their edge outlines,
//! and everything sits above the mesh itself.

use bevy::math::Affine3A;
use bevy::prelude::*;

/// Smallest offset (in hundredths of the object's average scale).
pub const MIN_OFFSET: f32 = 0.1;
/// Extra offset applied to face fills only.
pub const FACE_FILL_BIAS: f32 = 0.01;

/// Object-to-world mapping used for overlay geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    pub affine: Affine3A,
    /// Mean of the three world-scale components.
    pub average_scale: f32,
}

impl OverlayTransform {
    pub fn from_global(transform: &GlobalTransform) -> Self {
        let (scale, _, _) = transform.to_scale_rotation_translation();
        Self {
            affine: transform.affine(),
            average_scale: (scale.x + scale.y + scale.z) / 3.0,
        }
    }

    pub fn identity() -> Self {
        Self {
            affine: Affine3A::IDENTITY,
            average_scale: 1.0,
        }
    }

    /// Displacement along the normal for an edge or point overlay.
    pub fn edge_offset(&self, requested: f32) -> f32 {
        requested.max(MIN_OFFSET) / 100.0 * self.average_scale
    }

    /// Displacement along the normal for a face fill.
    pub fn face_offset(&self, requested: f32) -> f32 {
        (requested + FACE_FILL_BIAS).max(MIN_OFFSET) / 100.0 * self.average_scale
    }

    /// Transform a local position to world space, then push it along the
    /// local normal by `distance`.
    pub fn project(&self, position: Vec3, normal: Vec3, distance: f32) -> Vec3 {
        self.affine.transform_point3(position) + normal * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_clamped_at_minimum() {
        let t = OverlayTransform::identity();
        assert_eq!(t.edge_offset(0.0), MIN_OFFSET / 100.0);
        assert_eq!(t.edge_offset(-3.0), MIN_OFFSET / 100.0);
        assert_eq!(t.face_offset(0.0), MIN_OFFSET / 100.0);
    }

    #[test]
    fn offset_grows_with_request() {
        let t = OverlayTransform::identity();
        let mut last = t.edge_offset(0.1);
        for step in 1..50 {
            let next = t.edge_offset(0.1 + step as f32 * 0.1);
            assert!(next > last);
            last = next;
        }
        assert!(t.face_offset(1.0) > t.edge_offset(1.0));
    }

    #[test]
    fn offset_scales_with_average_scale() {
        let transform = GlobalTransform::from(Transform::from_scale(Vec3::new(1.0, 2.0, 3.0)));
        let t = OverlayTransform::from_global(&transform);
        assert!((t.average_scale - 2.0).abs() < 1e-6);
        assert!((t.edge_offset(1.0) - 0.02).abs() < 1e-6);
    }

    #[test]
    fn normal_is_not_transformed() {
        let transform = GlobalTransform::from(
            Transform::from_xyz(1.0, 0.0, 0.0).with_rotation(Quat::from_rotation_z(1.0)),
        );
        let t = OverlayTransform::from_global(&transform);
        let p = t.project(Vec3::ZERO, Vec3::Y, 0.5);
        assert!((p - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-5);
    }
}
