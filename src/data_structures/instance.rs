//! Transformation data for model instances in the scene graph.
//!
//! An [`Instance`] is a position, rotation and scale. Instances compose with
//! `*` the way parent and child transforms do in the scene graph.

use std::ops::Mul;

use cgmath::{InnerSpace, One, Rotation3};

/// Position, rotation (as quaternion) and scale of one model instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// A pure rotation of `angle` radians around `axis`.
    ///
    /// A zero axis yields the identity rotation.
    pub fn from_axis_angle(angle: cgmath::Rad<f32>, axis: cgmath::Vector3<f32>) -> Self {
        let rotation = if axis.magnitude2() > 0.0 {
            cgmath::Quaternion::from_axis_angle(axis.normalize(), angle)
        } else {
            cgmath::Quaternion::one()
        };
        Self {
            rotation,
            ..Default::default()
        }
    }

    /// A pure rotation from per-axis angles in degrees, applied X first, then Y, then Z.
    pub fn from_euler_degrees(x: f32, y: f32, z: f32) -> Self {
        let rotation = cgmath::Quaternion::from_angle_x(cgmath::Deg(x))
            * cgmath::Quaternion::from_angle_y(cgmath::Deg(y))
            * cgmath::Quaternion::from_angle_z(cgmath::Deg(z));
        Self {
            rotation,
            ..Default::default()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Map a point from this instance's local space into its parent space.
    pub fn transform_point(&self, point: cgmath::Vector3<f32>) -> cgmath::Vector3<f32> {
        let scaled = cgmath::Vector3::new(
            self.scale.x * point.x,
            self.scale.y * point.y,
            self.scale.z * point.z,
        );
        self.position + self.rotation * scaled
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );

        Instance {
            position: self.transform_point(rhs.position),
            rotation: self.rotation * rhs.rotation,
            scale: new_scale,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn child_positions_follow_parent_rotation() {
        let parent = Instance {
            position: cgmath::Vector3::new(10.0, 0.0, 0.0),
            ..Instance::from_euler_degrees(0.0, 0.0, 90.0)
        };
        let child = Instance::from(cgmath::Vector3::new(1.0, 0.0, 0.0));

        let world = &parent * &child;
        assert_abs_diff_eq!(world.position.x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(world.position.y, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(world.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_axis_is_identity() {
        let instance = Instance::from_axis_angle(cgmath::Rad(1.0), cgmath::Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(instance, Instance::new());
    }

    #[test]
    fn matrix_matches_point_transform() {
        let instance = Instance {
            position: cgmath::Vector3::new(1.0, 2.0, 3.0),
            scale: cgmath::Vector3::new(2.0, 2.0, 2.0),
            ..Instance::from_euler_degrees(-90.0, 0.0, 0.0)
        };
        let point = cgmath::Vector3::new(0.0, 1.0, 0.0);
        let by_matrix = instance.to_matrix() * point.extend(1.0);
        let by_instance = instance.transform_point(point);
        assert_abs_diff_eq!(by_matrix.x, by_instance.x, epsilon = 1e-5);
        assert_abs_diff_eq!(by_matrix.y, by_instance.y, epsilon = 1e-5);
        assert_abs_diff_eq!(by_matrix.z, by_instance.z, epsilon = 1e-5);
    }
}
