//! Ray casting utilities
//!
//! Picking support for embedding engines: turn a pixel into a world-space
//! ray through the camera, and intersect rays with triangles. Both run in
//! fixed point like everything else, so precision follows Q15 - fine for
//! scene-scale picking, not for sub-texel hits on distant slivers.

use crate::fixed::{self, Fixed};
use crate::scene::Camera;
use crate::transform::Transform;
use crate::vector::Vec4;

/// World-space ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ray {
    pub origin: Vec4,
    pub direction: Vec4,
}

/// Build the world-space ray leaving `camera` through pixel (x, y) of a
/// render target of the given size.
pub fn screen_to_ray(x: i32, y: i32, camera: &Camera, width: usize, height: usize) -> Ray {
    let mut frustum = camera.frustum.clone();
    frustum.set_render_target_size(width, height);
    // same pixel scale the projection matrix uses
    let scale = fixed::mul(
        frustum.focal_length().raw(),
        frustum.port_bottom() - frustum.port_top() + 1,
    );
    let half_x = frustum.port_left() + ((frustum.port_right() - frustum.port_left()) >> 1);
    let half_y = frustum.port_top() + ((frustum.port_bottom() - frustum.port_top()) >> 1);
    // invert the screenport: screen X maps straight, screen Y grows down
    let dx = Fixed(fixed::div(x - half_x, scale));
    let dy = Fixed(-fixed::div(y - half_y, scale));
    let camera_space = Vec4::xyz(dx, dy, -Fixed::ONE).normalized();
    let rotation =
        Transform::new(Vec4::ZERO, camera.transform.rotation, Vec4::ONE).model_matrix();
    Ray {
        origin: camera.transform.location,
        direction: camera_space.transformed(&rotation),
    }
}

/// Moller-Trumbore ray/triangle intersection.
///
/// Returns the distance along the ray to the hit point, or `None` for a
/// miss or a ray parallel to the triangle plane.
pub fn ray_triangle_intersection(ray: &Ray, v0: Vec4, v1: Vec4, v2: Vec4) -> Option<Fixed> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let area = edge1.dot(h);
    // parallel, or too small for Q15 to divide through meaningfully
    if area.abs().raw() <= 1 {
        return None;
    }
    let inverse_area = Fixed::ONE / area;
    let s = ray.origin - v0;
    let u = inverse_area * s.dot(h);
    if u < Fixed::ZERO || u > Fixed::ONE {
        return None;
    }
    let q = s.cross(edge1);
    let v = inverse_area * ray.direction.dot(q);
    if v < Fixed::ZERO || u + v > Fixed::ONE {
        return None;
    }
    let t = inverse_area * edge2.dot(q);
    if t > Fixed::ZERO {
        Some(t)
    } else {
        None
    }
}
