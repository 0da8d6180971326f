//! View frustums and projection
//!
//! A frustum is configured in normalized units (left/right/top/bottom as
//! fractions of the render target, near/far in world units) and must be
//! ported into pixel space before any screen work. Porting also rebuilds
//! the projection matrix, whose scale factor is expressed in pixels.
//!
//! Camera space looks down -Z. The perspective matrix stores a negated X
//! scale and passes w' = z (negative in front of the camera), so the
//! screenport divide flips X back upright and mirrors Y into screen-down
//! orientation. The orthographic matrix is built to land in that same
//! orientation.

use serde::{Deserialize, Serialize};

use crate::fixed::{self, Fixed, FP_ONE};
use crate::matrix::Mat4;
use crate::vector::Vec4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrustumKind {
    Perspective,
    Orthographic,
}

/// Projection volume plus its ported pixel-space bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frustum {
    left: Fixed,
    right: Fixed,
    top: Fixed,
    bottom: Fixed,
    near: Fixed,
    far: Fixed,
    focal_length: Fixed,
    kind: FrustumKind,
    port_left: i32,
    port_right: i32,
    port_top: i32,
    port_bottom: i32,
    projection: Mat4,
}

impl Frustum {
    pub fn new(left: Fixed, right: Fixed, top: Fixed, bottom: Fixed, near: Fixed, far: Fixed) -> Self {
        Frustum {
            left,
            right,
            top,
            bottom,
            near,
            far,
            focal_length: Fixed::ONE,
            kind: FrustumKind::Perspective,
            port_left: 0,
            port_right: 0,
            port_top: 0,
            port_bottom: 0,
            projection: Mat4::IDENTITY,
        }
    }

    pub fn kind(&self) -> FrustumKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: FrustumKind) {
        if self.kind != kind {
            self.kind = kind;
            self.rebuild_projection();
        }
    }

    pub fn focal_length(&self) -> Fixed {
        self.focal_length
    }

    pub fn set_focal_length(&mut self, focal_length: Fixed) {
        if self.focal_length != focal_length {
            self.focal_length = focal_length;
            self.rebuild_projection();
        }
    }

    pub fn near(&self) -> Fixed {
        self.near
    }

    pub fn far(&self) -> Fixed {
        self.far
    }

    /// Port the normalized bounds into the pixel space of a render target
    /// and rebuild the projection for that size.
    pub fn set_render_target_size(&mut self, width: usize, height: usize) {
        self.port_left = fixed::mul(width as i32, self.left.raw());
        self.port_right = fixed::mul(width as i32, self.right.raw());
        self.port_top = fixed::mul(height as i32, self.top.raw());
        self.port_bottom = fixed::mul(height as i32, self.bottom.raw());
        self.rebuild_projection();
    }

    pub fn port_left(&self) -> i32 {
        self.port_left
    }

    pub fn port_right(&self) -> i32 {
        self.port_right
    }

    pub fn port_top(&self) -> i32 {
        self.port_top
    }

    pub fn port_bottom(&self) -> i32 {
        self.port_bottom
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    fn rebuild_projection(&mut self) {
        let far_near = self.far - self.near;
        // the projection scale lives in pixels, like the ported bounds
        let scale = fixed::mul(self.focal_length.raw(), self.port_bottom - self.port_top + 1);
        let mut matrix = Mat4::IDENTITY;
        matrix.set(2, 2, -(Fixed::ONE / far_near));
        matrix.set(2, 3, -(self.near / far_near));
        match self.kind {
            FrustumKind::Perspective => {
                // w' = z is negative in front of the camera; the negated X
                // scale cancels against it in the screenport divide
                matrix.set(0, 0, Fixed(-scale));
                matrix.set(1, 1, Fixed(scale));
                matrix.set(3, 2, Fixed::ONE);
                matrix.set(3, 3, Fixed::ZERO);
            }
            FrustumKind::Orthographic => {
                // constant positive w; Y negated here to match the
                // perspective path's screen-down orientation
                matrix.set(0, 0, Fixed(scale));
                matrix.set(1, 1, Fixed(-scale));
                matrix.set(3, 3, Fixed(FP_ONE << 4));
            }
        }
        self.projection = matrix;
    }

    /// Map a projected vector into pixel space: divide X and Y by w and
    /// recenter on the ported bounds. Zero w substitutes 1, the usual
    /// numeric guard; Z and W pass through untouched.
    ///
    /// The returned X and Y lanes hold whole pixels in their raw values -
    /// they leave the Q15 domain here and belong to the rasterizer.
    pub fn screenport_vector(&self, v: Vec4) -> Vec4 {
        let half_x = self.port_left + ((self.port_right - self.port_left) >> 1);
        let half_y = self.port_top + ((self.port_bottom - self.port_top) >> 1);
        let w = if v.w.raw() == 0 { 1 } else { v.w.raw() };
        let one_by_w = fixed::div(FP_ONE, w);
        Vec4::new(
            Fixed(fixed::mul(v.x.raw(), one_by_w) + half_x),
            Fixed(fixed::mul(v.y.raw(), one_by_w) + half_y),
            v.z,
            v.w,
        )
    }
}

impl Default for Frustum {
    /// Full-target frustum with a moderate depth range.
    fn default() -> Self {
        Frustum::new(
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::from_f32(0.1),
            Fixed::from_int(100),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ported(kind: FrustumKind) -> Frustum {
        let mut frustum = Frustum::default();
        frustum.set_kind(kind);
        frustum.set_render_target_size(128, 96);
        frustum
    }

    fn project(frustum: &Frustum, x: f32, y: f32, z: f32) -> Vec4 {
        let clip = Vec4::from_f32(x, y, z).transformed(frustum.projection());
        frustum.screenport_vector(clip)
    }

    #[test]
    fn test_porting_scales_bounds() {
        let frustum = ported(FrustumKind::Perspective);
        assert_eq!(frustum.port_left(), 0);
        assert_eq!(frustum.port_right(), 128);
        assert_eq!(frustum.port_top(), 0);
        assert_eq!(frustum.port_bottom(), 96);
    }

    #[test]
    fn test_perspective_w_carries_depth() {
        let frustum = ported(FrustumKind::Perspective);
        let clip = Vec4::from_f32(1.0, 1.0, -2.0).transformed(frustum.projection());
        assert_eq!(clip.w, Fixed::from_f32(-2.0));
    }

    #[test]
    fn test_perspective_centers_the_axis() {
        let frustum = ported(FrustumKind::Perspective);
        let center = project(&frustum, 0.0, 0.0, -2.0);
        assert_eq!(center.x.raw(), 64);
        assert_eq!(center.y.raw(), 48);
    }

    #[test]
    fn test_perspective_foreshortens() {
        let frustum = ported(FrustumKind::Perspective);
        let close_by = project(&frustum, 1.0, 0.0, -2.0);
        let far_off = project(&frustum, 1.0, 0.0, -8.0);
        let center = 64;
        assert!(close_by.x.raw() > center);
        assert!(far_off.x.raw() > center);
        assert!(close_by.x.raw() - center > far_off.x.raw() - center);
    }

    #[test]
    fn test_perspective_orientation() {
        let frustum = ported(FrustumKind::Perspective);
        // camera-space +X lands right of center, +Y lands above (screen up
        // is smaller Y)
        let right = project(&frustum, 1.0, 0.0, -4.0);
        let up = project(&frustum, 0.0, 1.0, -4.0);
        assert!(right.x.raw() > 64);
        assert!(up.y.raw() < 48);
    }

    #[test]
    fn test_orthographic_ignores_depth() {
        let frustum = ported(FrustumKind::Orthographic);
        let close_by = project(&frustum, 1.0, 0.5, -2.0);
        let far_off = project(&frustum, 1.0, 0.5, -50.0);
        assert_eq!(close_by.x.raw(), far_off.x.raw());
        assert_eq!(close_by.y.raw(), far_off.y.raw());
        // same screen orientation as the perspective path
        assert!(close_by.x.raw() > 64);
        assert!(close_by.y.raw() < 48);
    }

    #[test]
    fn test_depth_maps_into_unit_range() {
        let frustum = ported(FrustumKind::Perspective);
        for depth in [-1.0f32, -10.0, -60.0] {
            let out = project(&frustum, 0.0, 0.0, depth);
            assert!(out.z > Fixed::ZERO && out.z < Fixed::ONE, "depth {depth} -> {}", out.z.to_f32());
        }
    }

    #[test]
    fn test_screenport_guards_zero_w() {
        let frustum = ported(FrustumKind::Perspective);
        let v = Vec4::new(Fixed::from_int(1), Fixed::ZERO, Fixed::ZERO, Fixed::ZERO);
        let _ = frustum.screenport_vector(v);
    }
}
