//! Transforms and matrix composition
//!
//! A `Transform` is a location, a rotation in fixed-point degrees, and a
//! scale. The model, normal and view matrices are regenerated from it every
//! frame; nothing here persists composed matrices across frames.
//!
//! Rotation-order convention used everywhere in the crate: the model matrix
//! applies X then Y then Z; the view matrix applies the inverse in Z then Y
//! then X. The view matrix negates location and rotation on local copies,
//! so the shared camera transform is never written during setup.

use serde::{Deserialize, Serialize};

use crate::fixed::{self, Fixed};
use crate::matrix::Mat4;
use crate::vector::Vec4;

/// Location, rotation (fixed-point degrees) and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec4,
    pub rotation: Vec4,
    pub scale: Vec4,
}

impl Transform {
    pub fn new(location: Vec4, rotation: Vec4, scale: Vec4) -> Self {
        Transform { location, rotation, scale }
    }

    /// Identity placement at the origin.
    pub fn identity() -> Self {
        Transform::new(Vec4::ZERO, Vec4::ZERO, Vec4::ONE)
    }

    pub fn translate(&mut self, delta: Vec4) {
        self.location = self.location + delta;
    }

    pub fn rotate(&mut self, delta: Vec4) {
        self.rotation = self.rotation + delta;
    }

    /// Local-to-world matrix: translate * rotZ * rotY * rotX * scale.
    pub fn model_matrix(&self) -> Mat4 {
        let mut matrix = scale_matrix(self.scale);
        matrix = x_rotation_matrix(self.rotation.x).multiply(&matrix);
        matrix = y_rotation_matrix(self.rotation.y).multiply(&matrix);
        matrix = z_rotation_matrix(self.rotation.z).multiply(&matrix);
        translation_matrix(self.location).multiply(&matrix)
    }

    /// Matrix for transforming normals into world space.
    ///
    /// Rotations with a uniform scale are already orthogonal-up-to-scale;
    /// a non-uniform scale needs the inverse-transpose.
    pub fn normal_matrix(&self) -> Mat4 {
        let mut matrix = scale_matrix(self.scale);
        matrix = x_rotation_matrix(self.rotation.x).multiply(&matrix);
        matrix = y_rotation_matrix(self.rotation.y).multiply(&matrix);
        matrix = z_rotation_matrix(self.rotation.z).multiply(&matrix);
        if self.scale.x != self.scale.y || self.scale.y != self.scale.z {
            matrix = matrix.inverse().transposed();
        }
        matrix
    }

    /// World-to-local matrix, the exact inverse of [`Self::model_matrix`]:
    /// reciprocal scale * rotX * rotY * rotZ * translate, all negated.
    pub fn view_matrix(&self) -> Mat4 {
        let location = -self.location;
        let rotation = -self.rotation;
        let reciprocal = Vec4::xyz(
            reciprocal_scale(self.scale.x),
            reciprocal_scale(self.scale.y),
            reciprocal_scale(self.scale.z),
        );
        let mut matrix = translation_matrix(location);
        matrix = z_rotation_matrix(rotation.z).multiply(&matrix);
        matrix = y_rotation_matrix(rotation.y).multiply(&matrix);
        matrix = x_rotation_matrix(rotation.x).multiply(&matrix);
        scale_matrix(reciprocal).multiply(&matrix)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

fn reciprocal_scale(scale: Fixed) -> Fixed {
    // zero scale degrades to a unit axis instead of dividing by zero
    let raw = if scale.raw() == 0 { 1 } else { scale.raw() };
    Fixed(fixed::div(fixed::FP_ONE, raw))
}

pub fn translation_matrix(location: Vec4) -> Mat4 {
    let mut matrix = Mat4::IDENTITY;
    matrix.set(0, 3, location.x);
    matrix.set(1, 3, location.y);
    matrix.set(2, 3, location.z);
    matrix
}

pub fn scale_matrix(scale: Vec4) -> Mat4 {
    let mut matrix = Mat4::IDENTITY;
    matrix.set(0, 0, scale.x);
    matrix.set(1, 1, scale.y);
    matrix.set(2, 2, scale.z);
    matrix
}

pub fn x_rotation_matrix(angle: Fixed) -> Mat4 {
    let sin = angle.sin();
    let cos = angle.cos();
    let mut matrix = Mat4::IDENTITY;
    matrix.set(1, 1, cos);
    matrix.set(1, 2, -sin);
    matrix.set(2, 1, sin);
    matrix.set(2, 2, cos);
    matrix
}

pub fn y_rotation_matrix(angle: Fixed) -> Mat4 {
    let sin = angle.sin();
    let cos = angle.cos();
    let mut matrix = Mat4::IDENTITY;
    matrix.set(0, 0, cos);
    matrix.set(0, 2, sin);
    matrix.set(2, 0, -sin);
    matrix.set(2, 2, cos);
    matrix
}

pub fn z_rotation_matrix(angle: Fixed) -> Mat4 {
    let sin = angle.sin();
    let cos = angle.cos();
    let mut matrix = Mat4::IDENTITY;
    matrix.set(0, 0, cos);
    matrix.set(0, 1, -sin);
    matrix.set(1, 0, sin);
    matrix.set(1, 1, cos);
    matrix
}
