//! Fixed-point vectors
//!
//! Four `Fixed` lanes covering locations, directions, normals and rotation
//! triples. `Vec4` is a plain value type: every operation takes vectors by
//! value and returns a new one, so a transform can never alias its own
//! source the way shared scratch arrays could.
//!
//! Component arithmetic touches X/Y/Z only and forwards W unchanged; W is
//! homogeneous bookkeeping owned by the projection and screenport steps.

use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::fixed::{self, Fixed};
use crate::matrix::Mat4;

/// Vector lane selector for code that addresses components by axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    W,
}

/// Four-lane fixed-point vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub w: Fixed,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4::xyz(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO);
    pub const UP: Vec4 = Vec4::xyz(Fixed::ZERO, Fixed::ONE, Fixed::ZERO);
    pub const DOWN: Vec4 = Vec4::xyz(Fixed::ZERO, Fixed(-fixed::FP_ONE), Fixed::ZERO);
    pub const RIGHT: Vec4 = Vec4::xyz(Fixed::ONE, Fixed::ZERO, Fixed::ZERO);
    pub const LEFT: Vec4 = Vec4::xyz(Fixed(-fixed::FP_ONE), Fixed::ZERO, Fixed::ZERO);
    pub const FORWARD: Vec4 = Vec4::xyz(Fixed::ZERO, Fixed::ZERO, Fixed(-fixed::FP_ONE));
    pub const BACK: Vec4 = Vec4::xyz(Fixed::ZERO, Fixed::ZERO, Fixed::ONE);
    pub const ONE: Vec4 = Vec4::xyz(Fixed::ONE, Fixed::ONE, Fixed::ONE);

    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed, w: Fixed) -> Self {
        Vec4 { x, y, z, w }
    }

    /// Point or direction with the homogeneous lane at one.
    #[inline]
    pub const fn xyz(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Vec4::new(x, y, z, Fixed::ONE)
    }

    /// Scene ingestion helper.
    #[inline]
    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Vec4::xyz(Fixed::from_f32(x), Fixed::from_f32(y), Fixed::from_f32(z))
    }

    /// Component-wise multiply.
    #[inline]
    pub fn scaled(self, other: Vec4) -> Self {
        Vec4::new(self.x * other.x, self.y * other.y, self.z * other.z, self.w)
    }

    /// Component-wise divide; zero components are a caller error.
    #[inline]
    pub fn divided(self, other: Vec4) -> Self {
        Vec4::new(self.x / other.x, self.y / other.y, self.z / other.z, self.w)
    }

    /// Dot product over X/Y/Z with a widened accumulator.
    #[inline]
    pub fn dot(self, other: Vec4) -> Fixed {
        Fixed(self.dot_wide(other) as i32)
    }

    /// Dot product kept in `i64`, for squared magnitudes that overflow `i32`.
    #[inline]
    pub fn dot_wide(self, other: Vec4) -> i64 {
        let half = fixed::FP_HALF as i64;
        let x = (self.x.raw() as i64 * other.x.raw() as i64 + half) >> fixed::FP_BIT;
        let y = (self.y.raw() as i64 * other.y.raw() as i64 + half) >> fixed::FP_BIT;
        let z = (self.z.raw() as i64 * other.z.raw() as i64 + half) >> fixed::FP_BIT;
        x + y + z
    }

    #[inline]
    pub fn cross(self, other: Vec4) -> Self {
        Vec4::xyz(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn squared_length(self) -> i64 {
        self.dot_wide(self)
    }

    pub fn length(self) -> Fixed {
        fixed::sqrt_i64(self.squared_length())
    }

    pub fn distance(self, other: Vec4) -> Fixed {
        fixed::sqrt_i64(self.squared_distance(other))
    }

    pub fn squared_distance(self, other: Vec4) -> i64 {
        (self - other).squared_length()
    }

    /// Normalize via a reciprocal length; the +1 keeps the zero vector from
    /// dividing by zero and just returns it unchanged.
    pub fn normalized(self) -> Self {
        let magnitude = Fixed::ONE / Fixed(self.length().raw() + 1);
        self * magnitude
    }

    /// Reflect across `surface_normal` (expected normalized).
    pub fn reflected(self, surface_normal: Vec4) -> Self {
        let projection = Fixed(self.dot(surface_normal).raw().wrapping_mul(2));
        self - surface_normal * projection
    }

    /// Rotate about the X axis by fixed-point degrees.
    pub fn rotated_x(self, angle: Fixed) -> Self {
        let sin = angle.sin();
        let cos = angle.cos();
        Vec4::new(
            self.x,
            self.y * cos - self.z * sin,
            self.y * sin + self.z * cos,
            self.w,
        )
    }

    /// Rotate about the Y axis by fixed-point degrees.
    pub fn rotated_y(self, angle: Fixed) -> Self {
        let sin = angle.sin();
        let cos = angle.cos();
        Vec4::new(
            self.x * cos + self.z * sin,
            self.y,
            self.z * cos - self.x * sin,
            self.w,
        )
    }

    /// Rotate about the Z axis by fixed-point degrees.
    pub fn rotated_z(self, angle: Fixed) -> Self {
        let sin = angle.sin();
        let cos = angle.cos();
        Vec4::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
            self.z,
            self.w,
        )
    }

    /// Multiply by a matrix. Translation applies at an implied w of one and
    /// the output W picks up the projection row, so a perspective matrix
    /// leaves w' = z for the later screenport divide.
    pub fn transformed(self, matrix: &Mat4) -> Self {
        let mut lanes = [Fixed::ZERO; 4];
        for (row, lane) in lanes.iter_mut().enumerate() {
            *lane = self.x * matrix.0[row][0]
                + self.y * matrix.0[row][1]
                + self.z * matrix.0[row][2]
                + matrix.0[row][3];
        }
        Vec4::new(lanes[0], lanes[1], lanes[2], lanes[3])
    }
}

impl Index<Axis> for Vec4 {
    type Output = Fixed;
    #[inline]
    fn index(&self, axis: Axis) -> &Fixed {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::W => &self.w,
        }
    }
}

impl IndexMut<Axis> for Vec4 {
    #[inline]
    fn index_mut(&mut self, axis: Axis) -> &mut Fixed {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::W => &mut self.w,
        }
    }
}

impl Add for Vec4 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Vec4::new(self.x + other.x, self.y + other.y, self.z + other.z, self.w)
    }
}

impl Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Vec4::new(self.x - other.x, self.y - other.y, self.z - other.z, self.w)
    }
}

impl Mul<Fixed> for Vec4 {
    type Output = Self;
    #[inline]
    fn mul(self, factor: Fixed) -> Self {
        Vec4::new(self.x * factor, self.y * factor, self.z * factor, self.w)
    }
}

impl Neg for Vec4 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Vec4::new(-self.x, -self.y, -self.z, self.w)
    }
}
