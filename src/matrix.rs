//! Fixed-point 4x4 matrices
//!
//! Row-major homogeneous matrices with the translation in column 3. The
//! inverse goes through the classical adjugate / cofactor expansion; the
//! transform layer only reaches for it when a non-uniform scale invalidates
//! the cheap normal-matrix path.

use serde::{Deserialize, Serialize};

use crate::fixed::{self, Fixed};

/// Row-major 4x4 fixed-point matrix; `self.0[row][col]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mat4(pub [[Fixed; 4]; 4]);

impl Mat4 {
    pub const IDENTITY: Mat4 = {
        let mut rows = [[Fixed::ZERO; 4]; 4];
        rows[0][0] = Fixed::ONE;
        rows[1][1] = Fixed::ONE;
        rows[2][2] = Fixed::ONE;
        rows[3][3] = Fixed::ONE;
        Mat4(rows)
    };

    #[inline]
    pub const fn get(&self, row: usize, col: usize) -> Fixed {
        self.0[row][col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Fixed) {
        self.0[row][col] = value;
    }

    /// Standard matrix product `self x other`.
    pub fn multiply(&self, other: &Mat4) -> Mat4 {
        let mut result = Mat4::default();
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0i64;
                for lane in 0..4 {
                    sum += fixed::mul(self.0[row][lane].raw(), other.0[lane][col].raw()) as i64;
                }
                result.0[row][col] = Fixed(sum as i32);
            }
        }
        result
    }

    /// Component-wise scalar add.
    pub fn added(&self, value: Fixed) -> Mat4 {
        self.map(|entry| entry + value)
    }

    /// Component-wise scalar subtract.
    pub fn subtracted(&self, value: Fixed) -> Mat4 {
        self.map(|entry| entry - value)
    }

    /// Component-wise scalar multiply.
    pub fn scaled(&self, value: Fixed) -> Mat4 {
        self.map(|entry| entry * value)
    }

    /// Component-wise scalar divide; zero is a caller error.
    pub fn divided(&self, value: Fixed) -> Mat4 {
        self.map(|entry| entry / value)
    }

    pub fn transposed(&self) -> Mat4 {
        let mut result = Mat4::default();
        for row in 0..4 {
            for col in 0..4 {
                result.0[row][col] = self.0[col][row];
            }
        }
        result
    }

    /// Determinant by cofactor expansion along the first row.
    pub fn determinant(&self) -> Fixed {
        let mut det = 0i64;
        for col in 0..4 {
            let term = fixed::mul(self.0[0][col].raw(), self.minor(0, col).raw()) as i64;
            if col % 2 == 0 {
                det += term;
            } else {
                det -= term;
            }
        }
        Fixed(det as i32)
    }

    /// Inverse via the adjugate. The determinant gets a one-count nudge so a
    /// degenerate matrix degrades instead of dividing by zero, matching the
    /// pipeline's silent-guard policy.
    pub fn inverse(&self) -> Mat4 {
        let determinant = match self.determinant().raw() {
            -1 => 1,
            raw => raw + 1,
        };
        let mut result = Mat4::default();
        for row in 0..4 {
            for col in 0..4 {
                // adjugate: transposed cofactors
                let minor = self.minor(col, row).raw();
                let cofactor = if (row + col) % 2 == 0 { minor } else { -minor };
                result.0[row][col] = Fixed(fixed::div(cofactor, determinant));
            }
        }
        result
    }

    /// 3x3 minor determinant, excluding `skip_row` and `skip_col`.
    fn minor(&self, skip_row: usize, skip_col: usize) -> Fixed {
        let mut rows = [0usize; 3];
        let mut cols = [0usize; 3];
        let mut index = 0;
        for i in 0..4 {
            if i != skip_row {
                rows[index] = i;
                index += 1;
            }
        }
        index = 0;
        for i in 0..4 {
            if i != skip_col {
                cols[index] = i;
                index += 1;
            }
        }
        let at = |r: usize, c: usize| self.0[rows[r]][cols[c]].raw();
        let det2 = |a: i32, b: i32, c: i32, d: i32| fixed::mul(a, d) - fixed::mul(b, c);
        let mut det = fixed::mul(at(0, 0), det2(at(1, 1), at(1, 2), at(2, 1), at(2, 2))) as i64;
        det -= fixed::mul(at(0, 1), det2(at(1, 0), at(1, 2), at(2, 0), at(2, 2))) as i64;
        det += fixed::mul(at(0, 2), det2(at(1, 0), at(1, 1), at(2, 0), at(2, 1))) as i64;
        Fixed(det as i32)
    }

    fn map(&self, op: impl Fn(Fixed) -> Fixed) -> Mat4 {
        let mut result = Mat4::default();
        for row in 0..4 {
            for col in 0..4 {
                result.0[row][col] = op(self.0[row][col]);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{scale_matrix, translation_matrix, y_rotation_matrix};
    use crate::vector::Vec4;

    fn assert_close(a: &Mat4, b: &Mat4, tolerance: i32) {
        for row in 0..4 {
            for col in 0..4 {
                let diff = (a.0[row][col] - b.0[row][col]).abs().0;
                assert!(
                    diff <= tolerance,
                    "entry ({row},{col}) differs by {diff}: {:?} vs {:?}",
                    a.0[row][col],
                    b.0[row][col]
                );
            }
        }
    }

    #[test]
    fn test_identity_multiply() {
        let m = translation_matrix(Vec4::from_f32(1.0, 2.0, 3.0));
        assert_eq!(m.multiply(&Mat4::IDENTITY), m);
        assert_eq!(Mat4::IDENTITY.multiply(&m), m);
    }

    #[test]
    fn test_multiply_composes_translations() {
        let a = translation_matrix(Vec4::from_f32(1.0, 0.0, 0.0));
        let b = translation_matrix(Vec4::from_f32(0.0, 2.0, 0.0));
        let combined = a.multiply(&b);
        assert_eq!(combined.get(0, 3), Fixed::from_int(1));
        assert_eq!(combined.get(1, 3), Fixed::from_int(2));
    }

    #[test]
    fn test_transpose_roundtrip() {
        let m = y_rotation_matrix(Fixed::from_int(40));
        assert_eq!(m.transposed().transposed(), m);
        assert_eq!(m.transposed().get(0, 2), m.get(2, 0));
    }

    #[test]
    fn test_scalar_ops() {
        let m = Mat4::IDENTITY.scaled(Fixed::from_int(3));
        assert_eq!(m.get(0, 0), Fixed::from_int(3));
        assert_eq!(m.added(Fixed::ONE).get(0, 1), Fixed::ONE);
        assert_eq!(m.subtracted(Fixed::ONE).get(1, 1), Fixed::from_int(2));
        assert_eq!(m.divided(Fixed::from_int(3)).get(2, 2), Fixed::ONE);
    }

    #[test]
    fn test_determinant_of_scale() {
        let m = scale_matrix(Vec4::from_f32(2.0, 3.0, 1.0));
        let det = m.determinant();
        assert!((det - Fixed::from_int(6)).abs().0 <= 16);
    }

    #[test]
    fn test_inverse_roundtrip_nonuniform() {
        // rotation + non-uniform scale + translation, the case the normal
        // matrix path falls back to the adjugate for
        let m = translation_matrix(Vec4::from_f32(0.25, -0.5, 0.75))
            .multiply(&y_rotation_matrix(Fixed::from_int(30)))
            .multiply(&scale_matrix(Vec4::from_f32(1.0, 2.0, 0.5)));
        let twice = m.inverse().inverse();
        assert_close(&twice, &m, crate::fixed::FP_ONE / 20);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let m = y_rotation_matrix(Fixed::from_int(45))
            .multiply(&scale_matrix(Vec4::from_f32(2.0, 1.0, 1.0)));
        let point = Vec4::from_f32(1.0, 2.0, -1.0);
        let roundtrip = point.transformed(&m).transformed(&m.inverse());
        assert!((roundtrip.x - point.x).abs().0 <= crate::fixed::FP_ONE / 50);
        assert!((roundtrip.y - point.y).abs().0 <= crate::fixed::FP_ONE / 50);
        assert!((roundtrip.z - point.z).abs().0 <= crate::fixed::FP_ONE / 50);
    }
}
