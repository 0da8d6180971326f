//! Fixed-point scalar math
//!
//! Every quantity in the pipeline is a Q15 fixed-point number: an `i32`
//! holding the real value scaled by `FP_ONE` (1 << 15). All arithmetic
//! rounds to nearest through `i64` intermediates so repeated multiplies in
//! the pixel loops stay deterministic across platforms.
//!
//! Trigonometry works in fixed-point *degrees* and resolves through a
//! quarter-wave lookup table with quadrant folding, so `sin`/`cos` never
//! touch the FPU at runtime.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Bit position of the binary point.
pub const FP_BIT: u32 = 15;

/// Raw representation of 1.0 (4096ths would be too coarse; 1/32768 steps).
pub const FP_ONE: i32 = 1 << FP_BIT;

/// Raw representation of 0.5, used for round-to-nearest.
pub const FP_HALF: i32 = FP_ONE >> 1;

/// pi / 180 at Q15 scale.
pub const FP_DEGREE_RAD: i32 = 572;

/// 180 / pi at Q15 scale.
pub const FP_RAD_DEGREE: i32 = 1877468;

// =============================================================================
// Raw-lane helpers
// =============================================================================
//
// The rasterizer inner loops run on raw `i32` lanes where values deliberately
// change scale (edge accumulators carry FP_BIT extra bits, attribute packers
// choose their own shift). These helpers are the only multiply/divide used on
// raw lanes; `Fixed`'s operators delegate to them.

/// Fixed-point multiply of two raw Q15 values, rounded to nearest.
#[inline]
pub const fn mul(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64 + FP_HALF as i64) >> FP_BIT) as i32
}

/// Fixed-point divide of two raw Q15 values.
///
/// Dividing by zero is a caller error: every call site in the pipeline
/// substitutes 1 for a zero denominator before calling (slopes, attenuation,
/// perspective divide). There is no internal guard.
#[inline]
pub const fn div(dividend: i32, divisor: i32) -> i32 {
    (((dividend as i64) << FP_BIT) / divisor as i64) as i32
}

// =============================================================================
// Fixed scalar
// =============================================================================

/// Q15 fixed-point scalar.
///
/// The newtype keeps raw integers and fixed-point values apart at compile
/// time; `from_int`/`to_i32`/`raw` are the explicit crossings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FP_ONE);
    pub const HALF: Fixed = Fixed(FP_HALF);

    /// Create from a whole number.
    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Fixed(value << FP_BIT)
    }

    /// Create from an `f32`, rounded to the nearest representable value.
    ///
    /// Scene ingestion and tests only; the per-frame path never converts.
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Fixed((value * FP_ONE as f32).round() as i32)
    }

    /// Whole part, truncated toward negative infinity.
    #[inline]
    pub const fn to_i32(self) -> i32 {
        self.0 >> FP_BIT
    }

    /// Convert to `f32` (tests and diagnostics).
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / FP_ONE as f32
    }

    /// Raw Q15 representation.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Fixed(self.0.abs())
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Fixed(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Fixed(self.0.max(other.0))
    }

    /// Clamp into `[min, max]`.
    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Fixed(self.0.clamp(min.0, max.0))
    }

    /// Wrap into the half-open range `[min, max)`.
    pub fn wrap(self, min: Self, max: Self) -> Self {
        let range = (max.0 - min.0) as i64;
        let value = (self.0 - min.0) as i64;
        Fixed(min.0 + (((value % range) + range) % range) as i32)
    }

    /// Square root. Negative input yields zero.
    ///
    /// Digit-by-digit binary search finds the whole part, then the
    /// fractional part is refined linearly in 1/128 steps.
    pub fn sqrt(self) -> Self {
        sqrt_i64(self.0 as i64)
    }

    /// Raise to a fixed-point power by squaring on the whole part of `exp`.
    pub fn pow(self, exp: Fixed) -> Self {
        let mut exp = exp.0 >> FP_BIT;
        let mut base = self.0 as i64;
        let mut result = FP_ONE as i64;
        while exp != 0 {
            if (exp & 1) == 1 {
                result = (result * base + FP_HALF as i64) >> FP_BIT;
            }
            exp >>= 1;
            base = (base * base + FP_HALF as i64) >> FP_BIT;
        }
        Fixed(result as i32)
    }

    /// Degrees to radians; trigonometry here works in degrees, this is
    /// for collaborators that think in radians.
    pub fn to_radians(self) -> Self {
        Fixed(mul(self.0, FP_DEGREE_RAD))
    }

    /// Radians to degrees.
    pub fn to_degrees(self) -> Self {
        Fixed(mul(self.0, FP_RAD_DEGREE))
    }

    /// Sine of an angle given in fixed-point degrees.
    pub fn sin(self) -> Self {
        let degrees = (((self.to_i32() % 360) + 360) % 360) as usize;
        let folded = degrees % 90;
        Fixed(match degrees {
            0..=89 => SIN_LUT[folded],
            90..=179 => SIN_LUT[90 - folded],
            180..=269 => -SIN_LUT[folded],
            _ => -SIN_LUT[90 - folded],
        })
    }

    /// Cosine of an angle given in fixed-point degrees.
    pub fn cos(self) -> Self {
        let degrees = (((self.to_i32() % 360) + 360) % 360) as usize;
        let folded = degrees % 90;
        Fixed(match degrees {
            0..=89 => SIN_LUT[90 - folded],
            90..=179 => -SIN_LUT[folded],
            180..=269 => -SIN_LUT[90 - folded],
            _ => SIN_LUT[folded],
        })
    }

    /// Tangent of an angle given in fixed-point degrees.
    ///
    /// Sine stays within one, so the numerator shift cannot overflow.
    pub fn tan(self) -> Self {
        Fixed(div(self.sin().0, self.cos().0))
    }

    /// Angle in fixed-point degrees whose sine is `self`, in -90..=90.
    pub fn asin(self) -> Self {
        let degrees = lut_search(self.0.abs());
        if self.0 >= 0 {
            Fixed::from_int(degrees)
        } else {
            -Fixed::from_int(degrees)
        }
    }

    /// Angle in fixed-point degrees whose cosine is `self`, in 0..=180.
    pub fn acos(self) -> Self {
        let degrees = lut_search(self.0.abs());
        if self.0 < 0 {
            Fixed::from_int(90 + degrees)
        } else {
            Fixed::from_int(90 - degrees)
        }
    }
}

/// Square root of a raw squared magnitude (`i64` because squared lengths
/// overflow `i32`).
pub fn sqrt_i64(number: i64) -> Fixed {
    let whole = (number >> FP_BIT) as i32;
    if whole < 0 {
        return Fixed::ZERO;
    }
    // whole part, one bit at a time
    let mut check = 1 << 15;
    let mut guess: i32 = check;
    for _ in 0..16 {
        if guess as i64 * guess as i64 > whole as i64 {
            guess ^= check;
        }
        check >>= 1;
        if check == 0 {
            break;
        }
        guess |= check;
    }
    // fractional part, 1/128 steps
    let mut result = (guess as i64) << FP_BIT;
    let increment = (FP_ONE >> 7) as i64;
    while (result * result + FP_HALF as i64) >> FP_BIT < number {
        result += increment;
    }
    result -= increment;
    Fixed(result as i32)
}

/// Deterministic pseudo-random scramble of `seed`.
#[inline]
pub const fn random(seed: i32) -> i32 {
    seed.wrapping_mul(1103515245).wrapping_add(12345)
}

/// Pseudo-random fixed value wrapped into `[min, max)`.
pub fn random_range(seed: i32, min: Fixed, max: Fixed) -> Fixed {
    Fixed(random(seed)).wrap(min, max)
}

fn lut_search(value: i32) -> i32 {
    for degrees in 1..SIN_LUT.len() {
        let below = SIN_LUT[degrees - 1];
        let above = SIN_LUT[degrees];
        if value > below && value <= above {
            // snap to whichever table neighbour is closer
            let half = (above - below) >> 1;
            if value < below + half {
                return degrees as i32 - 1;
            }
            return degrees as i32;
        }
    }
    0
}

impl Add for Fixed {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Fixed(self.0.wrapping_add(other.0))
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Fixed(self.0.wrapping_sub(other.0))
    }
}

impl Mul for Fixed {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        Fixed(mul(self.0, other.0))
    }
}

impl Div for Fixed {
    type Output = Self;
    #[inline]
    fn div(self, other: Self) -> Self {
        Fixed(div(self.0, other.0))
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Fixed(-self.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.wrapping_add(other.0);
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.wrapping_sub(other.0);
    }
}

// =============================================================================
// Quarter-wave sine table
// =============================================================================

/// Sine of 0..=90 degrees at Q15 scale, generated at compile time.
static SIN_LUT: [i32; 91] = generate_sin_lut();

const fn generate_sin_lut() -> [i32; 91] {
    let mut table = [0i32; 91];
    let mut degrees = 0;
    while degrees < 91 {
        let radians = degrees as f64 * 3.14159265358979323846 / 180.0;
        table[degrees] = (taylor_sin(radians) * FP_ONE as f64 + 0.5) as i32;
        degrees += 1;
    }
    table
}

/// Taylor series sine, accurate to well below one LUT step on 0..=pi/2.
const fn taylor_sin(x: f64) -> f64 {
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;
    let x11 = x9 * x2;
    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362880.0 - x11 / 39916800.0
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Fixed::from_int(1), Fixed::ONE);
        assert_eq!(Fixed::from_int(-3).to_i32(), -3);
        assert_eq!(Fixed::from_f32(0.5), Fixed::HALF);
        assert!((Fixed::from_f32(1.25).to_f32() - 1.25).abs() < 0.001);
    }

    #[test]
    fn test_multiply_divide_roundtrip() {
        // divide(multiply(a, b), b) returns a within one fractional unit
        let values = [
            Fixed::from_f32(0.125),
            Fixed::from_f32(1.5),
            Fixed::from_f32(-2.75),
            Fixed::from_int(10),
            Fixed::from_f32(-0.03),
        ];
        for &a in &values {
            for &b in &values {
                let roundtrip = (a * b) / b;
                assert!(
                    (roundtrip - a).abs().0 <= 2,
                    "{} * {} / {} = {}",
                    a.to_f32(),
                    b.to_f32(),
                    b.to_f32(),
                    roundtrip.to_f32()
                );
            }
        }
    }

    #[test]
    fn test_multiply_rounds_to_nearest() {
        // 0.5 * 0.5 must give exactly 0.25, not truncate low bits away
        let quarter = Fixed::HALF * Fixed::HALF;
        assert_eq!(quarter, Fixed::from_f32(0.25));
    }

    #[test]
    fn test_sin_cos_key_angles() {
        assert_eq!(Fixed::from_int(0).sin(), Fixed::ZERO);
        assert_eq!(Fixed::from_int(90).sin(), Fixed::ONE);
        assert_eq!(Fixed::from_int(180).sin(), Fixed::ZERO);
        assert_eq!(Fixed::from_int(270).sin(), -Fixed::ONE);
        assert_eq!(Fixed::from_int(0).cos(), Fixed::ONE);
        assert_eq!(Fixed::from_int(90).cos(), Fixed::ZERO);
        assert_eq!(Fixed::from_int(180).cos(), -Fixed::ONE);
        assert!((Fixed::from_int(30).sin() - Fixed::HALF).abs().0 <= 1);
        assert!((Fixed::from_int(60).cos() - Fixed::HALF).abs().0 <= 1);
    }

    #[test]
    fn test_sin_cos_pythagorean_identity() {
        // sin^2 + cos^2 stays within LUT quantization of one
        for degrees in (-360..=720).step_by(7) {
            let angle = Fixed::from_int(degrees);
            let identity = angle.sin() * angle.sin() + angle.cos() * angle.cos();
            assert!(
                (identity - Fixed::ONE).abs().0 <= 8,
                "identity off at {} degrees: {}",
                degrees,
                identity.to_f32()
            );
        }
    }

    #[test]
    fn test_sin_cos_periodicity() {
        for degrees in (0..360).step_by(13) {
            let angle = Fixed::from_int(degrees);
            let wrapped = Fixed::from_int(degrees + 360);
            let negative = Fixed::from_int(degrees - 360);
            assert_eq!(angle.sin(), wrapped.sin());
            assert_eq!(angle.sin(), negative.sin());
            assert_eq!(angle.cos(), wrapped.cos());
            assert_eq!(angle.cos(), negative.cos());
        }
    }

    #[test]
    fn test_asin_acos() {
        assert_eq!(Fixed::ONE.asin(), Fixed::from_int(90));
        assert_eq!(Fixed::from_int(30).sin().asin(), Fixed::from_int(30));
        assert_eq!((-Fixed::from_int(30).sin()).asin(), Fixed::from_int(-30));
        assert_eq!(Fixed::from_int(60).cos().acos(), Fixed::from_int(60));
        assert_eq!((-Fixed::from_int(60).cos()).acos(), Fixed::from_int(120));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(Fixed::from_int(0).sqrt(), Fixed::ZERO);
        assert_eq!(Fixed::from_int(-4).sqrt(), Fixed::ZERO);
        // the fractional refinement settles one 1/128 step below exact squares
        let two = Fixed::from_int(4).sqrt();
        assert!((two - Fixed::from_int(2)).abs().0 <= FP_ONE >> 6);
        let root = Fixed::from_f32(2.0).sqrt();
        assert!((root.to_f32() - 1.41421).abs() < 0.01);
    }

    #[test]
    fn test_pow() {
        let eight = Fixed::from_int(2).pow(Fixed::from_int(3));
        assert!((eight - Fixed::from_int(8)).abs().0 <= 4);
        assert_eq!(Fixed::from_int(5).pow(Fixed::ZERO), Fixed::ONE);
        // fractional exponents use the whole part only
        assert_eq!(
            Fixed::from_int(3).pow(Fixed::from_f32(2.9)),
            Fixed::from_int(3).pow(Fixed::from_int(2))
        );
    }

    #[test]
    fn test_degree_radian_roundtrip() {
        let degrees = Fixed::from_int(180);
        let radians = degrees.to_radians();
        assert!((radians.to_f32() - std::f32::consts::PI).abs() < 0.01);
        let back = radians.to_degrees();
        assert!((back - degrees).abs().0 < FP_ONE / 2, "{}", back.to_f32());
    }

    #[test]
    fn test_wrap_and_clamp() {
        let min = Fixed::ZERO;
        let max = Fixed::from_int(360);
        assert_eq!(Fixed::from_int(400).wrap(min, max), Fixed::from_int(40));
        assert_eq!(Fixed::from_int(-20).wrap(min, max), Fixed::from_int(340));
        assert_eq!(Fixed::from_int(5).clamp(min, Fixed::ONE), Fixed::ONE);
        assert_eq!(Fixed::from_int(-5).clamp(min, Fixed::ONE), Fixed::ZERO);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = random(12345);
        let b = random(12345);
        assert_eq!(a, b);
        assert_ne!(a, random(a));
        let value = random_range(99, Fixed::ZERO, Fixed::from_int(10));
        assert!(value >= Fixed::ZERO && value < Fixed::from_int(10));
    }
}
