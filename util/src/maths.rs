//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Apply polynomial coefficients to a value.
///
/// Coefficients are ordered lowest power first, i.e. if there are 3
/// coefficients the result is `c[0] + c[1]*x + c[2]*x^2`.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    // Horner's scheme from the highest power down
    coeffs
        .iter()
        .rev()
        .fold(T::zero(), |acc, &c| acc * value + c)
}

/// Evaluate the first derivative of a polynomial (lowest power first) at a
/// value.
pub fn poly_deriv_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    let mut res = T::zero();

    for (power, &c) in coeffs.iter().enumerate().skip(1).rev() {
        res = res * value + c * T::from(power).unwrap_or_else(T::nan);
    }

    res
}

/// Wrap a signed index into the range `[0, len)`.
///
/// `len` must be non-zero.
pub fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

/// Get the yaw angle (rotation about Z) of an orientation quaternion.
pub fn yaw_from_quaternion<T>(x: T, y: T, z: T, w: T) -> T
where
    T: Float,
{
    let two = T::one() + T::one();
    let siny_cosp = two * (w * z + x * y);
    let cosy_cosp = T::one() - two * (y * y + z * z);

    siny_cosp.atan2(cosy_cosp)
}
