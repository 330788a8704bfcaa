//! Q1.6 fixed-point arithmetic.
//!
//! The 8-bit inference path stores every cell as a signed Q1.6 number: one
//! sign/integer bit and six fractional bits, covering roughly `[-2.0, 2.0)`.
//! The scale between `f32` and Q1.6 is the global constant [`SCALE`] (64) and
//! must match between the producer and consumer of any persisted weight file.
//!
//! Converting a float costs up to half an LSB, so any test comparing float
//! and fixed-point kernel outputs has to tolerate at least `1/64` (~0.0156)
//! absolute error per cell.

/// Number of fractional bits in a Q1.6 cell.
pub const FRAC_BITS: u32 = 6;

/// Global float <-> fixed scale factor, `2^FRAC_BITS`.
pub const SCALE: i32 = 1 << FRAC_BITS;

/// The Q1.6 representation of 1.0.
pub const ONE: i8 = SCALE as i8;

/// Q1.6 product of `a` and `b`.
///
/// The product is formed in a wide integer, rescaled by an arithmetic right
/// shift of [`FRAC_BITS`], and rounded half-up by adding back bit 5 of the
/// raw product (the most significant discarded bit). The result saturates at
/// the i8 range.
///
/// The rounding rule is load-bearing: all fixed-point reference vectors in
/// the tests assume round-half-up, not round-half-even.
#[inline]
pub fn mult(a: i8, b: i8) -> i8 {
    let r = a as i32 * b as i32;
    let rounded = (r >> FRAC_BITS) + ((r >> (FRAC_BITS - 1)) & 1);
    rounded.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

/// Convert a float to Q1.6: `round(x * 64)`, saturated at the i8 range.
#[inline]
pub fn from_f32(x: f32) -> i8 {
    (x * SCALE as f32)
        .round()
        .clamp(i8::MIN as f32, i8::MAX as f32) as i8
}

/// Convert a Q1.6 cell back to float: `fx / 64`.
#[inline]
pub fn to_f32(fx: i8) -> f32 {
    fx as f32 / SCALE as f32
}

/// Check two fixed-point vectors for equality within a tolerance.
///
/// Equal means `|a[i] - b[i]| < tolerance` for every element.
///
/// Panics if the lengths differ.
pub fn approx_eq(a: &[i8], b: &[i8], tolerance: i8) -> bool {
    assert_eq!(
        a.len(),
        b.len(),
        "vector len {} does not match vector len {}",
        a.len(),
        b.len()
    );
    a.iter()
        .zip(b)
        .all(|(&x, &y)| (x as i16 - y as i16).abs() < tolerance as i16)
}
