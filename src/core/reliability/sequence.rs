//! 32 位回绕序号与时间戳的比较。
//! Wrap-around comparison of 32-bit sequence numbers and timestamps.
//!
//! The number space is treated as a circle: `a` is at-or-before `b` when the
//! forward distance from `a` to `b` is less than half the space.

/// Half of the 32-bit number space.
pub const HALF_RANGE: u32 = 1 << 31;

/// Returns true if `a` is at or before `b` on the circle.
///
/// 如果 `a` 在环上位于 `b` 之前或与其相等，则返回 true。
#[inline]
pub fn at_or_before(a: u32, b: u32) -> bool {
    b.wrapping_sub(a) < HALF_RANGE
}

/// Returns true if `a` is strictly before `b` on the circle.
///
/// 如果 `a` 在环上严格位于 `b` 之前，则返回 true。
#[inline]
pub fn before(a: u32, b: u32) -> bool {
    a != b && at_or_before(a, b)
}

/// The earlier of two numbers on the circle.
#[inline]
pub fn earliest(a: u32, b: u32) -> u32 {
    if at_or_before(a, b) { a } else { b }
}
