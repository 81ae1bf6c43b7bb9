//! Fixed-point angle helpers
//!
//! Angles are tenths of a degree (`x10`), so 12.5° is `125`.

/// One full turn in tenths of a degree
pub const FULL_TURN_X10: i32 = 3600;

/// Half a turn in tenths of a degree
pub const HALF_TURN_X10: i32 = 1800;

/// Normalize an angle into (-1800, 1800]
pub fn wrap180_x10(angle_x10: i32) -> i32 {
    let wrapped = angle_x10.rem_euclid(FULL_TURN_X10);
    if wrapped > HALF_TURN_X10 {
        wrapped - FULL_TURN_X10
    } else {
        wrapped
    }
}

/// Signed shortest difference `to - from`, wrapped
pub fn angle_diff_x10(to_x10: i32, from_x10: i32) -> i32 {
    wrap180_x10(to_x10.wrapping_sub(from_x10))
}

/// Sign of an error, treating zero as positive
pub(crate) fn sign_of(value: i32) -> i32 {
    if value < 0 {
        -1
    } else {
        1
    }
}
