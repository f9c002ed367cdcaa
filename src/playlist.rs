//! Row arithmetic for moving through the track list.

/// Row reached by moving `delta` rows from `current` in a list of `total`
/// rows. Rows are 1-based and wrap at both ends.
pub fn next_index(current: usize, total: usize, delta: isize) -> usize {
    let target = current as isize + delta;
    if target <= 0 {
        total
    } else if current >= total && delta > 0 {
        1
    } else {
        target as usize
    }
}
