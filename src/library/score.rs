//! Rating <-> score mapping.
//!
//! Ratings are the 0-255 values stored in popularity frames; scores are the
//! eleven half-star symbols shown to the user. The mapping is lossy one way
//! (many ratings share a score) and exact the other way (each score has one
//! canonical rating).

pub const SCORE_00: &str = "☆";
pub const SCORE_05: &str = "½";
pub const SCORE_10: &str = "★";
pub const SCORE_15: &str = "★½";
pub const SCORE_20: &str = "★★";
pub const SCORE_25: &str = "★★½";
pub const SCORE_30: &str = "★★★";
pub const SCORE_35: &str = "★★★½";
pub const SCORE_40: &str = "★★★★";
pub const SCORE_45: &str = "★★★★½";
pub const SCORE_50: &str = "★★★★★";

pub const RATING_00: u8 = 0;
pub const RATING_05: u8 = 13;
pub const RATING_10: u8 = 1;
pub const RATING_15: u8 = 54;
pub const RATING_20: u8 = 64;
pub const RATING_25: u8 = 118;
pub const RATING_30: u8 = 128;
pub const RATING_35: u8 = 186;
pub const RATING_40: u8 = 196;
pub const RATING_45: u8 = 242;
pub const RATING_50: u8 = 255;

/// Scores in ascending order, half a star apart.
pub const SCORES: [&str; 11] = [
    SCORE_00, SCORE_05, SCORE_10, SCORE_15, SCORE_20, SCORE_25, SCORE_30, SCORE_35, SCORE_40,
    SCORE_45, SCORE_50,
];

/// Canonical rating for each entry of [`SCORES`].
pub const RATINGS: [u8; 11] = [
    RATING_00, RATING_05, RATING_10, RATING_15, RATING_20, RATING_25, RATING_30, RATING_35,
    RATING_40, RATING_45, RATING_50,
];

/// Position of `rating` in [`SCORES`] (0 = no stars, 10 = five stars).
pub fn score_index(rating: u8) -> usize {
    match rating {
        0 => 0,
        // Rating 1 is the conventional one-star value, so it sorts above the half star.
        1 => 2,
        r if r <= RATING_05 => 1,
        r if r <= RATING_15 => 3,
        r if r <= RATING_20 => 4,
        r if r <= RATING_25 => 5,
        r if r <= RATING_30 => 6,
        r if r <= RATING_35 => 7,
        r if r <= RATING_40 => 8,
        r if r <= RATING_45 => 9,
        _ => 10,
    }
}

/// Human-friendly score for a 0-255 rating.
pub fn score(rating: u8) -> &'static str {
    SCORES[score_index(rating)]
}

/// Canonical rating for a score symbol; unknown symbols map to 0.
pub fn rating(score: &str) -> u8 {
    SCORES
        .iter()
        .position(|s| *s == score)
        .map(|i| RATINGS[i])
        .unwrap_or(RATING_00)
}
