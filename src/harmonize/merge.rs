//! Joining the pre-split and post-split series at a strict year cutoff.

use crate::domain::HarmonizedPoint;

/// Concatenate `pre` points with `year < split_year` and `post` points with
/// `year >= split_year`, sorted by year.
///
/// The cutoff guarantees no year is drawn from both sources. Duplicate years
/// within one source keep their first occurrence.
pub fn merge_series(pre_split: &[HarmonizedPoint], post_split: &[HarmonizedPoint], split_year: i32) -> Vec<HarmonizedPoint> {
    let mut merged: Vec<HarmonizedPoint> = pre_split
        .iter()
        .filter(|p| p.year < split_year)
        .chain(post_split.iter().filter(|p| p.year >= split_year))
        .cloned()
        .collect();

    // Stable sort keeps the first occurrence ahead of any repeat of the same year.
    merged.sort_by_key(|p| p.year);
    merged.dedup_by_key(|p| p.year);
    merged
}
