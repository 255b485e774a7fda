//! Bounded bit selection
//!
//! Window of `out_width` bits starting at a signed offset into a source
//! vector. Positions that fall off either end take a fill value. The carry
//! builder does not use this; it lives here for consumers that shift carries
//! into place.

/// Select `source[offset + p]` for `p in 0..out_width`.
///
/// Positions below 0 read `fill_low`, positions at or past `source.len()`
/// read `fill_high`. All values are lane masks.
pub fn select_bits(
    source: &[u64],
    offset: i64,
    out_width: usize,
    fill_low: u64,
    fill_high: u64,
) -> Vec<u64> {
    let len = source.len() as i64;
    (0..out_width)
        .map(|p| {
            let idx = offset.saturating_add(p as i64);
            if idx < 0 {
                fill_low
            } else if idx >= len {
                fill_high
            } else {
                source[idx as usize]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_window() {
        let src = [1, 2, 3, 4];
        assert_eq!(select_bits(&src, 1, 2, 0, 0), vec![2, 3]);
        assert_eq!(select_bits(&src, 0, 4, 0, 0), src.to_vec());
    }

    #[test]
    fn test_fill_below_and_above() {
        let src = [5, 6];
        let low = 0;
        let high = u64::MAX;
        assert_eq!(
            select_bits(&src, -2, 6, low, high),
            vec![low, low, 5, 6, high, high]
        );
    }

    #[test]
    fn test_entirely_out_of_range() {
        assert_eq!(select_bits(&[7], 10, 2, 0, 9), vec![9, 9]);
        assert_eq!(select_bits(&[7], -10, 2, 8, 9), vec![8, 8]);
        assert!(select_bits(&[7], 0, 0, 0, 0).is_empty());
    }
}
