//! Lane packing helpers
//!
//! Every signal is a `u64` bitmask: bit `L` holds the signal's value in
//! independent test vector `L`, so one evaluation covers up to 64 additions.

/// Maximum number of lanes carried by one mask.
pub const MAX_LANES: usize = 64;

/// Mask with the low `lanes` bits set.
#[inline]
pub fn lane_mask(lanes: usize) -> u64 {
    if lanes >= MAX_LANES {
        u64::MAX
    } else {
        (1u64 << lanes) - 1
    }
}

/// Transpose per-lane integers into per-bit lane masks.
///
/// `values[L]` is the operand in lane `L`; the result has `width` masks where
/// mask `i` collects bit `i` of every lane. Lanes past 64 are ignored.
pub fn pack_lanes(values: &[u64], width: usize) -> Vec<u64> {
    let mut masks = vec![0u64; width];

    for (lane, &lane_value) in values.iter().enumerate() {
        if lane >= MAX_LANES {
            break;
        }
        for (bit, mask) in masks.iter_mut().enumerate() {
            if bit < 64 && ((lane_value >> bit) & 1) == 1 {
                *mask |= 1 << lane;
            }
        }
    }

    masks
}

/// Inverse of [`pack_lanes`]: rebuild `lanes` integers from per-bit masks.
pub fn unpack_lanes(masks: &[u64], lanes: usize) -> Vec<u64> {
    let lanes = lanes.min(MAX_LANES);
    (0..lanes)
        .map(|lane| {
            masks
                .iter()
                .take(64)
                .enumerate()
                .fold(0u64, |acc, (bit, &mask)| acc | (((mask >> lane) & 1) << bit))
        })
        .collect()
}
