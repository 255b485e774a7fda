//! Sequential ripple-carry reference
//!
//! Ground truth for the flat expansion: `carries[k]` is the carry into bit
//! `k`, with `carries[0] = cin` and `carries.len() == a.len() + 1`.

/// Ripple-propagate carries over lane masks.
pub fn ripple_carries(a: &[u64], b: &[u64], cin: u64) -> Vec<u64> {
    let width = a.len().min(b.len());
    let mut carries = Vec::with_capacity(width + 1);
    let mut c = cin;
    carries.push(c);
    for i in 0..width {
        c = (a[i] & b[i]) | (a[i] & c) | (b[i] & c);
        carries.push(c);
    }
    carries
}

/// Carry chain of a single scalar addition, bit `k` = carry into bit `k`.
pub fn ripple_carries_scalar(a: u64, b: u64, cin: bool, width: usize) -> u64 {
    let mut packed = cin as u64;
    let mut c = cin as u64;
    for i in 0..width.min(63) {
        let ai = (a >> i) & 1;
        let bi = (b >> i) & 1;
        c = (ai & bi) | (ai & c) | (bi & c);
        packed |= c << (i + 1);
    }
    packed
}
