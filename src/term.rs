//! Term enumerator
//!
//! Fully expanding `c[i+1] = a[i]&b[i] | a[i]&c[i] | b[i]&c[i]` down to
//! `c[0] = cin` gives a flat OR of product terms. For width `w` there are
//! exactly `2^(w+1) - 1` of them, and each one has a canonical index.
//!
//! Indices are decoded MSB-first as a mixed-radix number. At bit position `i`
//! the radix is `2^(i+1) - 1` (the number of terms of a width-`i+1` subtree):
//!
//! - digit 0: factor `a[i]`, descend to position `i - 1`
//! - digit 1: factor `b[i]`, descend to position `i - 1`
//! - digit 2: factors `a[i] & b[i]`, stop
//!
//! Running off the bottom without a 2 appends the carry-in. Any digits after
//! the first 2 are never read.

use std::fmt;

use tracing::{debug, trace};

use crate::error::ConfigError;

/// Widest supported operand. The full builder visits about `2^(w+2)` terms.
pub const MAX_WIDTH: usize = 32;

/// Factor capacity of a single term.
pub const MAX_FACTORS: usize = MAX_WIDTH + 1;

/// Number of product terms in the width-`width` expansion.
///
/// Saturates at `u64::MAX` (exact for width 63) instead of overflowing.
#[inline]
pub fn term_count(width: usize) -> u64 {
    u32::try_from(width.saturating_add(1))
        .ok()
        .and_then(|shift| 1u64.checked_shl(shift))
        .map_or(u64::MAX, |n| n - 1)
}

fn check_width(width: usize) -> Result<(), ConfigError> {
    if width > MAX_WIDTH {
        return Err(ConfigError::WidthTooLarge {
            width,
            max: MAX_WIDTH,
        });
    }
    Ok(())
}

/// One AND input of a product term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    A(usize),
    B(usize),
    CarryIn,
}

impl Factor {
    #[inline(always)]
    fn value(self, a: &[u64], b: &[u64], cin: u64) -> u64 {
        match self {
            Factor::A(i) => a[i],
            Factor::B(i) => b[i],
            Factor::CarryIn => cin,
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::A(i) => write!(f, "a[{}]", i),
            Factor::B(i) => write!(f, "b[{}]", i),
            Factor::CarryIn => write!(f, "cin"),
        }
    }
}

/// How a term ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Last factor is the carry-in.
    CarryIn,
    /// Last two factors are `a[bit] & b[bit]`.
    Generate { bit: usize },
}

/// Mixed-radix digits of a term index, most significant position first.
///
/// Only the digits actually consumed are stored: decoding stops at the
/// first 2.
#[derive(Debug, Clone, Copy)]
pub struct DigitSequence {
    width: usize,
    digits: [u8; MAX_WIDTH],
    len: usize,
}

impl DigitSequence {
    /// Digits in decode order; `digits()[j]` belongs to position `width - 1 - j`.
    pub fn digits(&self) -> &[u8] {
        &self.digits[..self.len]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Bit position of the `j`-th decoded digit.
    #[inline]
    pub fn position(&self, j: usize) -> usize {
        self.width - 1 - j
    }

    /// True when decoding stopped on a generate digit.
    pub fn ends_in_generate(&self) -> bool {
        self.len > 0 && self.digits[self.len - 1] == 2
    }
}

/// Decode `index` into its digit sequence for a width-`width` expansion.
pub fn decode_digits(width: usize, index: u64) -> Result<DigitSequence, ConfigError> {
    check_width(width)?;
    let count = term_count(width);
    if index >= count {
        return Err(ConfigError::TermIndexOutOfRange {
            width,
            index,
            count,
        });
    }

    let mut seq = DigitSequence {
        width,
        digits: [0; MAX_WIDTH],
        len: 0,
    };

    let mut rest = index;
    for pos in (0..width).rev() {
        let radix = term_count(pos);
        let digit = (rest / radix) as u8;
        rest %= radix;
        seq.digits[seq.len] = digit;
        seq.len += 1;
        if digit == 2 {
            break;
        }
    }

    Ok(seq)
}

/// A product term: fixed-capacity factor list with an explicit length.
#[derive(Clone, Copy)]
pub struct Term {
    factors: [Factor; MAX_FACTORS],
    len: usize,
}

impl Term {
    fn empty() -> Self {
        Self {
            factors: [Factor::CarryIn; MAX_FACTORS],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, factor: Factor) {
        self.factors[self.len] = factor;
        self.len += 1;
    }

    /// Map decoded digits to factors.
    pub fn from_digits(seq: &DigitSequence) -> Self {
        let mut term = Self::empty();
        for (j, &digit) in seq.digits().iter().enumerate() {
            let pos = seq.position(j);
            match digit {
                0 => term.push(Factor::A(pos)),
                1 => term.push(Factor::B(pos)),
                _ => {
                    term.push(Factor::A(pos));
                    term.push(Factor::B(pos));
                    return term;
                }
            }
        }
        term.push(Factor::CarryIn);
        term
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Terminal form, or `None` for a factor list no index decodes to.
    pub fn terminal(&self) -> Option<Terminal> {
        match self.factors() {
            [.., Factor::CarryIn] => Some(Terminal::CarryIn),
            [.., Factor::A(i), Factor::B(j)] if i == j => Some(Terminal::Generate { bit: *i }),
            _ => None,
        }
    }

    /// AND of all factors, lane-parallel.
    #[inline]
    pub fn evaluate(&self, a: &[u64], b: &[u64], cin: u64) -> u64 {
        self.factors()
            .iter()
            .fold(u64::MAX, |acc, f| acc & f.value(a, b, cin))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.factors() == other.factors()
    }
}

impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.factors().hash(state);
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factors()).finish()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, factor) in self.factors().iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            write!(f, "{}", factor)?;
        }
        Ok(())
    }
}

/// Decode `index` straight to its term.
pub fn decode_term(width: usize, index: u64) -> Result<Term, ConfigError> {
    decode_digits(width, index).map(|seq| Term::from_digits(&seq))
}

/// Carry-out and generate bit for one width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthResult {
    pub carry: u64,
    /// `a[w-1] & b[w-1]`; `None` for width 0.
    pub generate: Option<u64>,
}

/// Enumerates and evaluates every product term of one width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermEnumerator {
    width: usize,
}

impl TermEnumerator {
    pub fn new(width: usize) -> Result<Self, ConfigError> {
        check_width(width)?;
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn term_count(&self) -> u64 {
        term_count(self.width)
    }

    /// Index of the generate term `a[w-1] & b[w-1]` (always the last one).
    pub fn generate_index(&self) -> Option<u64> {
        if self.width == 0 {
            None
        } else {
            Some(self.term_count() - 1)
        }
    }

    /// All terms in index order.
    pub fn terms(&self) -> Terms {
        Terms {
            width: self.width,
            next: 0,
            count: self.term_count(),
        }
    }

    /// OR-reduce all terms over the low `width` bits of `a` and `b`.
    ///
    /// Operand slices must hold exactly `width` lane masks.
    pub fn evaluate(&self, a: &[u64], b: &[u64], cin: u64) -> Result<WidthResult, ConfigError> {
        if a.len() != self.width || b.len() != self.width {
            return Err(ConfigError::OperandWidthMismatch {
                expected: self.width,
                a: a.len(),
                b: b.len(),
            });
        }

        let mut carry = 0u64;
        for (index, term) in self.terms() {
            let value = term.evaluate(a, b, cin);
            trace!(width = self.width, index, %term, value, "term");
            carry |= value;
        }

        let generate = match self.generate_index() {
            Some(index) => Some(decode_term(self.width, index)?.evaluate(a, b, cin)),
            None => None,
        };

        debug!(
            width = self.width,
            terms = self.term_count(),
            carry,
            "evaluated width"
        );

        Ok(WidthResult { carry, generate })
    }
}

/// Iterator over `(index, term)` pairs of one width.
#[derive(Debug, Clone)]
pub struct Terms {
    width: usize,
    next: u64,
    count: u64,
}

impl Iterator for Terms {
    type Item = (u64, Term);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        // Width was validated by the enumerator and index < count.
        let seq = decode_digits(self.width, index).ok()?;
        Some((index, Term::from_digits(&seq)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Terms {}
