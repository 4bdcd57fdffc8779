//! Probe sequences over power-of-two slot arrays.
//!
//! A probe starts at `start` and visits `(start + step(s) * stride) & mask`
//! for `s = 0, 1, 2, ...` until the stop predicate accepts an index or
//! `2^size_exponent` candidates have been examined.

/// Offset function for a probe sequence.
pub trait Step {
    fn offset(s: usize) -> usize;

    /// Whether `offset(s) * stride` visits every residue modulo every power
    /// of two within one period.
    fn is_full_period(stride: usize) -> bool;
}

/// `step(s) = s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear;

/// `step(s) = s * s`.
///
/// Squares only reach a fraction of the residues modulo `2^e` for `e >= 2`,
/// so this sequence can report "full" while slots are still free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadratic;

/// `step(s) = s * (s + 1) / 2`.
///
/// Triangular numbers form a permutation modulo any power of two, and
/// multiplying by an odd stride preserves that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangular;

impl Step for Linear {
    #[inline(always)]
    fn offset(s: usize) -> usize {
        s
    }

    #[inline(always)]
    fn is_full_period(stride: usize) -> bool {
        stride & 1 == 1
    }
}

impl Step for Quadratic {
    #[inline(always)]
    fn offset(s: usize) -> usize {
        s.wrapping_mul(s)
    }

    #[inline(always)]
    fn is_full_period(_stride: usize) -> bool {
        false
    }
}

impl Step for Triangular {
    #[inline(always)]
    fn offset(s: usize) -> usize {
        // One of s, s + 1 is even; halve that one first so the product
        // only wraps where the true value does.
        if s & 1 == 0 {
            (s / 2).wrapping_mul(s.wrapping_add(1))
        } else {
            s.wrapping_mul(s.wrapping_add(1) / 2)
        }
    }

    #[inline(always)]
    fn is_full_period(stride: usize) -> bool {
        stride & 1 == 1
    }
}

/// Walk the probe sequence for `F` and return the first index accepted by
/// `stop`, or `None` once all `2^size_exponent` steps are spent.
///
/// `start` is masked into range before the first step.
#[inline]
pub fn probe<F, P>(start: usize, size_exponent: u32, stride: usize, mut stop: P) -> Option<usize>
where
    F: Step,
    P: FnMut(usize) -> bool,
{
    debug_assert!(
        size_exponent < usize::BITS,
        "size exponent {size_exponent} out of range"
    );

    let bound = 1usize << size_exponent;
    let mask = bound - 1;
    let start = start & mask;

    for s in 0..bound {
        let idx = start.wrapping_add(F::offset(s).wrapping_mul(stride)) & mask;
        if stop(idx) {
            return Some(idx);
        }
    }

    None
}

#[inline]
pub fn linear_probe<P>(start: usize, size_exponent: u32, stride: usize, stop: P) -> Option<usize>
where
    P: FnMut(usize) -> bool,
{
    probe::<Linear, P>(start, size_exponent, stride, stop)
}

#[inline]
pub fn quad_probe<P>(start: usize, size_exponent: u32, stride: usize, stop: P) -> Option<usize>
where
    P: FnMut(usize) -> bool,
{
    probe::<Quadratic, P>(start, size_exponent, stride, stop)
}

#[inline]
pub fn triangular_probe<P>(
    start: usize,
    size_exponent: u32,
    stride: usize,
    stop: P,
) -> Option<usize>
where
    P: FnMut(usize) -> bool,
{
    probe::<Triangular, P>(start, size_exponent, stride, stop)
}

/// Count the distinct indices `F` visits from slot 0 in one period and
/// check that every slot was reached.
///
/// O(2^size_exponent) time and space; meant for tests and config checks on
/// small tables, not the hot path.
pub fn covers_all_slots<F: Step>(size_exponent: u32, stride: usize) -> bool {
    let bound = 1usize << size_exponent;
    let mut seen = vec![false; bound];
    let mut distinct = 0usize;

    // Never stops, so every candidate is recorded.
    probe::<F, _>(0, size_exponent, stride, |idx| {
        if !seen[idx] {
            seen[idx] = true;
            distinct += 1;
        }
        false
    });

    distinct == bound
}
