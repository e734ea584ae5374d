//! Interval arithmetic over [`Interval`] and [`BoolInterval`].
//!
//! The result of each operation encloses every value the operation can take
//! over its inputs. `info` is the intersection of the inputs' flags; an
//! operation that is only defined on part of its input keeps `DEF_MIN` alone.
//! No outward rounding is applied.

use mx_core::value::info;
use mx_core::{BoolInterval, Interval};

fn combine(a: &Interval, b: &Interval) -> Option<u8> {
    let info = a.info & b.info;
    (info & info::DEF_MIN != 0).then_some(info)
}

fn hull(values: [f64; 4], info: u8) -> Interval {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Interval::new(min, max, info)
}

/// The whole real line, defined somewhere but not known to be defined everywhere.
fn everywhere_partial() -> Interval {
    Interval::new(f64::NEG_INFINITY, f64::INFINITY, info::DEF_MIN)
}

pub fn add(a: &Interval, b: &Interval) -> Interval {
    match combine(a, b) {
        Some(info) => Interval::new(a.min + b.min, a.max + b.max, info),
        None => Interval::undefined(),
    }
}

pub fn sub(a: &Interval, b: &Interval) -> Interval {
    match combine(a, b) {
        Some(info) => Interval::new(a.min - b.max, a.max - b.min, info),
        None => Interval::undefined(),
    }
}

pub fn mul(a: &Interval, b: &Interval) -> Interval {
    match combine(a, b) {
        Some(info) => hull(
            [a.min * b.min, a.max * b.min, a.min * b.max, a.max * b.max],
            info,
        ),
        None => Interval::undefined(),
    }
}

pub fn div(a: &Interval, b: &Interval) -> Interval {
    let Some(info) = combine(a, b) else {
        return Interval::undefined();
    };
    if b.min > 0.0 || b.max < 0.0 {
        hull(
            [a.min / b.min, a.max / b.min, a.min / b.max, a.max / b.max],
            info,
        )
    } else {
        everywhere_partial()
    }
}

pub fn neg(a: &Interval) -> Interval {
    if !a.is_defined() {
        return Interval::undefined();
    }
    Interval::new(-a.max, -a.min, a.info)
}

pub fn abs(a: &Interval) -> Interval {
    if !a.is_defined() {
        return Interval::undefined();
    }
    if a.min >= 0.0 {
        *a
    } else if a.max <= 0.0 {
        Interval::new(-a.max, -a.min, a.info)
    } else {
        Interval::new(0.0, a.max.max(-a.min), a.info)
    }
}

pub fn exp(a: &Interval) -> Interval {
    if !a.is_defined() {
        return Interval::undefined();
    }
    Interval::new(a.min.exp(), a.max.exp(), a.info)
}

pub fn ln(a: &Interval) -> Interval {
    if !a.is_defined() || a.max <= 0.0 {
        return Interval::undefined();
    }
    if a.min <= 0.0 {
        Interval::new(f64::NEG_INFINITY, a.max.ln(), info::DEF_MIN)
    } else {
        Interval::new(a.min.ln(), a.max.ln(), a.info)
    }
}

pub fn sqrt(a: &Interval) -> Interval {
    if !a.is_defined() || a.max < 0.0 {
        return Interval::undefined();
    }
    if a.max == 0.0 {
        let info = if a.min == 0.0 { a.info } else { info::DEF_MIN };
        return Interval::new(0.0, 0.0, info);
    }
    if a.min < 0.0 {
        Interval::new(0.0, a.max.sqrt(), info::DEF_MIN)
    } else {
        Interval::new(a.min.sqrt(), a.max.sqrt(), a.info)
    }
}

/// `a^n` for an integer `n`.
pub fn powi(a: &Interval, n: i32) -> Interval {
    if !a.is_defined() {
        return Interval::undefined();
    }
    if n == 0 {
        return Interval::new(1.0, 1.0, a.info);
    }
    if n < 0 {
        let positive = powi(a, n.saturating_neg());
        return div(&Interval::new(1.0, 1.0, a.info), &positive);
    }
    let (lo, hi) = (a.min.powi(n), a.max.powi(n));
    if n % 2 == 1 || a.min >= 0.0 {
        Interval::new(lo, hi, a.info)
    } else if a.max <= 0.0 {
        Interval::new(hi, lo, a.info)
    } else {
        Interval::new(0.0, lo.max(hi), a.info)
    }
}

/// `a^b` where `b` holds integers. A single exponent is exact; a range of
/// exponents gives the whole line.
pub fn pow(a: &Interval, b: &Interval) -> Interval {
    let Some(info) = combine(a, b) else {
        return Interval::undefined();
    };
    if b.min != b.max || b.min.fract() != 0.0 || b.min.abs() > i32::MAX as f64 {
        return everywhere_partial();
    }
    let mut result = powi(a, b.min as i32);
    if result.is_defined() {
        result.info &= info;
    }
    result
}

/// [`pow`] for integer bases. A negative exponent truncates like integer
/// division: 1 and -1 keep their power, every other base gives 0.
pub fn int_pow(a: &Interval, b: &Interval) -> Interval {
    let Some(flags) = combine(a, b) else {
        return Interval::undefined();
    };
    if b.min != b.max || b.min.fract() != 0.0 {
        return everywhere_partial();
    }
    if b.min >= 0.0 {
        return pow(a, b);
    }
    let (lo, hi) = (a.min.ceil(), a.max.floor());
    let minus_one = if b.min % 2.0 == 0.0 { 1.0 } else { -1.0 };
    let reachable = [
        (lo <= 1.0 && 1.0 <= hi).then_some(1.0),
        (lo <= -1.0 && -1.0 <= hi).then_some(minus_one),
        ((lo <= 0.0 && 0.0 <= hi) || lo <= -2.0 || hi >= 2.0).then_some(0.0),
    ];
    let (min, max) = reachable
        .into_iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), x| {
            (min.min(x), max.max(x))
        });
    if min > max {
        return Interval::undefined();
    }
    // {0, 1} has no values in between
    let flags = if min == max { flags } else { flags & !info::CONT };
    Interval::new(min, max, flags)
}

pub fn less(a: &Interval, b: &Interval) -> BoolInterval {
    let Some(info) = combine(a, b) else {
        return BoolInterval::undefined();
    };
    let (min, max) = if a.max < b.min {
        (true, true)
    } else if a.min >= b.max {
        (false, false)
    } else {
        (false, true)
    };
    BoolInterval::new(min, max, info)
}

pub fn greater(a: &Interval, b: &Interval) -> BoolInterval {
    less(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(min: f64, max: f64) -> Interval {
        Interval::range(min, max)
    }

    #[test]
    fn basic_arithmetic_encloses_results() {
        assert_eq!(add(&range(1.0, 2.0), &range(-1.0, 3.0)), range(0.0, 5.0));
        assert_eq!(sub(&range(1.0, 2.0), &range(-1.0, 3.0)), range(-2.0, 3.0));
        assert_eq!(mul(&range(-2.0, 3.0), &range(4.0, 5.0)), range(-10.0, 15.0));
        assert_eq!(div(&range(1.0, 2.0), &range(2.0, 4.0)), range(0.25, 1.0));
        assert_eq!(neg(&range(1.0, 2.0)), range(-2.0, -1.0));
    }

    #[test]
    fn division_through_zero_is_partially_defined() {
        let result = div(&range(1.0, 2.0), &range(-1.0, 1.0));
        assert_eq!(result.min, f64::NEG_INFINITY);
        assert_eq!(result.max, f64::INFINITY);
        assert!(result.def_min());
        assert!(!result.def_max());
    }

    #[test]
    fn undefined_inputs_propagate() {
        let undefined = Interval::undefined();
        assert!(!add(&undefined, &range(0.0, 1.0)).is_defined());
        assert!(!mul(&range(0.0, 1.0), &undefined).is_defined());
        assert!(!less(&undefined, &range(0.0, 1.0)).is_defined());
    }

    #[test]
    fn even_powers_fold_at_zero() {
        assert_eq!(powi(&range(-1.0, 2.0), 2), range(0.0, 4.0));
        assert_eq!(powi(&range(-3.0, -2.0), 2), range(4.0, 9.0));
        assert_eq!(powi(&range(-2.0, 1.0), 3), range(-8.0, 1.0));
        assert_eq!(powi(&range(2.0, 4.0), -1), range(0.25, 0.5));
        assert_eq!(pow(&range(2.0, 3.0), &Interval::point(2.0)), range(4.0, 9.0));
        assert!(!pow(&range(2.0, 3.0), &range(1.0, 2.0)).def_max());
    }

    #[test]
    fn negative_integer_exponents_truncate() {
        let minus_one = Interval::point(-1.0);
        assert_eq!(int_pow(&Interval::point(2.0), &minus_one), Interval::point(0.0));
        assert_eq!(int_pow(&Interval::point(0.0), &minus_one), Interval::point(0.0));
        assert_eq!(int_pow(&Interval::point(-1.0), &minus_one), Interval::point(-1.0));
        assert_eq!(
            int_pow(&Interval::point(-1.0), &Interval::point(-2.0)),
            Interval::point(1.0)
        );

        let spread = int_pow(&range(-2.0, 2.0), &minus_one);
        assert_eq!((spread.min, spread.max), (-1.0, 1.0));
        assert!(spread.is_defined());
        assert!(!spread.cont());

        assert_eq!(int_pow(&range(2.0, 3.0), &Interval::point(2.0)), range(4.0, 9.0));
        assert!(!int_pow(&range(2.0, 3.0), &range(-1.0, 1.0)).def_max());
    }

    #[test]
    fn partial_domains() {
        let root = sqrt(&range(-4.0, 4.0));
        assert_eq!((root.min, root.max, root.info), (0.0, 2.0, info::DEF_MIN));
        assert!(!sqrt(&range(-4.0, -1.0)).is_defined());

        let log = ln(&range(0.0, 1.0));
        assert_eq!(log.max, 0.0);
        assert!(!log.def_max());
        assert_eq!(abs(&range(-3.0, 2.0)), range(0.0, 3.0));
    }

    #[test]
    fn comparisons_can_be_indeterminate() {
        assert_eq!(less(&range(0.0, 1.0), &range(2.0, 3.0)), BoolInterval::TRUE);
        assert_eq!(less(&range(2.0, 3.0), &range(0.0, 1.0)), BoolInterval::FALSE);
        assert_eq!(
            less(&range(0.0, 2.0), &range(1.0, 3.0)),
            BoolInterval::INDETERMINATE
        );
        assert_eq!(greater(&range(2.0, 3.0), &range(0.0, 1.0)), BoolInterval::TRUE);
    }
}
