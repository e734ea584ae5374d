//! Lenient accessors used inside evaluators. A value of the wrong kind reads
//! as undefined rather than failing, matching how undefinedness is data.

use mx_core::{BoolInterval, Interval, Value};
use num_complex::Complex64;

pub(crate) fn real(value: &Value) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

pub(crate) fn int(value: &Value) -> i64 {
    value.as_int().unwrap_or(0)
}

pub(crate) fn boolean(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

pub(crate) fn complex(value: &Value) -> Complex64 {
    match value {
        Value::Complex(z) => *z,
        other => Complex64::new(real(other), 0.0),
    }
}

pub(crate) fn interval(value: &Value) -> Interval {
    value.as_interval().copied().unwrap_or_else(Interval::undefined)
}

/// Overwrites the destination in place when it already holds an interval.
pub(crate) fn set_interval(dst: &mut Value, i: Interval) {
    if let Some(out) = dst.as_interval_mut() {
        out.set(i.min, i.max, i.info);
        return;
    }
    *dst = Value::Interval(i);
}

pub(crate) fn set_complex(dst: &mut Value, z: Complex64) {
    match dst {
        Value::Complex(out) => *out = z,
        other => *other = Value::Complex(z),
    }
}

pub(crate) fn set_bool_interval(dst: &mut Value, b: BoolInterval) {
    match dst {
        Value::BoolInterval(out) => *out = b,
        other => *other = Value::BoolInterval(b),
    }
}
