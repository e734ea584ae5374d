//! `+ - * / ^` and unary `-`.
//!
//! Overloads are registered narrowest first (int, then real, then complex)
//! so that exact matches and single promotions resolve as expected.

use crate::interval;
use crate::types::{COMPLEX, INT, INTERVAL_INT, INTERVAL_REAL, REAL};
use crate::values;
use mx_core::{Environment, EvaluationMode, EvaluatorSpec, Interval, OperatorSpec, Result, Value};
use num_complex::Complex64;

const NORMAL: &str = EvaluationMode::NORMAL;
const INTERVAL: &str = EvaluationMode::INTERVAL;

type IntervalBinary = fn(&Interval, &Interval) -> Interval;
type ComplexBinary = fn(Complex64, Complex64) -> Complex64;

pub(crate) fn interval_binary(
    op: IntervalBinary,
) -> impl Fn(&[&Value], &mut Value) + Send + Sync + 'static {
    move |args: &[&Value], dst: &mut Value| {
        values::set_interval(dst, op(&values::interval(args[0]), &values::interval(args[1])))
    }
}

pub(crate) fn interval_unary(
    op: fn(&Interval) -> Interval,
) -> impl Fn(&[&Value], &mut Value) + Send + Sync + 'static {
    move |args: &[&Value], dst: &mut Value| {
        values::set_interval(dst, op(&values::interval(args[0])))
    }
}

fn complex_binary(op: ComplexBinary) -> impl Fn(&[&Value], &mut Value) + Send + Sync + 'static {
    move |args: &[&Value], dst: &mut Value| {
        values::set_complex(dst, op(values::complex(args[0]), values::complex(args[1])))
    }
}

fn complex_add(a: Complex64, b: Complex64) -> Complex64 {
    a + b
}

fn complex_sub(a: Complex64, b: Complex64) -> Complex64 {
    a - b
}

fn complex_mul(a: Complex64, b: Complex64) -> Complex64 {
    a * b
}

fn complex_div(a: Complex64, b: Complex64) -> Complex64 {
    a / b
}

/// Integer power; negative exponents truncate toward zero like integer division.
fn int_pow(base: i64, exp: i64) -> i64 {
    if exp >= 0 {
        base.wrapping_pow(exp.min(u32::MAX as i64) as u32)
    } else {
        match base {
            1 => 1,
            -1 if exp % 2 == 0 => 1,
            -1 => -1,
            _ => 0,
        }
    }
}

pub fn install(env: &mut Environment) -> Result<()> {
    let ring: [(&str, IntervalBinary, ComplexBinary); 3] = [
        ("+", interval::add, complex_add),
        ("-", interval::sub, complex_sub),
        ("*", interval::mul, complex_mul),
    ];

    for (op, interval_op, _) in ring {
        env.define_operator(
            OperatorSpec::new(op, &[INT, INT], INT)
                .evaluator(NORMAL, EvaluatorSpec::new(&[INT, INT], INT).primitive(op))
                .evaluator(
                    INTERVAL,
                    EvaluatorSpec::new(&[INTERVAL_INT, INTERVAL_INT], INTERVAL_INT)
                        .write_fn(interval_binary(interval_op)),
                ),
        )?;
    }
    let field = ring
        .into_iter()
        .chain([("/", interval::div as IntervalBinary, complex_div as ComplexBinary)]);
    for (op, interval_op, complex_op) in field {
        env.define_operator(
            OperatorSpec::new(op, &[REAL, REAL], REAL)
                .evaluator(NORMAL, EvaluatorSpec::new(&[REAL, REAL], REAL).primitive(op))
                .evaluator(
                    INTERVAL,
                    EvaluatorSpec::new(&[INTERVAL_REAL, INTERVAL_REAL], INTERVAL_REAL)
                        .write_fn(interval_binary(interval_op)),
                ),
        )?;
        env.define_operator(
            OperatorSpec::new(op, &[COMPLEX, COMPLEX], COMPLEX).evaluator(
                NORMAL,
                EvaluatorSpec::new(&[COMPLEX, COMPLEX], COMPLEX).write_fn(complex_binary(complex_op)),
            ),
        )?;
    }

    // unary minus
    env.define_operator(
        OperatorSpec::new("-", &[INT], INT)
            .evaluator(NORMAL, EvaluatorSpec::new(&[INT], INT).primitive("-"))
            .evaluator(
                INTERVAL,
                EvaluatorSpec::new(&[INTERVAL_INT], INTERVAL_INT).write_fn(interval_unary(interval::neg)),
            ),
    )?;
    env.define_operator(
        OperatorSpec::new("-", &[REAL], REAL)
            .evaluator(NORMAL, EvaluatorSpec::new(&[REAL], REAL).primitive("-"))
            .evaluator(
                INTERVAL,
                EvaluatorSpec::new(&[INTERVAL_REAL], INTERVAL_REAL).write_fn(interval_unary(interval::neg)),
            ),
    )?;
    env.define_operator(OperatorSpec::new("-", &[COMPLEX], COMPLEX).evaluator(
        NORMAL,
        EvaluatorSpec::new(&[COMPLEX], COMPLEX)
            .write_fn(|args, dst| values::set_complex(dst, -values::complex(args[0]))),
    ))?;

    // powers; an integer exponent keeps interval evaluation available
    env.define_operator(
        OperatorSpec::new("^", &[INT, INT], INT)
            .evaluator(
                NORMAL,
                EvaluatorSpec::new(&[INT, INT], INT)
                    .new_fn(|args| Value::Int(int_pow(values::int(args[0]), values::int(args[1])))),
            )
            .evaluator(
                INTERVAL,
                EvaluatorSpec::new(&[INTERVAL_INT, INTERVAL_INT], INTERVAL_INT)
                    .write_fn(interval_binary(interval::int_pow)),
            ),
    )?;
    env.define_operator(
        OperatorSpec::new("^", &[REAL, INT], REAL)
            .evaluator(
                NORMAL,
                EvaluatorSpec::new(&[REAL, INT], REAL).new_fn(|args| {
                    let exp = values::int(args[1]);
                    let base = values::real(args[0]);
                    match i32::try_from(exp) {
                        Ok(exp) => Value::Real(base.powi(exp)),
                        Err(_) => Value::Real(base.powf(exp as f64)),
                    }
                }),
            )
            .evaluator(
                INTERVAL,
                EvaluatorSpec::new(&[INTERVAL_REAL, INTERVAL_INT], INTERVAL_REAL)
                    .write_fn(interval_binary(interval::pow)),
            ),
    )?;
    env.define_operator(OperatorSpec::new("^", &[REAL, REAL], REAL).evaluator(
        NORMAL,
        EvaluatorSpec::new(&[REAL, REAL], REAL)
            .new_fn(|args| Value::Real(values::real(args[0]).powf(values::real(args[1])))),
    ))?;
    env.define_operator(OperatorSpec::new("^", &[COMPLEX, COMPLEX], COMPLEX).evaluator(
        NORMAL,
        EvaluatorSpec::new(&[COMPLEX, COMPLEX], COMPLEX).write_fn(complex_binary(|a, b| a.powc(b))),
    ))?;

    Ok(())
}
