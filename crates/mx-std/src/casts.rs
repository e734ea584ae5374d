use crate::types::{BOOL, COMPLEX, INT, INTERVAL_BOOL, INTERVAL_INT, INTERVAL_REAL, REAL};
use crate::values;
use mx_core::{BoolInterval, Environment, EvaluatorKind, EvaluatorSpec, Interval, Result, Value};

pub fn install(env: &mut Environment) -> Result<()> {
    for (source, dest) in [(INT, REAL), (INT, COMPLEX), (REAL, COMPLEX)] {
        env.define_mathematical_cast(source, dest)?;
    }

    // same mode, different type
    env.define_concrete_cast(
        EvaluatorSpec::new(&[INT], REAL).new_fn(|args| Value::Real(values::real(args[0]))),
    )?;
    env.define_concrete_cast(
        EvaluatorSpec::new(&[INT], COMPLEX).new_fn(|args| Value::Complex(values::complex(args[0]))),
    )?;
    env.define_concrete_cast(
        EvaluatorSpec::new(&[REAL], COMPLEX).new_fn(|args| Value::Complex(values::complex(args[0]))),
    )?;
    env.define_concrete_cast(
        EvaluatorSpec::new(&[INTERVAL_INT], INTERVAL_REAL)
            .identity()
            .kind(EvaluatorKind::Write),
    )?;

    // normal mode literals lifted into interval mode
    env.define_concrete_cast(EvaluatorSpec::new(&[BOOL], INTERVAL_BOOL).write_fn(|args, dst| {
        values::set_bool_interval(dst, BoolInterval::point(values::boolean(args[0])))
    }))?;
    env.define_concrete_cast(EvaluatorSpec::new(&[INT], INTERVAL_INT).write_fn(|args, dst| {
        values::set_interval(dst, Interval::point(values::int(args[0]) as f64))
    }))?;
    env.define_concrete_cast(EvaluatorSpec::new(&[REAL], INTERVAL_REAL).write_fn(|args, dst| {
        values::set_interval(dst, Interval::point(values::real(args[0])))
    }))?;

    Ok(())
}
