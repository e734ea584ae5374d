use crate::arithmetic::interval_unary;
use crate::interval;
use crate::types::{BOOL, COMPLEX, INTERVAL_REAL, REAL};
use crate::values;
use mx_core::{Environment, EvaluationMode, EvaluatorSpec, Interval, OperatorSpec, Result, Value};
use num_complex::Complex64;

type RealUnary = fn(f64) -> f64;

fn real_unary(op: RealUnary) -> impl Fn(&[&Value]) -> Value + Send + Sync + 'static {
    move |args: &[&Value]| Value::Real(op(values::real(args[0])))
}

pub fn install(env: &mut Environment) -> Result<()> {
    let elementary: [(&str, RealUnary, Option<fn(&Interval) -> Interval>); 7] = [
        ("sin", f64::sin, None),
        ("cos", f64::cos, None),
        ("tan", f64::tan, None),
        ("exp", f64::exp, Some(interval::exp)),
        ("ln", f64::ln, Some(interval::ln)),
        ("sqrt", f64::sqrt, Some(interval::sqrt)),
        ("abs", f64::abs, Some(interval::abs)),
    ];
    for (name, op, interval_op) in elementary {
        let mut spec = OperatorSpec::new(name, &[REAL], REAL).evaluator(
            EvaluationMode::NORMAL,
            EvaluatorSpec::new(&[REAL], REAL).new_fn(real_unary(op)),
        );
        if let Some(interval_op) = interval_op {
            spec = spec.evaluator(
                EvaluationMode::INTERVAL,
                EvaluatorSpec::new(&[INTERVAL_REAL], INTERVAL_REAL).write_fn(interval_unary(interval_op)),
            );
        }
        env.define_operator(spec)?;
    }

    env.define_operator(OperatorSpec::new("complex", &[REAL, REAL], COMPLEX).evaluator(
        EvaluationMode::NORMAL,
        EvaluatorSpec::new(&[REAL, REAL], COMPLEX).write_fn(|args, dst| {
            values::set_complex(dst, Complex64::new(values::real(args[0]), values::real(args[1])))
        }),
    ))?;
    let parts: [(&str, fn(Complex64) -> f64); 4] = [
        ("re", |z| z.re),
        ("im", |z| z.im),
        ("abs", |z| z.norm()),
        ("arg", |z| z.arg()),
    ];
    for (name, part) in parts {
        env.define_operator(OperatorSpec::new(name, &[COMPLEX], REAL).evaluator(
            EvaluationMode::NORMAL,
            EvaluatorSpec::new(&[COMPLEX], REAL)
                .new_fn(move |args| Value::Real(part(values::complex(args[0])))),
        ))?;
    }

    env.define_operator(OperatorSpec::new("ifelse", &[BOOL, REAL, REAL], REAL).evaluator(
        EvaluationMode::NORMAL,
        EvaluatorSpec::new(&[BOOL, REAL, REAL], REAL).new_fn(|args| {
            if values::boolean(args[0]) {
                args[1].clone()
            } else {
                args[2].clone()
            }
        }),
    ))?;
    Ok(())
}
