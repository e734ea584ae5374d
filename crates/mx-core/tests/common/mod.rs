#![allow(dead_code)]

use mx_core::{ConcreteType, Environment, EvaluatorSpec, OperatorSpec, Value};
use num_complex::Complex64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn primitive(name: &str, init: Value) -> ConcreteType {
    let kind = init.kind_name();
    ConcreteType::builder(name)
        .primitive(true)
        .init(move || init.clone())
        .typecheck(move |v| v.kind_name() == kind)
        .build()
        .unwrap()
}

/// int, real and complex in normal mode only, with `int -> real -> complex` casts.
pub fn small_environment() -> Environment {
    small_environment_counting(Arc::new(AtomicUsize::new(0)))
}

/// Same as [`small_environment`]; `writes` counts complex additions written in place.
pub fn small_environment_counting(writes: Arc<AtomicUsize>) -> Environment {
    let mut env = Environment::new();
    env.register_concrete_type(primitive("int", Value::Int(0)))
        .unwrap();
    env.register_concrete_type(primitive("real", Value::Real(0.0)))
        .unwrap();
    env.register_concrete_type(
        ConcreteType::builder("complex")
            .init(|| Value::Complex(Complex64::new(0.0, 0.0)))
            .typecheck(|v| matches!(v, Value::Complex(_)))
            .copy_to(|src, dst| *dst = src.clone())
            .build()
            .unwrap(),
    )
    .unwrap();
    for name in ["int", "real", "complex"] {
        env.define_type(name, &[("normal", name)]).unwrap();
    }

    env.define_mathematical_cast("int", "real").unwrap();
    env.define_mathematical_cast("real", "complex").unwrap();
    env.define_concrete_cast(
        EvaluatorSpec::new(&["int"], "real")
            .new_fn(|args| Value::Real(args[0].to_f64().unwrap_or(f64::NAN))),
    )
    .unwrap();
    env.define_concrete_cast(EvaluatorSpec::new(&["real"], "complex").new_fn(|args| {
        Value::Complex(Complex64::new(args[0].to_f64().unwrap_or(f64::NAN), 0.0))
    }))
    .unwrap();

    for ty in ["int", "real"] {
        for op in ["+", "-", "*"] {
            env.define_operator(
                OperatorSpec::new(op, &[ty, ty], ty)
                    .evaluator("normal", EvaluatorSpec::new(&[ty, ty], ty).primitive(op)),
            )
            .unwrap();
        }
    }
    env.define_operator(
        OperatorSpec::new("-", &["real"], "real")
            .evaluator("normal", EvaluatorSpec::new(&["real"], "real").primitive("-")),
    )
    .unwrap();
    env.define_operator(
        OperatorSpec::new("^", &["real", "real"], "real").evaluator(
            "normal",
            EvaluatorSpec::new(&["real", "real"], "real").new_fn(|args| {
                match (args[0].as_real(), args[1].as_real()) {
                    (Some(x), Some(y)) => Value::Real(x.powf(y)),
                    _ => Value::Real(f64::NAN),
                }
            }),
        ),
    )
    .unwrap();
    env.define_operator(
        OperatorSpec::new("+", &["complex", "complex"], "complex").evaluator(
            "normal",
            EvaluatorSpec::new(&["complex", "complex"], "complex").write_fn(move |args, dst| {
                writes.fetch_add(1, Ordering::Relaxed);
                if let (Some(a), Some(b), Value::Complex(out)) =
                    (args[0].as_complex(), args[1].as_complex(), dst)
                {
                    *out = a + b;
                }
            }),
        ),
    )
    .unwrap();
    env.define_operator(
        OperatorSpec::new("conj", &["complex"], "complex").evaluator(
            "normal",
            EvaluatorSpec::new(&["complex"], "complex")
                .new_fn(|args| Value::Complex(args[0].as_complex().unwrap_or_default().conj())),
        ),
    )
    .unwrap();
    env
}
