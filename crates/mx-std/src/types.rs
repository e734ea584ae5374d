use mx_core::{BoolInterval, ConcreteType, Environment, Interval, Result, Value};
use num_complex::Complex64;

pub const BOOL: &str = "bool";
pub const INT: &str = "int";
pub const REAL: &str = "real";
pub const COMPLEX: &str = "complex";
pub const INTERVAL_BOOL: &str = "interval_bool";
pub const INTERVAL_INT: &str = "interval_int";
pub const INTERVAL_REAL: &str = "interval_real";

fn copy(src: &Value, dst: &mut Value) {
    dst.clone_from(src);
}

fn concrete_types() -> Result<Vec<ConcreteType>> {
    Ok(vec![
        ConcreteType::builder(BOOL)
            .primitive(true)
            .init(|| Value::Bool(false))
            .typecheck(|v| matches!(v, Value::Bool(_)))
            .build()?,
        ConcreteType::builder(INT)
            .primitive(true)
            .init(|| Value::Int(0))
            .typecheck(|v| matches!(v, Value::Int(_)))
            .build()?,
        ConcreteType::builder(REAL)
            .primitive(true)
            .init(|| Value::Real(0.0))
            .typecheck(|v| matches!(v, Value::Real(_)))
            .build()?,
        ConcreteType::builder(COMPLEX)
            .init(|| Value::Complex(Complex64::new(0.0, 0.0)))
            .typecheck(|v| matches!(v, Value::Complex(_)))
            .copy_to(copy)
            .build()?,
        ConcreteType::builder(INTERVAL_BOOL)
            .init(|| Value::BoolInterval(BoolInterval::default()))
            .typecheck(|v| matches!(v, Value::BoolInterval(_)))
            .copy_to(copy)
            .build()?,
        ConcreteType::builder(INTERVAL_INT)
            .init(|| Value::Interval(Interval::default()))
            .typecheck(|v| match v {
                Value::Interval(i) => !i.is_defined() || (i.min.fract() == 0.0 && i.max.fract() == 0.0),
                _ => false,
            })
            .typecheck_verbose(|v| match v {
                Value::Interval(i) if i.is_defined() && (i.min.fract() != 0.0 || i.max.fract() != 0.0) => {
                    Some(format!("interval {} has non-integer bounds", v))
                }
                Value::Interval(_) => None,
                other => Some(format!("expected an integer interval, found {} {}", other.kind_name(), other)),
            })
            .copy_to(copy)
            .build()?,
        ConcreteType::builder(INTERVAL_REAL)
            .init(|| Value::Interval(Interval::default()))
            .typecheck(|v| matches!(v, Value::Interval(_)))
            .copy_to(copy)
            .build()?,
    ])
}

pub fn install(env: &mut Environment) -> Result<()> {
    for concrete in concrete_types()? {
        env.register_concrete_type(concrete)?;
    }
    env.define_type(BOOL, &[("normal", BOOL), ("interval", INTERVAL_BOOL)])?;
    env.define_type(INT, &[("normal", INT), ("interval", INTERVAL_INT)])?;
    env.define_type(REAL, &[("normal", REAL), ("interval", INTERVAL_REAL)])?;
    env.define_type(COMPLEX, &[("normal", COMPLEX)])?;
    Ok(())
}
