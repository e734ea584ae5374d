use crate::interval;
use crate::types::{BOOL, INTERVAL_BOOL, INTERVAL_REAL, REAL};
use crate::values;
use mx_core::{
    BoolInterval, Environment, EvaluationMode, EvaluatorSpec, Interval, OperatorSpec, Result, Value,
};

fn interval_comparison(
    op: fn(&Interval, &Interval) -> BoolInterval,
) -> impl Fn(&[&Value], &mut Value) + Send + Sync + 'static {
    move |args: &[&Value], dst: &mut Value| {
        values::set_bool_interval(dst, op(&values::interval(args[0]), &values::interval(args[1])))
    }
}

pub fn install(env: &mut Environment) -> Result<()> {
    for op in ["<", "<=", ">", ">=", "==", "!="] {
        let mut spec = OperatorSpec::new(op, &[REAL, REAL], BOOL).evaluator(
            EvaluationMode::NORMAL,
            EvaluatorSpec::new(&[REAL, REAL], BOOL).primitive(op),
        );
        let interval_op: Option<fn(&Interval, &Interval) -> BoolInterval> = match op {
            "<" => Some(interval::less),
            ">" => Some(interval::greater),
            _ => None,
        };
        if let Some(interval_op) = interval_op {
            spec = spec.evaluator(
                EvaluationMode::INTERVAL,
                EvaluatorSpec::new(&[INTERVAL_REAL, INTERVAL_REAL], INTERVAL_BOOL)
                    .write_fn(interval_comparison(interval_op)),
            );
        }
        env.define_operator(spec)?;
    }

    for op in ["&&", "||"] {
        env.define_operator(
            OperatorSpec::new(op, &[BOOL, BOOL], BOOL)
                .evaluator(EvaluationMode::NORMAL, EvaluatorSpec::new(&[BOOL, BOOL], BOOL).primitive(op)),
        )?;
    }
    env.define_operator(
        OperatorSpec::new("!", &[BOOL], BOOL)
            .evaluator(EvaluationMode::NORMAL, EvaluatorSpec::new(&[BOOL], BOOL).primitive("!")),
    )?;
    Ok(())
}
