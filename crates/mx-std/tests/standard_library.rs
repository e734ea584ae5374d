use eyre::Result;
use mx_core::{CompileOptions, Environment, Error, Interval, Node, Scope, Value, VariableTypes};
use mx_std::standard_environment;
use num_complex::Complex64;
use pretty_assertions::assert_eq;

fn vars(pairs: &[(&str, &str)]) -> VariableTypes {
    pairs
        .iter()
        .map(|(name, ty)| (name.to_string(), ty.to_string()))
        .collect()
}

fn resolve(env: &Environment, mut tree: Node, variables: &[(&str, &str)]) -> Result<Node> {
    env.resolve(&mut tree, &vars(variables)).into_result()?;
    Ok(tree)
}

fn x_squared_plus_three() -> Node {
    Node::binary(
        "+",
        Node::binary("^", Node::variable("x"), Node::int(2)),
        Node::int(3),
    )
}

#[test]
fn x_squared_plus_three_in_normal_mode() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(&env, x_squared_plus_three(), &[])?;

    let power = tree.children()[0].resolution().expect("resolved");
    assert_eq!(power.definition.signature(), "^(real, int) -> real");
    assert_eq!(power.distance, 0);

    let unit = env.compile(&tree, &CompileOptions::new("normal"))?;
    assert_eq!(unit.evaluate(&Scope::new().with("x", 4.0))?, Value::Real(19.0));
    assert_eq!(unit.evaluate(&Scope::new().with("x", 0.0))?, Value::Real(3.0));
    Ok(())
}

#[test]
fn same_tree_compiles_for_interval_mode() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(&env, x_squared_plus_three(), &[])?;
    let unit = env.compile(&tree, &CompileOptions::new("interval"))?;

    let scope = Scope::new().with("x", Interval::range(-1.0, 2.0));
    assert_eq!(unit.evaluate(&scope)?, Value::Interval(Interval::range(3.0, 7.0)));

    // literals were lifted into interval form at compile time
    assert!(unit
        .imports()
        .constants()
        .iter()
        .all(|c| matches!(c, Value::Interval(_))));
    Ok(())
}

#[test]
fn standard_overloads_resolve_by_distance() -> Result<()> {
    let env = standard_environment()?;

    let exact = env.resolve_operator_by_names("+", &["int", "int"])?;
    assert_eq!(exact.definition.signature(), "+(int, int) -> int");
    assert_eq!(exact.distance, 0);

    let mixed = env.resolve_operator_by_names("+", &["int", "real"])?;
    assert_eq!(mixed.definition.signature(), "+(real, real) -> real");
    assert_eq!(mixed.distance, 1);
    assert!(!mixed.casts[0].is_identity());

    let promoted = env.resolve_operator_by_names("*", &["real", "complex"])?;
    assert_eq!(promoted.definition.signature(), "*(complex, complex) -> complex");

    let ties = env.resolve_operator_by_names("abs", &["int"])?;
    assert_eq!(ties.definition.signature(), "abs(real) -> real");

    for ty in env.types().mathematical_types() {
        let cast = env.get_mathematical_cast(ty.name(), ty.name())?;
        assert!(cast.is_some_and(|c| c.is_identity()));
    }
    Ok(())
}

#[test]
fn integer_division_produces_a_real() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(&env, Node::binary("/", Node::int(1), Node::int(2)), &[])?;
    assert_eq!(tree.resolved_type().map(|t| t.name()), Some("real"));

    let unit = env.compile(&tree, &CompileOptions::new("normal"))?;
    assert_eq!(unit.evaluate(&Scope::new())?, Value::Real(0.5));
    Ok(())
}

#[test]
fn complex_arithmetic_writes_in_place() -> Result<()> {
    let env = standard_environment()?;
    // z * z + 1
    let tree = resolve(
        &env,
        Node::binary(
            "+",
            Node::binary("*", Node::variable("z"), Node::variable("z")),
            Node::int(1),
        ),
        &[("z", "complex")],
    )?;
    let unit = env.compile(&tree, &CompileOptions::new("normal"))?;

    let z = Value::Complex(Complex64::new(0.0, 2.0));
    let scope = Scope::new().with("z", z.clone());
    let mut frame = unit.new_frame();
    for _ in 0..2 {
        assert_eq!(
            unit.evaluate_in(&[], &scope, &mut frame)?,
            Value::Complex(Complex64::new(-3.0, 0.0))
        );
    }
    assert_eq!(scope.get("z"), Some(&z));

    let err = env
        .compile(&tree, &CompileOptions::new("interval"))
        .unwrap_err();
    assert!(matches!(err, Error::NoEvaluatorForMode { .. }));
    Ok(())
}

#[test]
fn magnitude_of_a_built_complex() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(
        &env,
        Node::unary(
            "abs",
            Node::operator("complex", vec![Node::variable("a"), Node::int(4)]),
        ),
        &[],
    )?;
    let unit = env.compile(&tree, &CompileOptions::new("normal"))?;
    assert_eq!(unit.evaluate(&Scope::new().with("a", 3.0))?, Value::Real(5.0));
    Ok(())
}

#[test]
fn piecewise_absolute_value() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(
        &env,
        Node::operator(
            "ifelse",
            vec![
                Node::binary("<", Node::variable("x"), Node::int(0)),
                Node::unary("-", Node::variable("x")),
                Node::variable("x"),
            ],
        ),
        &[],
    )?;
    let unit = env.compile(&tree, &CompileOptions::new("normal"))?;
    for (x, expected) in [(-2.5, 2.5), (0.0, 0.0), (3.0, 3.0)] {
        assert_eq!(unit.evaluate(&Scope::new().with("x", x))?, Value::Real(expected));
    }
    // ifelse has no interval evaluator
    assert!(env.compile(&tree, &CompileOptions::new("interval")).is_err());
    Ok(())
}

#[test]
fn interval_comparisons_may_be_indeterminate() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(&env, Node::binary("<", Node::variable("x"), Node::int(1)), &[])?;
    let unit = env.compile(&tree, &CompileOptions::new("interval"))?;

    let below = Scope::new().with("x", Interval::range(0.0, 0.5));
    let across = Scope::new().with("x", Interval::range(0.0, 2.0));
    assert_eq!(
        unit.evaluate(&below)?.as_bool_interval().copied(),
        Some(mx_core::BoolInterval::TRUE)
    );
    assert_eq!(
        unit.evaluate(&across)?.as_bool_interval().copied(),
        Some(mx_core::BoolInterval::INDETERMINATE)
    );
    Ok(())
}

#[test]
fn real_exponents_have_no_interval_form() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(
        &env,
        Node::binary("^", Node::variable("x"), Node::variable("y")),
        &[],
    )?;
    assert!(env.compile(&tree, &CompileOptions::new("normal")).is_ok());
    let err = env
        .compile(&tree, &CompileOptions::new("interval"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "no evaluator for mode `interval`: ^(real, real) -> real"
    );
    Ok(())
}

#[test]
fn trees_from_json_evaluate() -> Result<()> {
    let env = standard_environment()?;
    let json = r#"{
        "node": "operator",
        "name": "sqrt",
        "children": [{
            "node": "operator",
            "name": "+",
            "children": [
                {"node": "variable", "name": "t"},
                {"node": "constant", "value": {"type": "int", "value": 5}, "type": "int"}
            ]
        }]
    }"#;
    let tree = resolve(&env, Node::from_json(json)?, &[("t", "int")])?;
    assert_eq!(tree.to_string(), "sqrt(t + 5)");

    let unit = env.compile(&tree, &CompileOptions::new("normal"))?;
    assert_eq!(unit.evaluate(&Scope::new().with("t", 4i64))?, Value::Real(3.0));
    Ok(())
}

#[test]
fn unknown_names_are_diagnosed() -> Result<()> {
    let env = standard_environment()?;
    let mut tree = Node::unary("sinn", Node::variable("x"));
    let outcome = env.resolve(&mut tree, &vars(&[("x", "reel")]));

    assert!(outcome.has_errors);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(
        outcome.diagnostics[0].to_string(),
        "unknown type `reel` [mx::unknown_type] (hints: did you mean `real`?)"
    );

    let mut tree = Node::unary("sinn", Node::variable("x"));
    let outcome = env.resolve(&mut tree, &VariableTypes::new());
    assert_eq!(
        outcome.diagnostics[0].suggestions,
        vec!["did you mean `sin`?".to_string()]
    );
    Ok(())
}

#[test]
fn integer_power_intervals_enclose_normal_results() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(
        &env,
        Node::binary("^", Node::variable("n"), Node::variable("m")),
        &[("n", "int"), ("m", "int")],
    )?;
    let normal = env.compile(&tree, &CompileOptions::new("normal"))?;
    let interval = env.compile(&tree, &CompileOptions::new("interval"))?;

    let check = |bases: Interval, m: i64| -> Result<()> {
        let scope = Scope::new()
            .with("n", bases)
            .with("m", Interval::point(m as f64));
        let enclosing = interval.evaluate(&scope)?;
        let enclosing = enclosing.as_interval().copied().expect("interval result");
        for n in (bases.min as i64)..=(bases.max as i64) {
            let exact = normal.evaluate(&Scope::new().with("n", n).with("m", m))?;
            let exact = exact.as_int().expect("int result");
            assert!(
                enclosing.contains(exact as f64),
                "{n}^{m} = {exact} is outside {enclosing:?}"
            );
        }
        Ok(())
    };
    for (n, m) in [(2, -1), (3, 2), (-2, 3), (1, -4), (-1, -3), (-1, -2), (0, -2), (5, 0)] {
        check(Interval::point(n as f64), m)?;
    }
    check(Interval::range(-2.0, 2.0), -1)?;
    check(Interval::range(-3.0, 4.0), 2)?;
    Ok(())
}

#[test]
fn plain_scope_values_are_lifted_when_casts_are_enabled() -> Result<()> {
    let env = standard_environment()?;
    let tree = resolve(&env, Node::binary("+", Node::variable("x"), Node::int(1)), &[])?;
    let unit = env.compile(&tree, &CompileOptions::new("interval").with_casts(true))?;
    assert_eq!(unit.listing()[0], "$0 = scope.x (cast real->interval_real)");

    assert_eq!(
        unit.evaluate(&Scope::new().with("x", 4.0))?,
        Value::Interval(Interval::point(5.0))
    );
    // values already in interval form pass through
    assert_eq!(
        unit.evaluate(&Scope::new().with("x", Interval::range(0.0, 1.0)))?,
        Value::Interval(Interval::range(1.0, 2.0))
    );

    let strict = env.compile(
        &tree,
        &CompileOptions::new("interval").with_typechecks(true),
    )?;
    let err = strict.evaluate(&Scope::new().with("x", 4.0)).unwrap_err();
    assert!(matches!(err, Error::TypeCheck { .. }));
    Ok(())
}
