mod common;

use common::small_environment;
use mx_core::{Error, Node, TypeSlot, VariableTypes};
use pretty_assertions::assert_eq;

fn vars(pairs: &[(&str, &str)]) -> VariableTypes {
    pairs
        .iter()
        .map(|(name, ty)| (name.to_string(), ty.to_string()))
        .collect()
}

#[test]
fn every_type_casts_to_itself_by_identity() {
    let env = small_environment();
    for ty in env.types().mathematical_types() {
        let cast = env.get_mathematical_cast(ty.name(), ty.name()).unwrap();
        assert!(cast.is_some_and(|cast| cast.is_identity()), "{}", ty);
    }
}

#[test]
fn plus_prefers_the_exact_overload() {
    let env = small_environment();

    let exact = env.resolve_operator_by_names("+", &["int", "int"]).unwrap();
    assert_eq!(exact.definition.signature(), "+(int, int) -> int");
    assert_eq!(exact.distance, 0);

    let mixed = env.resolve_operator_by_names("+", &["int", "real"]).unwrap();
    assert_eq!(mixed.definition.signature(), "+(real, real) -> real");
    assert_eq!(mixed.distance, 1);
    assert_eq!(mixed.casts[0].to_string(), "int->real");
    assert!(mixed.casts[1].is_identity());
}

#[test]
fn unknown_operator_is_an_error_value() {
    let env = small_environment();
    let err = env
        .resolve_operator_by_names("gamma", &["real"])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownOperator { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn casts_do_not_chain() {
    let env = small_environment();
    // int -> real and real -> complex exist, int -> complex does not
    assert!(env.resolve_operator_by_names("conj", &["real"]).is_ok());
    let err = env.resolve_operator_by_names("conj", &["int"]).unwrap_err();
    match err {
        Error::NoViableOverload { name, args, .. } => {
            assert_eq!(name, "conj");
            assert_eq!(args, vec!["int".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn tree_resolution_annotates_nodes() {
    let env = small_environment();
    let mut tree = Node::binary(
        "+",
        Node::binary("*", Node::variable("n"), Node::int(2)),
        Node::group(Node::variable("x")),
    );
    let outcome = env.resolve(&mut tree, &vars(&[("n", "int")]));
    assert!(outcome.is_ok(), "{:?}", outcome.diagnostics);

    assert_eq!(tree.resolved_type().map(|t| t.name()), Some("real"));
    let product = &tree.children()[0];
    assert_eq!(product.resolved_type().map(|t| t.name()), Some("int"));
    assert_eq!(
        product.resolution().map(|r| r.definition.signature()),
        Some("*(int, int) -> int".to_string())
    );
    // unlisted variables take the configured default type
    assert_eq!(
        tree.children()[1].resolved_type().map(|t| t.name()),
        Some(env.config().default_variable_type.as_str())
    );
}

#[test]
fn failures_propagate_as_unresolved() {
    let env = small_environment();
    let mut tree = Node::binary(
        "+",
        Node::unary("conj", Node::variable("n")),
        Node::real(1.0),
    );
    let outcome = env.resolve(&mut tree, &vars(&[("n", "int")]));

    assert!(outcome.has_errors);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(
        outcome.diagnostics[0].code.as_deref(),
        Some("mx::no_viable_overload")
    );
    assert!(matches!(tree.ty(), TypeSlot::Unresolved));
    assert!(matches!(tree.children()[0].ty(), TypeSlot::Unresolved));
    assert!(tree.children()[1].ty().is_resolved());
}

#[test]
fn unknown_variable_type_suggests_a_name() {
    let env = small_environment();
    let mut tree = Node::variable("x");
    let outcome = env.resolve(&mut tree, &vars(&[("x", "reel")]));

    assert!(outcome.has_errors);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.suggestions, vec!["did you mean `real`?".to_string()]);
    assert_eq!(diagnostic.source_context.as_deref(), Some("variable `x`"));
}

#[test]
fn mistyped_constants_are_reported() {
    let env = small_environment();
    let mut tree = Node::constant(1.5, "int");
    let outcome = env.resolve(&mut tree, &VariableTypes::new());
    assert!(outcome.has_errors);
    assert!(outcome.diagnostics[0].message.starts_with("constant 1.5 is not a valid int"));
}

#[test]
fn outcomes_keep_the_error_variant() {
    let env = small_environment();

    let mut tree = Node::unary("conj", Node::variable("n"));
    let outcome = env.resolve(&mut tree, &vars(&[("n", "int")]));
    assert_eq!(outcome.errors().len(), 1);
    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, Error::NoViableOverload { ref name, .. } if name == "conj"));
    assert!(err.is_recoverable());

    let mut tree = Node::variable("x");
    let err = env
        .resolve(&mut tree, &vars(&[("x", "reel")]))
        .into_result()
        .unwrap_err();
    assert!(matches!(err, Error::UnknownType { ref name, .. } if name == "reel"));
    assert!(err.is_recoverable());

    // malformed literals have no registry error behind them
    let mut tree = Node::constant(1.5, "int");
    let outcome = env.resolve(&mut tree, &VariableTypes::new());
    assert!(outcome.errors().is_empty());
    assert!(matches!(outcome.into_result(), Err(Error::Generic(_))));

    let mut tree = Node::variable("x");
    assert!(env.resolve(&mut tree, &VariableTypes::new()).into_result().is_ok());
}

#[test]
fn resolving_twice_is_idempotent() {
    let env = small_environment();
    let mut tree = Node::binary(
        "-",
        Node::binary("^", Node::variable("x"), Node::int(2)),
        Node::variable("n"),
    );
    let variables = vars(&[("n", "int")]);

    assert!(env.resolve(&mut tree, &variables).is_ok());
    let mut first = Vec::new();
    tree.apply_all(mx_core::ast::TraversalOrder::Pre, &mut |node, _| {
        first.push((
            node.resolved_type().map(|t| t.name().to_string()),
            node.resolution().map(|r| r.definition.signature()),
        ))
    });

    assert!(env.resolve(&mut tree, &variables).is_ok());
    let mut second = Vec::new();
    tree.apply_all(mx_core::ast::TraversalOrder::Pre, &mut |node, _| {
        second.push((
            node.resolved_type().map(|t| t.name().to_string()),
            node.resolution().map(|r| r.definition.signature()),
        ))
    });

    assert_eq!(first, second);
}
