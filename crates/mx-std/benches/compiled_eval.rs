use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mx_core::{CompileOptions, Interval, Node, Scope, Value, VariableTypes};
use mx_std::standard_environment;

// sin(x)^2 + cos(x)^2 * (x + 1)
fn expression() -> Node {
    Node::binary(
        "+",
        Node::binary("^", Node::unary("sin", Node::variable("x")), Node::int(2)),
        Node::binary(
            "*",
            Node::binary("^", Node::unary("cos", Node::variable("x")), Node::int(2)),
            Node::group(Node::binary("+", Node::variable("x"), Node::int(1))),
        ),
    )
}

fn bench_compiled_eval(c: &mut Criterion) {
    let env = standard_environment().expect("standard library");
    let mut tree = expression();
    env.resolve(&mut tree, &VariableTypes::new())
        .into_result()
        .expect("resolves");

    let normal = env
        .compile(&tree, &CompileOptions::new("normal"))
        .expect("compiles");
    let mut frame = normal.new_frame();
    let scope = Scope::new().with("x", 0.75);
    c.bench_function("evaluate_compiled", |b| {
        b.iter(|| {
            let value = normal
                .evaluate_in(&[], black_box(&scope), &mut frame)
                .expect("evaluates");
            assert!(matches!(value, Value::Real(_)));
        })
    });

    c.bench_function("compile_then_evaluate", |b| {
        b.iter(|| {
            let unit = env
                .compile(black_box(&tree), &CompileOptions::new("normal"))
                .expect("compiles");
            unit.evaluate(&scope).expect("evaluates")
        })
    });

    // sqrt(x^2 + 1) * exp(x); trigonometry has no interval form
    let mut bounded = Node::binary(
        "*",
        Node::unary(
            "sqrt",
            Node::binary(
                "+",
                Node::binary("^", Node::variable("x"), Node::int(2)),
                Node::int(1),
            ),
        ),
        Node::unary("exp", Node::variable("x")),
    );
    env.resolve(&mut bounded, &VariableTypes::new())
        .into_result()
        .expect("resolves");
    let interval = env
        .compile(&bounded, &CompileOptions::new("interval"))
        .expect("compiles");
    let mut frame = interval.new_frame();
    let scope = Scope::new().with("x", Interval::range(-0.5, 0.5));
    c.bench_function("evaluate_interval", |b| {
        b.iter(|| {
            interval
                .evaluate_in(&[], black_box(&scope), &mut frame)
                .expect("evaluates")
        })
    });
}

criterion_group!(benches, bench_compiled_eval);
criterion_main!(benches);
