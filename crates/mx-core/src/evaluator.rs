use crate::error::{Error, Result};
use crate::types::{ConcreteRef, TypeRegistry};
use crate::value::Value;
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Whether an evaluator returns a fresh value or overwrites a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvaluatorKind {
    #[default]
    New,
    Write,
}

impl Display for EvaluatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EvaluatorKind::New => "new",
            EvaluatorKind::Write => "write",
        })
    }
}

/// Binary operations on primitive values that compile to a direct call
/// instead of going through a boxed implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryPrimitive {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

impl BinaryPrimitive {
    pub const ALL: [BinaryPrimitive; 12] = [
        BinaryPrimitive::Add,
        BinaryPrimitive::Sub,
        BinaryPrimitive::Mul,
        BinaryPrimitive::Div,
        BinaryPrimitive::And,
        BinaryPrimitive::Or,
        BinaryPrimitive::Eq,
        BinaryPrimitive::Ne,
        BinaryPrimitive::Le,
        BinaryPrimitive::Ge,
        BinaryPrimitive::Lt,
        BinaryPrimitive::Gt,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    pub fn token(self) -> &'static str {
        match self {
            BinaryPrimitive::Add => "+",
            BinaryPrimitive::Sub => "-",
            BinaryPrimitive::Mul => "*",
            BinaryPrimitive::Div => "/",
            BinaryPrimitive::And => "&&",
            BinaryPrimitive::Or => "||",
            BinaryPrimitive::Eq => "==",
            BinaryPrimitive::Ne => "!=",
            BinaryPrimitive::Le => "<=",
            BinaryPrimitive::Ge => ">=",
            BinaryPrimitive::Lt => "<",
            BinaryPrimitive::Gt => ">",
        }
    }

    /// Plain function pointer for the compiled step.
    pub fn function(self) -> fn(&Value, &Value) -> Value {
        match self {
            BinaryPrimitive::Add => |a: &Value, b: &Value| arith(a, b, i64::wrapping_add, |x, y| x + y),
            BinaryPrimitive::Sub => |a: &Value, b: &Value| arith(a, b, i64::wrapping_sub, |x, y| x - y),
            BinaryPrimitive::Mul => |a: &Value, b: &Value| arith(a, b, i64::wrapping_mul, |x, y| x * y),
            BinaryPrimitive::Div => |a: &Value, b: &Value| match (a.to_f64(), b.to_f64()) {
                (Some(x), Some(y)) => Value::Real(x / y),
                _ => Value::Real(f64::NAN),
            },
            BinaryPrimitive::And => |a: &Value, b: &Value| logic(a, b, |x, y| x && y),
            BinaryPrimitive::Or => |a: &Value, b: &Value| logic(a, b, |x, y| x || y),
            BinaryPrimitive::Eq => |a: &Value, b: &Value| compare(a, b, |x, y| x == y, |x, y| x == y),
            BinaryPrimitive::Ne => |a: &Value, b: &Value| compare(a, b, |x, y| x != y, |x, y| x != y),
            BinaryPrimitive::Le => |a: &Value, b: &Value| compare(a, b, |x, y| x <= y, |x, y| x <= y),
            BinaryPrimitive::Ge => |a: &Value, b: &Value| compare(a, b, |x, y| x >= y, |x, y| x >= y),
            BinaryPrimitive::Lt => |a: &Value, b: &Value| compare(a, b, |x, y| x < y, |x, y| x < y),
            BinaryPrimitive::Gt => |a: &Value, b: &Value| compare(a, b, |x, y| x > y, |x, y| x > y),
        }
    }

    pub fn apply(self, a: &Value, b: &Value) -> Value {
        (self.function())(a, b)
    }
}

fn arith(a: &Value, b: &Value, int: fn(i64, i64) -> i64, real: fn(f64, f64) -> f64) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(int(*x, *y)),
        _ => match (a.to_f64(), b.to_f64()) {
            (Some(x), Some(y)) => Value::Real(real(x, y)),
            _ => Value::Real(f64::NAN),
        },
    }
}

fn logic(a: &Value, b: &Value, op: fn(bool, bool) -> bool) -> Value {
    match (a.as_bool(), b.as_bool()) {
        (Some(x), Some(y)) => Value::Bool(op(x, y)),
        _ => Value::Bool(false),
    }
}

fn compare(
    a: &Value,
    b: &Value,
    int: fn(&i64, &i64) -> bool,
    real: fn(&f64, &f64) -> bool,
) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Bool(int(x, y)),
        (Value::Bool(x), Value::Bool(y)) => Value::Bool(int(&(*x as i64), &(*y as i64))),
        _ => match (a.to_f64(), b.to_f64()) {
            (Some(x), Some(y)) => Value::Bool(real(&x, &y)),
            _ => Value::Bool(false),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryPrimitive {
    Neg,
    Not,
}

impl UnaryPrimitive {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "-" => Some(UnaryPrimitive::Neg),
            "!" => Some(UnaryPrimitive::Not),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            UnaryPrimitive::Neg => "-",
            UnaryPrimitive::Not => "!",
        }
    }

    pub fn function(self) -> fn(&Value) -> Value {
        match self {
            UnaryPrimitive::Neg => |a: &Value| match a {
                Value::Int(x) => Value::Int(x.wrapping_neg()),
                Value::Real(x) => Value::Real(-x),
                Value::Complex(z) => Value::Complex(-z),
                _ => Value::Real(f64::NAN),
            },
            UnaryPrimitive::Not => |a: &Value| Value::Bool(!a.as_bool().unwrap_or(true)),
        }
    }

    pub fn apply(self, a: &Value) -> Value {
        (self.function())(a)
    }
}

pub type NewFn = Arc<dyn Fn(&[&Value]) -> Value + Send + Sync>;
pub type WriteFn = Arc<dyn Fn(&[&Value], &mut Value) + Send + Sync>;

/// A boxed implementation of either evaluator kind.
#[derive(Clone)]
pub enum GenericFn {
    New(NewFn),
    Write(WriteFn),
}

impl GenericFn {
    pub fn new(f: impl Fn(&[&Value]) -> Value + Send + Sync + 'static) -> Self {
        GenericFn::New(Arc::new(f))
    }

    pub fn write(f: impl Fn(&[&Value], &mut Value) + Send + Sync + 'static) -> Self {
        GenericFn::Write(Arc::new(f))
    }

    pub fn kind(&self) -> EvaluatorKind {
        match self {
            GenericFn::New(_) => EvaluatorKind::New,
            GenericFn::Write(_) => EvaluatorKind::Write,
        }
    }

    /// Address of the boxed closure, used to deduplicate imports.
    pub fn address(&self) -> usize {
        match self {
            GenericFn::New(f) => Arc::as_ptr(f) as *const () as usize,
            GenericFn::Write(f) => Arc::as_ptr(f) as *const () as usize,
        }
    }
}

impl Debug for GenericFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GenericFn::{}(<fn@{:#x}>)", self.kind(), self.address())
    }
}

#[derive(Debug, Clone)]
pub enum Implementation {
    Generic(GenericFn),
    InlineBinary(BinaryPrimitive),
    InlineUnary(UnaryPrimitive),
    /// Clone (or copy into the destination) of the single argument.
    Identity,
}

/// The implementation of an operator definition under one evaluation mode.
#[derive(Debug, Clone)]
pub struct ConcreteEvaluator {
    arg_types: Vec<ConcreteRef>,
    return_type: ConcreteRef,
    kind: EvaluatorKind,
    identity: bool,
    implementation: Implementation,
}

impl ConcreteEvaluator {
    /// Validates the parts and synthesizes a default implementation when none is given.
    ///
    /// `primitive` names a literal for arity 0 or an operator token for arity 1
    /// and 2; primitive evaluators always produce new values.
    pub fn new(
        arg_types: Vec<ConcreteRef>,
        return_type: ConcreteRef,
        mut kind: EvaluatorKind,
        identity: bool,
        primitive: Option<&str>,
        func: Option<GenericFn>,
    ) -> Result<Self> {
        construction_ensure!(
            !(kind == EvaluatorKind::Write && return_type.is_primitive()),
            "cannot write to a primitive ({})",
            return_type.name()
        );

        let implementation = match func {
            Some(func) => {
                construction_ensure!(
                    func.kind() == kind,
                    "{} evaluator was given a {} implementation",
                    kind,
                    func.kind()
                );
                Implementation::Generic(func)
            }
            None if identity => {
                construction_ensure!(
                    arg_types.len() == 1,
                    "identity evaluator takes exactly one argument, not {}",
                    arg_types.len()
                );
                construction_ensure!(
                    kind == EvaluatorKind::New || return_type.copy_to_fn().is_some(),
                    "identity write evaluator needs copy_to on {}",
                    return_type.name()
                );
                Implementation::Identity
            }
            None => {
                let implementation = primitive.and_then(|token| match arg_types.len() {
                    0 => parse_literal(token).map(|value| {
                        Implementation::Generic(GenericFn::new(move |_| value.clone()))
                    }),
                    1 => UnaryPrimitive::from_token(token).map(Implementation::InlineUnary),
                    2 => BinaryPrimitive::from_token(token).map(Implementation::InlineBinary),
                    _ => None,
                });
                let Some(implementation) = implementation else {
                    construction_bail!(
                        "unable to generate evaluation function for ({}) -> {}",
                        arg_types.iter().map(|t| t.name()).join(", "),
                        return_type.name()
                    );
                };
                kind = EvaluatorKind::New;
                implementation
            }
        };

        Ok(Self {
            arg_types,
            return_type,
            kind,
            identity,
            implementation,
        })
    }

    pub fn arg_types(&self) -> &[ConcreteRef] {
        &self.arg_types
    }

    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    pub fn return_type(&self) -> &ConcreteRef {
        &self.return_type
    }

    pub fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Computes a fresh result. Write evaluators get a default-constructed destination.
    pub fn call(&self, args: &[&Value]) -> Value {
        match &self.implementation {
            Implementation::Generic(GenericFn::New(f)) => f(args),
            Implementation::Generic(GenericFn::Write(f)) => {
                let mut dst = self.return_type.init();
                f(args, &mut dst);
                dst
            }
            Implementation::InlineBinary(op) => op.apply(args[0], args[1]),
            Implementation::InlineUnary(op) => op.apply(args[0]),
            Implementation::Identity => self.return_type.clone_value(args[0]),
        }
    }

    /// Stores the result in `dst`, in place for write evaluators.
    pub fn call_into(&self, args: &[&Value], dst: &mut Value) {
        match &self.implementation {
            Implementation::Generic(GenericFn::Write(f)) => f(args, dst),
            Implementation::Identity => match self.return_type.copy_to_fn() {
                Some(copy_to) if self.kind == EvaluatorKind::Write => copy_to(args[0], dst),
                _ => *dst = self.return_type.clone_value(args[0]),
            },
            _ => *dst = self.call(args),
        }
    }

    pub fn signature(&self) -> String {
        format!(
            "({}) -> {}",
            self.arg_types.iter().map(|t| t.name()).join(", "),
            self.return_type.name()
        )
    }
}

fn parse_literal(token: &str) -> Option<Value> {
    match token {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::Int(i));
    }
    token.parse::<f64>().ok().map(Value::Real)
}

/// Evaluator description by concrete type names, built against a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct EvaluatorSpec {
    args: Vec<String>,
    returns: String,
    kind: EvaluatorKind,
    identity: bool,
    primitive: Option<String>,
    func: Option<GenericFn>,
}

impl EvaluatorSpec {
    pub fn new(args: &[&str], returns: &str) -> Self {
        Self {
            args: args.iter().map(|s| s.to_string()).collect(),
            returns: returns.to_string(),
            kind: EvaluatorKind::New,
            identity: false,
            primitive: None,
            func: None,
        }
    }

    pub fn kind(mut self, kind: EvaluatorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn primitive(mut self, token: &str) -> Self {
        self.primitive = Some(token.to_string());
        self
    }

    pub fn new_fn(mut self, f: impl Fn(&[&Value]) -> Value + Send + Sync + 'static) -> Self {
        self.kind = EvaluatorKind::New;
        self.func = Some(GenericFn::new(f));
        self
    }

    pub fn write_fn(mut self, f: impl Fn(&[&Value], &mut Value) + Send + Sync + 'static) -> Self {
        self.kind = EvaluatorKind::Write;
        self.func = Some(GenericFn::write(f));
        self
    }

    pub fn func(mut self, func: GenericFn) -> Self {
        self.kind = func.kind();
        self.func = Some(func);
        self
    }

    pub fn build(self, types: &TypeRegistry) -> Result<ConcreteEvaluator> {
        let args = self
            .args
            .iter()
            .map(|name| types.concrete_type(name))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| Error::Construction(format!("unknown argument type: {}", err)))?;
        let returns = types
            .concrete_type(&self.returns)
            .map_err(|err| Error::Construction(format!("unknown return type: {}", err)))?;
        ConcreteEvaluator::new(
            args,
            returns,
            self.kind,
            self.identity,
            self.primitive.as_deref(),
            self.func,
        )
    }
}
