//! Type resolution and compilation engine for mathematical expressions.
//!
//! An [`Environment`] holds the registries of mathematical and concrete types,
//! casts and operator overloads. Expression trees ([`ast::Node`]) are resolved
//! against it once, then compiled per evaluation mode into a [`CompiledUnit`]
//! that can be invoked repeatedly with different scopes.

#[macro_use]
pub mod macros;

pub mod ast;
pub mod cast;
pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod operator;
pub mod types;
pub mod utils;
pub mod value;

pub use tracing;

pub use ast::{Node, NodeKind, ResolutionOutcome, TraversalOrder, TypeSlot, VariableTypes};
pub use cast::{Cast, CastRegistry, ConcreteCast, MathematicalCast};
pub use compile::{CompileOptions, CompiledUnit, Frame};
pub use config::EngineConfig;
pub use env::Environment;
pub use evaluator::{
    BinaryPrimitive, ConcreteEvaluator, EvaluatorKind, EvaluatorSpec, GenericFn, Implementation,
    UnaryPrimitive,
};
pub use operator::{OperatorDefinition, OperatorRegistry, OperatorSpec, Resolution};
pub use types::{ConcreteRef, ConcreteType, EvaluationMode, MathematicalType, TypeRef, TypeRegistry};
pub use value::{BoolInterval, Interval, Scope, Value};

pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
