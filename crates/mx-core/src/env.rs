use crate::ast::{Node, ResolutionOutcome, TypeResolver, VariableTypes};
use crate::cast::{Cast, CastRegistry, ConcreteCast, MathematicalCast};
use crate::compile::{self, CompileOptions, CompiledUnit};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::evaluator::EvaluatorSpec;
use crate::operator::{OperatorDefinition, OperatorRegistry, OperatorSpec, Resolution};
use crate::types::{ConcreteRef, ConcreteType, MathematicalType, TypeRef, TypeRegistry};
use std::sync::Arc;

/// Owns every registry used to resolve and compile expressions.
///
/// Populate it mutably during initialization, then share it immutably.
#[derive(Debug, Default)]
pub struct Environment {
    types: TypeRegistry,
    casts: CastRegistry,
    operators: OperatorRegistry,
    config: EngineConfig,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn casts(&self) -> &CastRegistry {
        &self.casts
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn register_concrete_type(&mut self, concrete: ConcreteType) -> Result<ConcreteRef> {
        self.types.register_concrete_type(concrete)
    }

    pub fn register_mathematical_type(&mut self, ty: MathematicalType) -> Result<TypeRef> {
        self.types.register_mathematical_type(ty)
    }

    /// Registers a mathematical type from `(mode, concrete type name)` pairs.
    pub fn define_type(&mut self, name: &str, representations: &[(&str, &str)]) -> Result<TypeRef> {
        self.types.define_type(name, representations)
    }

    pub fn lookup_mathematical_type(&self, name: &str) -> Option<TypeRef> {
        self.types.lookup_mathematical_type(name)
    }

    pub fn lookup_concrete_type(&self, name: &str) -> Option<ConcreteRef> {
        self.types.lookup_concrete_type(name)
    }

    pub fn register_mathematical_cast(&mut self, cast: MathematicalCast) -> Result<Arc<MathematicalCast>> {
        self.casts.register_mathematical_cast(cast)
    }

    /// Registers the mathematical cast `source -> dest` by type names.
    pub fn define_mathematical_cast(&mut self, source: &str, dest: &str) -> Result<Arc<MathematicalCast>> {
        let source = self.types.mathematical_type(source)?;
        let dest = self.types.mathematical_type(dest)?;
        self.casts
            .register_mathematical_cast(MathematicalCast::new(source, dest))
    }

    pub fn register_concrete_cast(&mut self, cast: ConcreteCast) -> Result<Arc<ConcreteCast>> {
        self.casts.register_concrete_cast(cast)
    }

    pub fn define_concrete_cast(&mut self, spec: EvaluatorSpec) -> Result<Arc<ConcreteCast>> {
        self.casts.define_concrete_cast(&self.types, spec)
    }

    pub fn get_mathematical_cast(&self, source: &str, dest: &str) -> Result<Option<Cast<MathematicalCast>>> {
        let source = self.types.mathematical_type(source)?;
        let dest = self.types.mathematical_type(dest)?;
        Ok(self.casts.get_mathematical_cast(&source, &dest))
    }

    pub fn register_operator(&mut self, definition: OperatorDefinition) -> Arc<OperatorDefinition> {
        self.operators.register(definition)
    }

    pub fn define_operator(&mut self, spec: OperatorSpec) -> Result<Arc<OperatorDefinition>> {
        let definition = spec.build(&self.types)?;
        Ok(self.operators.register(definition))
    }

    /// Resolves one call site given its argument types.
    pub fn resolve_operator(&self, name: &str, args: &[TypeRef]) -> Result<Resolution> {
        self.operators.resolve(name, args, &self.casts)
    }

    /// Like [`resolve_operator`](Self::resolve_operator) with argument types by name.
    pub fn resolve_operator_by_names(&self, name: &str, args: &[&str]) -> Result<Resolution> {
        let args = args
            .iter()
            .map(|arg| self.types.mathematical_type(arg))
            .collect::<Result<Vec<_>>>()?;
        self.resolve_operator(name, &args)
    }

    /// Annotates every node of `root` with its type and every operator with
    /// its winning overload. Never fails; check the outcome before compiling.
    pub fn resolve(&self, root: &mut Node, variables: &VariableTypes) -> ResolutionOutcome {
        TypeResolver::new(
            &self.types,
            &self.casts,
            &self.operators,
            &self.config,
            variables,
        )
        .resolve(root)
    }

    pub fn compile(&self, root: &Node, options: &CompileOptions) -> Result<CompiledUnit> {
        compile::compile(root, &self.casts, &self.config, options)
    }

    /// Compile options seeded from this environment's configuration.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::from_config(&self.config)
    }
}
