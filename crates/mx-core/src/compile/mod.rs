//! Linearizes a resolved tree into a [`CompiledUnit`] for one evaluation mode.
//!
//! Every node gets one binding, children before parents. Variables are read
//! once per name, and a cast binding is inserted wherever a child's concrete
//! type differs from what the winning evaluator expects. Literals are cast
//! at compile time and only the final value is imported. Groups forward
//! their child's binding.

mod unit;

pub use unit::{CompiledUnit, Frame, ImportTable, Program, ENTRY_POINT};

use crate::ast::{Node, NodeKind, TypeSlot};
use crate::cast::{Cast, CastRegistry, ConcreteCast};
use crate::config::{self, EngineConfig};
use crate::error::{Error, Result};
use crate::evaluator::{ConcreteEvaluator, Implementation};
use crate::types::{ConcreteRef, EvaluationMode, TypeRef};
use crate::utils::is_valid_variable_name;
use crate::value::Value;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};
use unit::{Inputs, Operand, Step};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub mode: EvaluationMode,
    /// Check every scope variable against its concrete type before use.
    pub typechecks: bool,
    /// Variables passed positionally to the entry point instead of through the scope.
    pub exported_args: Vec<String>,
    /// Convert scope variables given in the default mode's representation
    /// into the compile mode's one before use.
    pub casts: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::normal(),
            typechecks: config::typechecks_enabled(),
            exported_args: Vec::new(),
            casts: false,
        }
    }
}

impl CompileOptions {
    pub fn new(mode: impl Into<EvaluationMode>) -> Self {
        Self {
            mode: mode.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            mode: config.default_mode.clone(),
            typechecks: config.typechecks,
            exported_args: Vec::new(),
            casts: false,
        }
    }

    pub fn with_typechecks(mut self, typechecks: bool) -> Self {
        self.typechecks = typechecks;
        self
    }

    pub fn with_casts(mut self, casts: bool) -> Self {
        self.casts = casts;
        self
    }

    pub fn with_exported_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exported_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in &self.exported_args {
            if !is_valid_variable_name(name) {
                return Err(Error::InvalidOption(format!(
                    "exported argument `{}` is not a valid variable name",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidOption(format!(
                    "exported argument `{}` is listed twice",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Compiles `root`, which must have been resolved without errors.
pub fn compile(
    root: &Node,
    casts: &CastRegistry,
    config: &EngineConfig,
    options: &CompileOptions,
) -> Result<CompiledUnit> {
    options.validate()?;
    let mut compiler = Compiler {
        casts,
        config,
        options,
        steps: Vec::new(),
        slot_types: Vec::new(),
        listing: Vec::new(),
        imports: ImportTable::default(),
        variables: HashMap::new(),
        cast_cache: HashMap::new(),
    };
    let (bound, return_type) = compiler.compile_node(root)?;
    let root_operand = compiler.import(bound);
    compiler.listing.push(format!("return {}", root_operand.label()));

    debug!(
        "compiled `{}` for {} mode: {} bindings, {} constants, {} functions",
        root,
        options.mode,
        compiler.steps.len(),
        compiler.imports.constants().len(),
        compiler.imports.functions().len()
    );

    let program = Program {
        steps: compiler.steps,
        slot_types: compiler.slot_types,
        root: root_operand,
        return_type,
        exported_args: options.exported_args.clone(),
        imports: compiler.imports,
        listing: compiler.listing,
    };
    Ok(CompiledUnit::new(options.mode.clone(), program))
}

/// A compiled child: either a binding or a literal that has not been imported yet.
enum Bound {
    Operand(Operand),
    Literal(Value),
}

struct Compiler<'a> {
    casts: &'a CastRegistry,
    config: &'a EngineConfig,
    options: &'a CompileOptions,
    steps: Vec<Step>,
    slot_types: Vec<ConcreteRef>,
    listing: Vec<String>,
    imports: ImportTable,
    variables: HashMap<String, Operand>,
    cast_cache: HashMap<(Operand, String), Operand>,
}

impl Compiler<'_> {
    fn compile_node(&mut self, node: &Node) -> Result<(Bound, ConcreteRef)> {
        let ty = match node.ty() {
            TypeSlot::Resolved(ty) => ty.clone(),
            TypeSlot::Pending | TypeSlot::Unresolved => {
                return Err(Error::UnresolvedType {
                    node: node.to_string(),
                })
            }
        };

        match node.kind() {
            NodeKind::Group(group) => match group.children.as_slice() {
                [child] => self.compile_node(child),
                _ => Err(Error::UnresolvedType {
                    node: node.to_string(),
                }),
            },
            NodeKind::Variable(var) => {
                let concrete = self.concrete(&ty)?;
                if let Some(operand) = self.variables.get(&var.name) {
                    return Ok((Bound::Operand(*operand), concrete));
                }
                let operand = self.emit_variable(&var.name, &ty, &concrete)?;
                self.variables.insert(var.name.clone(), operand);
                Ok((Bound::Operand(operand), concrete))
            }
            NodeKind::Constant(constant) => {
                let concrete = self.concrete(&ty)?;
                let value = self.convert_constant(&ty, &concrete, &constant.value)?;
                Ok((Bound::Literal(value), concrete))
            }
            NodeKind::Operator(op) => {
                let Some(resolution) = op.resolution.as_ref() else {
                    return Err(Error::UnresolvedType {
                        node: node.to_string(),
                    });
                };
                let definition = &resolution.definition;
                let evaluator = definition
                    .evaluator(&self.options.mode)
                    .ok_or_else(|| Error::NoEvaluatorForMode {
                        subject: definition.signature(),
                        mode: self.options.mode.to_string(),
                    })?
                    .clone();

                let mut operands = Vec::with_capacity(op.children.len());
                for (child, expected) in op.children.iter().zip(evaluator.arg_types()) {
                    let (bound, concrete) = self.compile_node(child)?;
                    operands.push(self.cast_operand(bound, &concrete, expected)?);
                }
                let operand = self.emit_evaluator(&evaluator, operands);
                Ok((Bound::Operand(operand), evaluator.return_type().clone()))
            }
        }
    }

    fn concrete(&self, ty: &TypeRef) -> Result<ConcreteRef> {
        ty.concrete(&self.options.mode)
            .cloned()
            .ok_or_else(|| Error::NoEvaluatorForMode {
                subject: format!("type {} has no representation", ty),
                mode: self.options.mode.to_string(),
            })
    }

    /// The representation of `ty` in the default mode, which literals and
    /// convertible scope variables are written in.
    fn default_concrete<'t>(&self, ty: &'t TypeRef) -> Result<&'t ConcreteRef> {
        ty.concrete(&self.config.default_mode)
            .ok_or_else(|| Error::NoEvaluatorForMode {
                subject: format!("type {} has no representation", ty),
                mode: self.config.default_mode.to_string(),
            })
    }

    /// Literals are written in the default mode's representation; move them
    /// into the compile mode's one ahead of time.
    fn convert_constant(&self, ty: &TypeRef, target: &ConcreteRef, value: &Value) -> Result<Value> {
        let source = self.default_concrete(ty)?;
        match self.casts.get_concrete_cast(source, target) {
            Some(Cast::Identity) => Ok(value.clone()),
            Some(Cast::Convert(cast)) => Ok(cast.apply(value)),
            None => Err(Error::NoCast {
                from: source.name().to_string(),
                to: target.name().to_string(),
            }),
        }
    }

    fn import(&mut self, bound: Bound) -> Operand {
        match bound {
            Bound::Operand(operand) => operand,
            Bound::Literal(value) => Operand::Constant(self.imports.add_constant(value)),
        }
    }

    fn cast_operand(&mut self, bound: Bound, from: &ConcreteRef, to: &ConcreteRef) -> Result<Operand> {
        let cast = match self.casts.get_concrete_cast(from, to) {
            Some(Cast::Identity) => return Ok(self.import(bound)),
            Some(Cast::Convert(cast)) => cast,
            None => {
                return Err(Error::NoCast {
                    from: from.name().to_string(),
                    to: to.name().to_string(),
                })
            }
        };

        let operand = match bound {
            Bound::Literal(value) => {
                return Ok(Operand::Constant(self.imports.add_constant(cast.apply(&value))))
            }
            Bound::Operand(operand) => operand,
        };
        let key = (operand, to.name().to_string());
        if let Some(cached) = self.cast_cache.get(&key) {
            return Ok(*cached);
        }
        let cast_operand = self.emit_cast(&cast, operand);
        self.cast_cache.insert(key, cast_operand);
        Ok(cast_operand)
    }

    fn push_step(&mut self, step: Step, ty: &ConcreteRef, line: String) -> Operand {
        let index = self.steps.len();
        let line = format!("${} = {}", index, line);
        trace!("{}", line);
        self.steps.push(step);
        self.slot_types.push(ty.clone());
        self.listing.push(line);
        Operand::Slot(index)
    }

    /// The cast applied to a scope variable handed over in the default
    /// mode's representation, if the `casts` option asks for one.
    fn variable_cast(&self, ty: &TypeRef, target: &ConcreteRef) -> Result<Option<(ConcreteRef, Arc<ConcreteCast>)>> {
        if !self.options.casts {
            return Ok(None);
        }
        let source = self.default_concrete(ty)?;
        match self.casts.get_concrete_cast(source, target) {
            Some(Cast::Identity) => Ok(None),
            Some(Cast::Convert(cast)) => Ok(Some((source.clone(), cast))),
            None => Err(Error::NoCast {
                from: source.name().to_string(),
                to: target.name().to_string(),
            }),
        }
    }

    fn emit_variable(&mut self, name: &str, ty: &TypeRef, concrete: &ConcreteRef) -> Result<Operand> {
        let check = self.options.typechecks.then(|| concrete.clone());
        let conversion = self.variable_cast(ty, concrete)?;
        let position = self.options.exported_args.iter().position(|arg| arg == name);
        let mut line = match position {
            Some(index) => format!("args[{}]", index),
            None => format!("scope.{}", name),
        };
        if let Some((_, cast)) = &conversion {
            line.push_str(&format!(" (cast {})", cast));
        }
        if let Some(concrete) = &check {
            line.push_str(&format!(" (checked {})", concrete.name()));
        }

        let name = name.to_string();
        let target = concrete.clone();
        let step: Step = Box::new(
            move |inputs: &Inputs<'_>, _: &[Value], dst: &mut Value| -> Result<()> {
                let value = match position {
                    Some(index) => &inputs.args[index],
                    None => inputs
                        .scope
                        .get(&name)
                        .ok_or_else(|| Error::MissingVariable { name: name.clone() })?,
                };
                if let Some((source, cast)) = &conversion {
                    if !target.typecheck(value) && source.typecheck(value) {
                        cast.evaluator().call_into(&[value], dst);
                        return Ok(());
                    }
                }
                if let Some(concrete) = &check {
                    if let Some(message) = concrete.typecheck_verbose(value) {
                        return Err(Error::TypeCheck {
                            name: name.clone(),
                            message,
                        });
                    }
                }
                dst.clone_from(value);
                Ok(())
            },
        );
        Ok(self.push_step(step, concrete, line))
    }

    fn emit_cast(&mut self, cast: &Arc<ConcreteCast>, operand: Operand) -> Operand {
        let evaluator = cast.evaluator().clone();
        let function = self.imports.add_function(&evaluator);
        let line = format!("f{}({})  // {}", function, operand.label(), cast);
        let ty = evaluator.return_type().clone();
        let step = Self::generic_step(evaluator, vec![operand]);
        self.push_step(step, &ty, line)
    }

    fn emit_evaluator(&mut self, evaluator: &Arc<ConcreteEvaluator>, operands: Vec<Operand>) -> Operand {
        let labels = operands.iter().map(Operand::label).collect::<Vec<_>>();
        let ty = evaluator.return_type().clone();
        let (step, line): (Step, String) = match (evaluator.implementation(), operands.as_slice()) {
            (Implementation::InlineBinary(op), &[a, b]) => {
                let function = op.function();
                let step: Step = Box::new(
                    move |inputs: &Inputs<'_>, done: &[Value], dst: &mut Value| -> Result<()> {
                        *dst = function(a.fetch(inputs, done), b.fetch(inputs, done));
                        Ok(())
                    },
                );
                (step, format!("{} {} {}", labels[0], op.token(), labels[1]))
            }
            (Implementation::InlineUnary(op), &[a]) => {
                let function = op.function();
                let step: Step = Box::new(
                    move |inputs: &Inputs<'_>, done: &[Value], dst: &mut Value| -> Result<()> {
                        *dst = function(a.fetch(inputs, done));
                        Ok(())
                    },
                );
                (step, format!("{}{}", op.token(), labels[0]))
            }
            _ => {
                let function = self.imports.add_function(evaluator);
                let line = format!("f{}({})", function, labels.iter().join(", "));
                (Self::generic_step(evaluator.clone(), operands.clone()), line)
            }
        };
        self.push_step(step, &ty, line)
    }

    /// Calls through the evaluator, writing in place for write evaluators.
    /// Arity up to four is passed on the stack.
    fn generic_step(evaluator: Arc<ConcreteEvaluator>, operands: Vec<Operand>) -> Step {
        Box::new(
            move |inputs: &Inputs<'_>, done: &[Value], dst: &mut Value| -> Result<()> {
                let fetch = |operand: &Operand| operand.fetch(inputs, done);
                match operands.as_slice() {
                    [] => evaluator.call_into(&[], dst),
                    [a] => evaluator.call_into(&[fetch(a)], dst),
                    [a, b] => evaluator.call_into(&[fetch(a), fetch(b)], dst),
                    [a, b, c] => evaluator.call_into(&[fetch(a), fetch(b), fetch(c)], dst),
                    [a, b, c, d] => {
                        evaluator.call_into(&[fetch(a), fetch(b), fetch(c), fetch(d)], dst)
                    }
                    many => {
                        let args = many.iter().map(fetch).collect::<Vec<_>>();
                        evaluator.call_into(&args, dst)
                    }
                }
                Ok(())
            },
        )
    }
}
