use crate::error::{Error, Result};
use crate::evaluator::ConcreteEvaluator;
use crate::types::{ConcreteRef, EvaluationMode};
use crate::value::{Scope, Value};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Name of the entry point every compiled unit exports.
pub const ENTRY_POINT: &str = "evaluate";

/// Where a step reads one of its inputs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Operand {
    /// An earlier binding of the frame.
    Slot(usize),
    /// An entry of the constant import table.
    Constant(usize),
}

impl Operand {
    #[inline]
    pub(crate) fn fetch<'v>(&self, inputs: &Inputs<'v>, done: &'v [Value]) -> &'v Value {
        match *self {
            Operand::Slot(index) => &done[index],
            Operand::Constant(index) => &inputs.constants[index],
        }
    }

    pub(crate) fn label(&self) -> String {
        match self {
            Operand::Slot(index) => format!("${}", index),
            Operand::Constant(index) => format!("c{}", index),
        }
    }
}

/// Per-call inputs visible to every step.
pub(crate) struct Inputs<'v> {
    pub scope: &'v Scope,
    pub args: &'v [Value],
    pub constants: &'v [Value],
}

/// Computes one binding from the inputs and the bindings before it.
pub(crate) type Step = Box<dyn Fn(&Inputs<'_>, &[Value], &mut Value) -> Result<()> + Send + Sync>;

/// Constants and implementations captured by a compiled program, each stored once.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    constants: Vec<Value>,
    functions: Vec<Arc<ConcreteEvaluator>>,
}

impl ImportTable {
    pub(crate) fn add_constant(&mut self, value: Value) -> usize {
        if let Some(index) = self.constants.iter().position(|c| c.identical(&value)) {
            return index;
        }
        self.constants.push(value);
        self.constants.len() - 1
    }

    pub(crate) fn add_function(&mut self, evaluator: &Arc<ConcreteEvaluator>) -> usize {
        if let Some(index) = self
            .functions
            .iter()
            .position(|f| Arc::ptr_eq(f, evaluator))
        {
            return index;
        }
        self.functions.push(evaluator.clone());
        self.functions.len() - 1
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn functions(&self) -> &[Arc<ConcreteEvaluator>] {
        &self.functions
    }
}

/// Binding storage for one invocation of a program.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    slots: Vec<Value>,
}

impl Frame {
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }
}

/// A linearized expression: one step per binding, in dependency order.
pub struct Program {
    pub(crate) steps: Vec<Step>,
    pub(crate) slot_types: Vec<ConcreteRef>,
    pub(crate) root: Operand,
    pub(crate) return_type: ConcreteRef,
    pub(crate) exported_args: Vec<String>,
    pub(crate) imports: ImportTable,
    pub(crate) listing: Vec<String>,
}

impl Program {
    pub fn new_frame(&self) -> Frame {
        Frame {
            slots: self.slot_types.iter().map(|ty| ty.init()).collect(),
        }
    }

    pub fn binding_count(&self) -> usize {
        self.steps.len()
    }

    pub fn return_type(&self) -> &ConcreteRef {
        &self.return_type
    }

    pub fn exported_args(&self) -> &[String] {
        &self.exported_args
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Human-readable form of the bindings, one per line, ending in `return`.
    pub fn listing(&self) -> &[String] {
        &self.listing
    }

    pub fn run(&self, args: &[Value], scope: &Scope, frame: &mut Frame) -> Result<Value> {
        if args.len() != self.exported_args.len() {
            return Err(Error::ArgumentCount {
                expected: self.exported_args.len(),
                found: args.len(),
            });
        }
        if frame.slots.len() != self.slot_types.len() {
            *frame = self.new_frame();
        }

        let inputs = Inputs {
            scope,
            args,
            constants: self.imports.constants(),
        };
        for (index, step) in self.steps.iter().enumerate() {
            let (done, rest) = frame.slots.split_at_mut(index);
            step(&inputs, done, &mut rest[0])?;
        }
        Ok(self.root.fetch(&inputs, &frame.slots).clone())
    }
}

impl Debug for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("listing", &self.listing)
            .field("return_type", &self.return_type.name())
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}

/// The result of compiling a resolved tree for one evaluation mode.
///
/// Immutable once built. Each call of [`evaluate`](Self::evaluate) uses a
/// private frame; [`evaluate_in`](Self::evaluate_in) reuses a caller-owned one.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    mode: EvaluationMode,
    entries: BTreeMap<String, Arc<Program>>,
}

impl CompiledUnit {
    pub(crate) fn new(mode: EvaluationMode, program: Program) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(ENTRY_POINT.to_string(), Arc::new(program));
        Self { mode, entries }
    }

    pub fn mode(&self) -> &EvaluationMode {
        &self.mode
    }

    pub fn entry_points(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, name: &str) -> Option<&Arc<Program>> {
        self.entries.get(name)
    }

    pub fn program(&self) -> &Program {
        // `new` always inserts the entry point
        &self.entries[ENTRY_POINT]
    }

    pub fn new_frame(&self) -> Frame {
        self.program().new_frame()
    }

    pub fn evaluate(&self, scope: &Scope) -> Result<Value> {
        self.evaluate_args(&[], scope)
    }

    pub fn evaluate_args(&self, args: &[Value], scope: &Scope) -> Result<Value> {
        let mut frame = self.new_frame();
        self.evaluate_in(args, scope, &mut frame)
    }

    pub fn evaluate_in(&self, args: &[Value], scope: &Scope, frame: &mut Frame) -> Result<Value> {
        self.program().run(args, scope, frame)
    }

    pub fn imports(&self) -> &ImportTable {
        self.program().imports()
    }

    pub fn listing(&self) -> &[String] {
        self.program().listing()
    }

    pub fn binding_count(&self) -> usize {
        self.program().binding_count()
    }
}
