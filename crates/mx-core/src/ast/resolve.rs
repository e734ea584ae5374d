use super::{Node, NodeKind, TypeSlot};
use crate::cast::CastRegistry;
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostic;
use crate::error::Error;
use crate::operator::OperatorRegistry;
use crate::types::{TypeRef, TypeRegistry};
use std::collections::HashMap;
use tracing::warn;

/// Mathematical type names of variables, as supplied by the caller.
pub type VariableTypes = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub has_errors: bool,
    /// Registry failures behind the error diagnostics, in report order.
    errors: Vec<Error>,
}

impl ResolutionOutcome {
    pub fn is_ok(&self) -> bool {
        !self.has_errors
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// The first error, for callers that want `?`. Registry failures keep
    /// their own variant; malformed trees surface as [`Error::Generic`].
    pub fn into_result(self) -> crate::Result<()> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        match self.diagnostics.into_iter().find(Diagnostic::is_error) {
            Some(diagnostic) => Err(Error::Generic(diagnostic.to_string())),
            None => Ok(()),
        }
    }
}

/// Bottom-up type resolution pass. Failures are recorded as diagnostics and
/// mark the failing node and its ancestors [`TypeSlot::Unresolved`].
pub struct TypeResolver<'a> {
    types: &'a TypeRegistry,
    casts: &'a CastRegistry,
    operators: &'a OperatorRegistry,
    config: &'a EngineConfig,
    variables: &'a VariableTypes,
    diagnostics: Vec<Diagnostic>,
    errors: Vec<Error>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        types: &'a TypeRegistry,
        casts: &'a CastRegistry,
        operators: &'a OperatorRegistry,
        config: &'a EngineConfig,
        variables: &'a VariableTypes,
    ) -> Self {
        Self {
            types,
            casts,
            operators,
            config,
            variables,
            diagnostics: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, root: &mut Node) -> ResolutionOutcome {
        self.resolve_node(root);
        let has_errors = self.diagnostics.iter().any(Diagnostic::is_error);
        if has_errors {
            warn!(
                "type resolution of `{}` failed with {} error(s)",
                root,
                self.diagnostics.iter().filter(|d| d.is_error()).count()
            );
        }
        ResolutionOutcome {
            diagnostics: self.diagnostics,
            has_errors,
            errors: self.errors,
        }
    }

    fn resolve_node(&mut self, node: &mut Node) {
        let slot = match &mut node.kind {
            NodeKind::Group(group) => {
                for child in &mut group.children {
                    self.resolve_node(child);
                }
                match group.children.as_slice() {
                    [child] => child.ty.clone(),
                    children => {
                        self.report(Diagnostic::error(format!(
                            "a group must have exactly one child, found {}",
                            children.len()
                        )));
                        TypeSlot::Unresolved
                    }
                }
            }
            NodeKind::Variable(var) => {
                let type_name = self
                    .variables
                    .get(&var.name)
                    .map(String::as_str)
                    .unwrap_or(self.config.default_variable_type.as_str());
                match self.types.mathematical_type(type_name) {
                    Ok(ty) => TypeSlot::Resolved(ty),
                    Err(err) => {
                        self.report_error(err, Some(format!("variable `{}`", var.name)));
                        TypeSlot::Unresolved
                    }
                }
            }
            NodeKind::Constant(constant) => match self.types.mathematical_type(&constant.ty) {
                Ok(ty) => match self.check_constant(&ty, &constant.value) {
                    Some(message) => {
                        self.report(Diagnostic::error(format!(
                            "constant {} is not a valid {}: {}",
                            constant.value, constant.ty, message
                        )));
                        TypeSlot::Unresolved
                    }
                    None => TypeSlot::Resolved(ty),
                },
                Err(err) => {
                    self.report_error(err, Some(format!("constant {}", constant.value)));
                    TypeSlot::Unresolved
                }
            },
            NodeKind::Operator(op) => {
                op.resolution = None;
                for child in &mut op.children {
                    self.resolve_node(child);
                }
                let arg_types: Option<Vec<TypeRef>> = op
                    .children
                    .iter()
                    .map(|child| child.resolved_type().cloned())
                    .collect();
                match arg_types {
                    // a failure below was already reported
                    None => TypeSlot::Unresolved,
                    Some(arg_types) => {
                        match self.operators.resolve(&op.name, &arg_types, self.casts) {
                            Ok(resolution) => {
                                let ty = resolution.definition.return_type().clone();
                                op.resolution = Some(resolution);
                                TypeSlot::Resolved(ty)
                            }
                            Err(err) => {
                                self.report_error(err, None);
                                TypeSlot::Unresolved
                            }
                        }
                    }
                }
            }
        };
        node.ty = slot;
    }

    /// Checks a literal against its type's representation in the default mode.
    fn check_constant(&self, ty: &TypeRef, value: &crate::value::Value) -> Option<String> {
        ty.concrete(&self.config.default_mode)
            .and_then(|concrete| concrete.typecheck_verbose(value))
    }

    fn report_error(&mut self, err: Error, context: Option<String>) {
        let mut diagnostic = Diagnostic::from(&err);
        if let Some(context) = context {
            diagnostic = diagnostic.with_source_context(context);
        }
        self.report(diagnostic);
        self.errors.push(err);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
