use crate::error::{Error, Result};
use crate::utils::find_similar_name;
use crate::value::Value;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type InitFn = Arc<dyn Fn() -> Value + Send + Sync>;
pub type TypecheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type VerboseTypecheckFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;
pub type CloneFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type CopyToFn = Arc<dyn Fn(&Value, &mut Value) + Send + Sync>;

pub type ConcreteRef = Arc<ConcreteType>;
pub type TypeRef = Arc<MathematicalType>;

/// Name of a family of concrete representations, e.g. `normal` or `interval`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct EvaluationMode(String);

impl EvaluationMode {
    pub const NORMAL: &'static str = "normal";
    pub const INTERVAL: &'static str = "interval";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn normal() -> Self {
        Self::new(Self::NORMAL)
    }

    pub fn interval() -> Self {
        Self::new(Self::INTERVAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EvaluationMode {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An in-memory representation of a mathematical type under one evaluation mode.
///
/// Primitive types are replaced wholesale when computed. Non-primitive types
/// may be overwritten in place by "write" evaluators and therefore must provide
/// `copy_to`.
#[derive(Clone)]
pub struct ConcreteType {
    name: String,
    is_primitive: bool,
    init: InitFn,
    default_value: Value,
    typecheck: TypecheckFn,
    typecheck_verbose: Option<VerboseTypecheckFn>,
    clone_fn: CloneFn,
    copy_to: Option<CopyToFn>,
}

impl ConcreteType {
    pub fn builder(name: impl Into<String>) -> ConcreteTypeBuilder {
        ConcreteTypeBuilder {
            name: name.into(),
            is_primitive: false,
            init: None,
            typecheck: None,
            typecheck_verbose: None,
            clone_fn: None,
            copy_to: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_primitive(&self) -> bool {
        self.is_primitive
    }

    /// The value produced by the initializer when the type was built.
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// A freshly constructed default value.
    pub fn init(&self) -> Value {
        (self.init)()
    }

    pub fn typecheck(&self, value: &Value) -> bool {
        (self.typecheck)(value)
    }

    /// `None` when the value is acceptable, otherwise a human-readable reason.
    pub fn typecheck_verbose(&self, value: &Value) -> Option<String> {
        if let Some(verbose) = &self.typecheck_verbose {
            return verbose(value);
        }
        if self.typecheck(value) {
            None
        } else {
            Some(format!(
                "expected {}, found {} value {}",
                self.name,
                value.kind_name(),
                value
            ))
        }
    }

    pub fn clone_value(&self, value: &Value) -> Value {
        (self.clone_fn)(value)
    }

    pub fn clone_fn(&self) -> &CloneFn {
        &self.clone_fn
    }

    pub fn copy_to_fn(&self) -> Option<&CopyToFn> {
        self.copy_to.as_ref()
    }

    pub fn is_same_concrete_type(&self, other: &ConcreteType) -> bool {
        self.name == other.name
    }

    /// Whether `other` was built from the same parts, making re-registration a no-op.
    pub fn same_definition(&self, other: &ConcreteType) -> bool {
        fn same_opt<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        self.name == other.name
            && self.is_primitive == other.is_primitive
            && Arc::ptr_eq(&self.init, &other.init)
            && Arc::ptr_eq(&self.typecheck, &other.typecheck)
            && Arc::ptr_eq(&self.clone_fn, &other.clone_fn)
            && same_opt(&self.typecheck_verbose, &other.typecheck_verbose)
            && same_opt(&self.copy_to, &other.copy_to)
    }
}

impl Debug for ConcreteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcreteType")
            .field("name", &self.name)
            .field("is_primitive", &self.is_primitive)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}

pub struct ConcreteTypeBuilder {
    name: String,
    is_primitive: bool,
    init: Option<InitFn>,
    typecheck: Option<TypecheckFn>,
    typecheck_verbose: Option<VerboseTypecheckFn>,
    clone_fn: Option<CloneFn>,
    copy_to: Option<CopyToFn>,
}

impl ConcreteTypeBuilder {
    pub fn primitive(mut self, is_primitive: bool) -> Self {
        self.is_primitive = is_primitive;
        self
    }

    pub fn init(mut self, init: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    pub fn typecheck(mut self, typecheck: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.typecheck = Some(Arc::new(typecheck));
        self
    }

    pub fn typecheck_verbose(
        mut self,
        verbose: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.typecheck_verbose = Some(Arc::new(verbose));
        self
    }

    pub fn clone_with(mut self, clone: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.clone_fn = Some(Arc::new(clone));
        self
    }

    pub fn copy_to(mut self, copy_to: impl Fn(&Value, &mut Value) + Send + Sync + 'static) -> Self {
        self.copy_to = Some(Arc::new(copy_to));
        self
    }

    pub fn build(self) -> Result<ConcreteType> {
        let Some(init) = self.init else {
            construction_bail!("no default initializer provided for concrete type {}", self.name);
        };
        let typecheck = self.typecheck.ok_or_else(|| {
            Error::Construction(format!("no typecheck provided for concrete type {}", self.name))
        })?;
        construction_ensure!(
            self.is_primitive || self.copy_to.is_some(),
            "non-primitive concrete type {} must provide copy_to",
            self.name
        );

        let default_value = init();
        construction_ensure!(
            typecheck(&default_value),
            "default value {} of concrete type {} fails its own typecheck",
            default_value,
            self.name
        );

        Ok(ConcreteType {
            name: self.name,
            is_primitive: self.is_primitive,
            init,
            default_value,
            typecheck,
            typecheck_verbose: self.typecheck_verbose,
            clone_fn: self.clone_fn.unwrap_or_else(|| Arc::new(|v: &Value| v.clone())),
            copy_to: self.copy_to,
        })
    }
}

/// Abstract value category such as `real` or `complex`, independent of representation.
/// Two mathematical types are the same iff their names match.
#[derive(Debug, Clone)]
pub struct MathematicalType {
    name: String,
    representations: BTreeMap<EvaluationMode, ConcreteRef>,
}

impl MathematicalType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            representations: BTreeMap::new(),
        }
    }

    pub fn with_representation(mut self, mode: impl Into<EvaluationMode>, concrete: ConcreteRef) -> Self {
        self.representations.insert(mode.into(), concrete);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concrete(&self, mode: &EvaluationMode) -> Option<&ConcreteRef> {
        self.representations.get(mode)
    }

    pub fn representations(&self) -> impl Iterator<Item = (&EvaluationMode, &ConcreteRef)> {
        self.representations.iter()
    }

    pub fn is_same_type(&self, other: &MathematicalType) -> bool {
        self.name == other.name
    }

    fn same_definition(&self, other: &MathematicalType) -> bool {
        self.name == other.name
            && self.representations.len() == other.representations.len()
            && self
                .representations
                .iter()
                .zip(other.representations.iter())
                .all(|((ma, ca), (mb, cb))| ma == mb && ca.name() == cb.name())
    }
}

impl PartialEq for MathematicalType {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_type(other)
    }
}

impl Eq for MathematicalType {}

impl Hash for MathematicalType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for MathematicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Registry of mathematical and concrete types. Append-only; re-registering an
/// identical definition returns the existing entry.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    mathematical: BTreeMap<String, TypeRef>,
    concrete: BTreeMap<String, ConcreteRef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_concrete_type(&mut self, concrete: ConcreteType) -> Result<ConcreteRef> {
        if let Some(existing) = self.concrete.get(concrete.name()) {
            if existing.same_definition(&concrete) {
                return Ok(existing.clone());
            }
            return Err(Error::Registration(format!(
                "concrete type `{}` is already registered with a different definition",
                concrete.name()
            )));
        }
        tracing::debug!("registering concrete type {}", concrete.name());
        let concrete = Arc::new(concrete);
        self.concrete
            .insert(concrete.name().to_string(), concrete.clone());
        Ok(concrete)
    }

    pub fn register_mathematical_type(&mut self, ty: MathematicalType) -> Result<TypeRef> {
        for (mode, concrete) in ty.representations() {
            match self.concrete.get(concrete.name()) {
                Some(known) if Arc::ptr_eq(known, concrete) || known.same_definition(concrete) => {}
                Some(_) => {
                    return Err(Error::Registration(format!(
                        "type `{}` uses an unregistered variant of concrete type `{}` in mode {}",
                        ty.name(),
                        concrete.name(),
                        mode
                    )))
                }
                None => return Err(self.unknown_concrete(concrete.name())),
            }
        }
        if let Some(existing) = self.mathematical.get(ty.name()) {
            if existing.same_definition(&ty) {
                return Ok(existing.clone());
            }
            return Err(Error::Registration(format!(
                "type `{}` is already registered with different representations",
                ty.name()
            )));
        }
        tracing::debug!(
            "registering type {} ({})",
            ty.name(),
            ty.representations()
                .map(|(mode, c)| format!("{}: {}", mode, c.name()))
                .join(", ")
        );
        let ty = Arc::new(ty);
        self.mathematical.insert(ty.name().to_string(), ty.clone());
        Ok(ty)
    }

    /// Register a mathematical type whose representations are named concrete types.
    pub fn define_type(&mut self, name: &str, representations: &[(&str, &str)]) -> Result<TypeRef> {
        let mut ty = MathematicalType::new(name);
        for (mode, concrete) in representations {
            ty = ty.with_representation(*mode, self.concrete_type(concrete)?);
        }
        self.register_mathematical_type(ty)
    }

    pub fn lookup_mathematical_type(&self, name: &str) -> Option<TypeRef> {
        self.mathematical.get(name).cloned()
    }

    pub fn lookup_concrete_type(&self, name: &str) -> Option<ConcreteRef> {
        self.concrete.get(name).cloned()
    }

    /// Like [`lookup_mathematical_type`](Self::lookup_mathematical_type), with a
    /// diagnostic error suggesting the closest known name.
    pub fn mathematical_type(&self, name: &str) -> Result<TypeRef> {
        self.lookup_mathematical_type(name).ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
            help: suggest(name, self.mathematical.keys().map(String::as_str)),
        })
    }

    pub fn concrete_type(&self, name: &str) -> Result<ConcreteRef> {
        self.lookup_concrete_type(name)
            .ok_or_else(|| self.unknown_concrete(name))
    }

    pub fn mathematical_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.mathematical.values()
    }

    pub fn concrete_types(&self) -> impl Iterator<Item = &ConcreteRef> {
        self.concrete.values()
    }

    fn unknown_concrete(&self, name: &str) -> Error {
        Error::UnknownType {
            name: name.to_string(),
            help: suggest(name, self.concrete.keys().map(String::as_str)),
        }
    }
}

/// "did you mean" text for a near miss, otherwise the list of valid names.
pub(crate) fn suggest<'a>(name: &str, mut known: impl Iterator<Item = &'a str> + Clone) -> Option<String> {
    if let Some(closest) = find_similar_name(name, known.clone(), 2) {
        return Some(format!("did you mean `{}`?", closest));
    }
    let all = known.join(", ");
    if all.is_empty() {
        None
    } else {
        Some(format!("valid names are {}", all))
    }
}
