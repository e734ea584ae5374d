//! Implicit conversions between types.
//!
//! Mathematical casts decide which overloads are reachable during resolution;
//! concrete casts move values between representations during compilation.
//! Both registries answer a lookup with [`Cast::Identity`] when source and
//! destination coincide, the registered cast if one exists, or `None`.
//! Casts are never chained.

use crate::error::{Error, Result};
use crate::evaluator::{ConcreteEvaluator, EvaluatorSpec};
use crate::types::{ConcreteRef, MathematicalType, TypeRef, TypeRegistry};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Result of a successful cast lookup.
#[derive(Debug)]
pub enum Cast<T> {
    /// Source and destination are the same type; nothing to do.
    Identity,
    Convert(Arc<T>),
}

impl<T> Cast<T> {
    pub fn is_identity(&self) -> bool {
        matches!(self, Cast::Identity)
    }

    pub fn as_convert(&self) -> Option<&Arc<T>> {
        match self {
            Cast::Identity => None,
            Cast::Convert(cast) => Some(cast),
        }
    }
}

impl<T> Clone for Cast<T> {
    fn clone(&self) -> Self {
        match self {
            Cast::Identity => Cast::Identity,
            Cast::Convert(cast) => Cast::Convert(cast.clone()),
        }
    }
}

impl<T: Display> Display for Cast<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cast::Identity => f.write_str("identity"),
            Cast::Convert(cast) => write!(f, "{}", cast),
        }
    }
}

/// Number of non-identity casts in a cast list.
pub fn cast_distance<T>(casts: &[Cast<T>]) -> usize {
    casts.iter().filter(|cast| !cast.is_identity()).count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathematicalCast {
    source: TypeRef,
    dest: TypeRef,
    name: String,
}

impl MathematicalCast {
    pub fn new(source: TypeRef, dest: TypeRef) -> Self {
        let name = format!("{}->{}", source.name(), dest.name());
        Self { source, dest, name }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn source(&self) -> &TypeRef {
        &self.source
    }

    pub fn dest(&self) -> &TypeRef {
        &self.dest
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for MathematicalCast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A one-argument evaluator between two concrete types.
#[derive(Debug, Clone)]
pub struct ConcreteCast {
    evaluator: Arc<ConcreteEvaluator>,
}

impl ConcreteCast {
    pub fn new(evaluator: ConcreteEvaluator) -> Result<Self> {
        construction_ensure!(
            evaluator.arity() == 1,
            "a concrete cast takes exactly one argument, not {}",
            evaluator.arity()
        );
        Ok(Self {
            evaluator: Arc::new(evaluator),
        })
    }

    pub fn source(&self) -> &ConcreteRef {
        &self.evaluator.arg_types()[0]
    }

    pub fn dest(&self) -> &ConcreteRef {
        self.evaluator.return_type()
    }

    pub fn evaluator(&self) -> &Arc<ConcreteEvaluator> {
        &self.evaluator
    }

    pub fn apply(&self, value: &Value) -> Value {
        self.evaluator.call(&[value])
    }
}

impl Display for ConcreteCast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source().name(), self.dest().name())
    }
}

#[derive(Debug, Default)]
pub struct CastRegistry {
    mathematical: HashMap<String, HashMap<String, Arc<MathematicalCast>>>,
    concrete: HashMap<String, HashMap<String, Arc<ConcreteCast>>>,
}

impl CastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mathematical_cast(&mut self, cast: MathematicalCast) -> Result<Arc<MathematicalCast>> {
        if cast.source().is_same_type(cast.dest()) {
            return Err(Error::Registration(format!(
                "cast {} maps a type onto itself",
                cast
            )));
        }
        let cast = Arc::new(cast);
        let previous = self
            .mathematical
            .entry(cast.source().name().to_string())
            .or_default()
            .insert(cast.dest().name().to_string(), cast.clone());
        if previous.is_some() {
            tracing::warn!("mathematical cast {} replaced an earlier registration", cast);
        } else {
            tracing::debug!("registering mathematical cast {}", cast);
        }
        Ok(cast)
    }

    pub fn register_concrete_cast(&mut self, cast: ConcreteCast) -> Result<Arc<ConcreteCast>> {
        if cast.source().is_same_concrete_type(cast.dest()) {
            return Err(Error::Registration(format!(
                "concrete cast {} maps a type onto itself",
                cast
            )));
        }
        let cast = Arc::new(cast);
        let previous = self
            .concrete
            .entry(cast.source().name().to_string())
            .or_default()
            .insert(cast.dest().name().to_string(), cast.clone());
        if previous.is_some() {
            tracing::warn!("concrete cast {} replaced an earlier registration", cast);
        } else {
            tracing::debug!("registering concrete cast {}", cast);
        }
        Ok(cast)
    }

    /// Builds the evaluator against `types` and registers it as a concrete cast.
    pub fn define_concrete_cast(
        &mut self,
        types: &TypeRegistry,
        spec: EvaluatorSpec,
    ) -> Result<Arc<ConcreteCast>> {
        self.register_concrete_cast(ConcreteCast::new(spec.build(types)?)?)
    }

    pub fn get_mathematical_cast(
        &self,
        source: &MathematicalType,
        dest: &MathematicalType,
    ) -> Option<Cast<MathematicalCast>> {
        if source.is_same_type(dest) {
            return Some(Cast::Identity);
        }
        self.mathematical
            .get(source.name())
            .and_then(|casts| casts.get(dest.name()))
            .map(|cast| Cast::Convert(cast.clone()))
    }

    pub fn can_mathematical_cast(&self, source: &MathematicalType, dest: &MathematicalType) -> bool {
        self.get_mathematical_cast(source, dest).is_some()
    }

    pub fn get_concrete_cast(&self, source: &ConcreteRef, dest: &ConcreteRef) -> Option<Cast<ConcreteCast>> {
        if source.is_same_concrete_type(dest) {
            return Some(Cast::Identity);
        }
        self.concrete
            .get(source.name())
            .and_then(|casts| casts.get(dest.name()))
            .map(|cast| Cast::Convert(cast.clone()))
    }

    pub fn can_concrete_cast(&self, source: &ConcreteRef, dest: &ConcreteRef) -> bool {
        self.get_concrete_cast(source, dest).is_some()
    }

    pub fn mathematical_casts(&self) -> impl Iterator<Item = &Arc<MathematicalCast>> {
        self.mathematical.values().flat_map(|casts| casts.values())
    }

    pub fn concrete_casts(&self) -> impl Iterator<Item = &Arc<ConcreteCast>> {
        self.concrete.values().flat_map(|casts| casts.values())
    }
}
