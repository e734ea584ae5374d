use crate::cast::{cast_distance, Cast, CastRegistry, MathematicalCast};
use crate::error::{Error, Result};
use crate::evaluator::{ConcreteEvaluator, EvaluatorSpec};
use crate::types::{suggest, EvaluationMode, TypeRef, TypeRegistry};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

/// One overload of a named operator: a fixed signature of mathematical types
/// and an evaluator per evaluation mode.
#[derive(Debug, Clone)]
pub struct OperatorDefinition {
    name: String,
    arg_types: Vec<TypeRef>,
    return_type: TypeRef,
    evaluators: BTreeMap<EvaluationMode, Arc<ConcreteEvaluator>>,
}

impl OperatorDefinition {
    pub fn new(name: impl Into<String>, arg_types: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            arg_types,
            return_type,
            evaluators: BTreeMap::new(),
        }
    }

    /// Attaches the evaluator for `mode`. Its concrete signature must be the
    /// representation of this definition's signature in that mode.
    pub fn with_evaluator(mut self, mode: EvaluationMode, evaluator: ConcreteEvaluator) -> Result<Self> {
        construction_ensure!(
            evaluator.arity() == self.arg_types.len(),
            "{} evaluator {} has the wrong arity for {}",
            mode,
            evaluator.signature(),
            self
        );
        let expected = self
            .arg_types
            .iter()
            .chain(std::iter::once(&self.return_type));
        let actual = evaluator
            .arg_types()
            .iter()
            .chain(std::iter::once(evaluator.return_type()));
        for (ty, concrete) in expected.zip(actual) {
            let Some(representation) = ty.concrete(&mode) else {
                construction_bail!("type {} has no {} representation, needed by {}", ty, mode, self);
            };
            construction_ensure!(
                representation.is_same_concrete_type(concrete),
                "{} evaluator {} does not represent {}",
                mode,
                evaluator.signature(),
                self
            );
        }
        self.evaluators.insert(mode, Arc::new(evaluator));
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_types(&self) -> &[TypeRef] {
        &self.arg_types
    }

    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    pub fn evaluator(&self, mode: &EvaluationMode) -> Option<&Arc<ConcreteEvaluator>> {
        self.evaluators.get(mode)
    }

    pub fn modes(&self) -> impl Iterator<Item = &EvaluationMode> {
        self.evaluators.keys()
    }

    /// One cast per argument position, or `None` if any position cannot be reached.
    pub fn get_casts(&self, args: &[TypeRef], casts: &CastRegistry) -> Option<Vec<Cast<MathematicalCast>>> {
        if args.len() != self.arg_types.len() {
            return None;
        }
        args.iter()
            .zip(&self.arg_types)
            .map(|(actual, expected)| casts.get_mathematical_cast(actual, expected))
            .collect()
    }

    pub fn signature(&self) -> String {
        format!(
            "{}({}) -> {}",
            self.name,
            self.arg_types.iter().map(|t| t.name()).join(", "),
            self.return_type.name()
        )
    }
}

impl Display for OperatorDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Operator description by type names, built against a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct OperatorSpec {
    name: String,
    args: Vec<String>,
    returns: String,
    evaluators: Vec<(EvaluationMode, EvaluatorSpec)>,
}

impl OperatorSpec {
    pub fn new(name: &str, args: &[&str], returns: &str) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            returns: returns.to_string(),
            evaluators: Vec::new(),
        }
    }

    pub fn evaluator(mut self, mode: impl Into<EvaluationMode>, spec: EvaluatorSpec) -> Self {
        self.evaluators.push((mode.into(), spec));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(self, types: &TypeRegistry) -> Result<OperatorDefinition> {
        let args = self
            .args
            .iter()
            .map(|name| types.mathematical_type(name))
            .collect::<Result<Vec<_>>>()?;
        let returns = types.mathematical_type(&self.returns)?;
        let mut definition = OperatorDefinition::new(self.name, args, returns);
        for (mode, spec) in self.evaluators {
            definition = definition.with_evaluator(mode, spec.build(types)?)?;
        }
        Ok(definition)
    }
}

/// The winning overload for a call site.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub definition: Arc<OperatorDefinition>,
    /// Per argument position, how the actual type reaches the declared one.
    pub casts: Vec<Cast<MathematicalCast>>,
    pub distance: usize,
}

/// Candidate lists per operator name, in registration order.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Vec<Arc<OperatorDefinition>>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: OperatorDefinition) -> Arc<OperatorDefinition> {
        debug!("registering operator {}", definition);
        let definition = Arc::new(definition);
        self.operators
            .entry(definition.name().to_string())
            .or_default()
            .push(definition.clone());
        definition
    }

    pub fn candidates(&self, name: &str) -> &[Arc<OperatorDefinition>] {
        self.operators.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.candidates(name).is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Picks the candidate reachable with the fewest non-identity casts. Ties
    /// keep the earliest registration. Each argument gets at most one cast.
    pub fn resolve(&self, name: &str, args: &[TypeRef], casts: &CastRegistry) -> Result<Resolution> {
        let candidates = self.candidates(name);
        if candidates.is_empty() {
            let mut names = self.names().collect::<Vec<_>>();
            names.sort_unstable();
            return Err(Error::UnknownOperator {
                name: name.to_string(),
                help: suggest(name, names.into_iter()),
            });
        }

        let mut best: Option<Resolution> = None;
        for candidate in candidates {
            let Some(candidate_casts) = candidate.get_casts(args, casts) else {
                continue;
            };
            let distance = cast_distance(&candidate_casts);
            if best.as_ref().is_some_and(|best| best.distance <= distance) {
                continue;
            }
            best = Some(Resolution {
                definition: candidate.clone(),
                casts: candidate_casts,
                distance,
            });
            if distance == 0 {
                break;
            }
        }

        match best {
            Some(resolution) => {
                debug!(
                    "resolved {}({}) to {} at distance {}",
                    name,
                    args.iter().map(|t| t.name()).join(", "),
                    resolution.definition,
                    resolution.distance
                );
                Ok(resolution)
            }
            None => Err(Error::NoViableOverload {
                name: name.to_string(),
                args: args.iter().map(|t| t.name().to_string()).collect(),
                help: Some(format!(
                    "candidates are {}",
                    candidates.iter().map(|c| c.signature()).join(", ")
                )),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConcreteType;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn setup() -> (TypeRegistry, CastRegistry) {
        let mut types = TypeRegistry::new();
        for (name, init) in [("int", Value::Int(0)), ("real", Value::Real(0.0))] {
            let kind = init.kind_name();
            types
                .register_concrete_type(
                    ConcreteType::builder(name)
                        .primitive(true)
                        .init(move || init.clone())
                        .typecheck(move |v| v.kind_name() == kind)
                        .build()
                        .unwrap(),
                )
                .unwrap();
            types.define_type(name, &[("normal", name)]).unwrap();
        }
        let mut casts = CastRegistry::new();
        casts
            .register_mathematical_cast(MathematicalCast::new(
                types.mathematical_type("int").unwrap(),
                types.mathematical_type("real").unwrap(),
            ))
            .unwrap();
        (types, casts)
    }

    fn add(types: &TypeRegistry, ty: &str) -> OperatorDefinition {
        OperatorSpec::new("+", &[ty, ty], ty)
            .evaluator("normal", EvaluatorSpec::new(&[ty, ty], ty).primitive("+"))
            .build(types)
            .unwrap()
    }

    #[test]
    fn prefers_fewest_casts() {
        let (types, casts) = setup();
        let mut operators = OperatorRegistry::new();
        operators.register(add(&types, "real"));
        operators.register(add(&types, "int"));

        let int = types.mathematical_type("int").unwrap();
        let real = types.mathematical_type("real").unwrap();

        let exact = operators
            .resolve("+", &[int.clone(), int.clone()], &casts)
            .unwrap();
        assert_eq!(exact.definition.signature(), "+(int, int) -> int");
        assert_eq!(exact.distance, 0);

        let mixed = operators.resolve("+", &[int.clone(), real], &casts).unwrap();
        assert_eq!(mixed.definition.signature(), "+(real, real) -> real");
        assert_eq!(mixed.distance, 1);
        assert!(!mixed.casts[0].is_identity());
        assert!(mixed.casts[1].is_identity());
    }

    #[test]
    fn ties_keep_first_registration() {
        let (types, casts) = setup();
        let mut operators = OperatorRegistry::new();
        let first = operators.register(add(&types, "real"));
        operators.register(add(&types, "real"));

        let int = types.mathematical_type("int").unwrap();
        let resolution = operators.resolve("+", &[int.clone(), int], &casts).unwrap();
        assert!(Arc::ptr_eq(&resolution.definition, &first));
        assert_eq!(resolution.distance, 2);
    }

    #[test]
    fn failures_are_reported() {
        let (types, casts) = setup();
        let mut operators = OperatorRegistry::new();
        operators.register(add(&types, "int"));
        let real = types.mathematical_type("real").unwrap();

        let err = operators.resolve("-", &[real.clone()], &casts).unwrap_err();
        match err {
            Error::UnknownOperator { name, help } => {
                assert_eq!(name, "-");
                assert_eq!(help.as_deref(), Some("did you mean `+`?"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = operators
            .resolve("+", &[real.clone(), real], &casts)
            .unwrap_err();
        assert_eq!(err.to_string(), "no viable overload for +(real, real)");
        assert_eq!(
            err.help_text().as_deref(),
            Some("candidates are +(int, int) -> int")
        );
    }

    #[test]
    fn evaluator_must_match_signature() {
        let (types, _) = setup();
        let err = OperatorSpec::new("+", &["real", "real"], "real")
            .evaluator("normal", EvaluatorSpec::new(&["int", "int"], "int").primitive("+"))
            .build(&types)
            .unwrap_err();
        assert!(matches!(err, Error::Construction(_)));

        let err = OperatorSpec::new("+", &["real", "real"], "real")
            .evaluator(
                "interval",
                EvaluatorSpec::new(&["real", "real"], "real").primitive("+"),
            )
            .build(&types)
            .unwrap_err();
        assert!(err.to_string().contains("no interval representation"));
    }
}
