use crate::types::EvaluationMode;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const FALLBACK_VARIABLE_TYPE: &str = "real";

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// Whether compiled units check scope variables against their concrete types by default.
pub fn typechecks_enabled() -> bool {
    static TYPECHECKS: OnceLock<bool> = OnceLock::new();
    *TYPECHECKS.get_or_init(|| bool_from_env("MX_TYPECHECKS"))
}

/// Type given to variables missing from the caller's variable-type map.
pub fn default_variable_type() -> &'static str {
    static DEFAULT_TYPE: OnceLock<String> = OnceLock::new();
    DEFAULT_TYPE.get_or_init(|| {
        std::env::var("MX_DEFAULT_VARIABLE_TYPE")
            .ok()
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| FALLBACK_VARIABLE_TYPE.to_string())
    })
}

/// Settings owned by an [`Environment`](crate::Environment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mathematical type of variables the caller did not type explicitly.
    pub default_variable_type: String,
    /// Mode whose representations constant literals are written in; also the
    /// default compile mode.
    pub default_mode: EvaluationMode,
    /// Default for [`CompileOptions::typechecks`](crate::CompileOptions).
    pub typechecks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_variable_type: default_variable_type().to_string(),
            default_mode: EvaluationMode::normal(),
            typechecks: typechecks_enabled(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        if config.default_variable_type.trim().is_empty() {
            bail!("default_variable_type must not be empty");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "typechecks": true }"#).unwrap();
        assert!(config.typechecks);
        assert_eq!(config.default_mode, EvaluationMode::normal());
        assert_eq!(config.default_variable_type, default_variable_type());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json("{ typechecks").unwrap_err();
        assert!(matches!(err, crate::Error::Generic(_)));

        let err = EngineConfig::from_json(r#"{ "default_variable_type": " " }"#).unwrap_err();
        assert_eq!(err.to_string(), "default_variable_type must not be empty");
    }
}
