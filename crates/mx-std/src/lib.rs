//! Built-in types, casts and operators for `mx-core`.
//!
//! Everything is registered for two evaluation modes: `normal`, where reals
//! are plain floats, and `interval`, where they are ranges used for robust
//! plotting. Complex numbers exist in normal mode only.

pub mod arithmetic;
pub mod casts;
pub mod functions;
pub mod interval;
pub mod logic;
pub mod types;
mod values;

use eyre::Context;
use mx_core::{EngineConfig, Environment};

/// An environment holding the whole standard library.
pub fn standard_environment() -> mx_core::Result<Environment> {
    standard_environment_with(EngineConfig::default())
}

pub fn standard_environment_with(config: EngineConfig) -> mx_core::Result<Environment> {
    let mut env = Environment::with_config(config);
    install(&mut env)?;
    Ok(env)
}

/// Registers the standard library into `env`. Operator overloads are appended
/// after any already present, so earlier registrations win resolution ties.
pub fn install(env: &mut Environment) -> eyre::Result<()> {
    types::install(env).wrap_err("registering standard types")?;
    casts::install(env).wrap_err("registering standard casts")?;
    arithmetic::install(env).wrap_err("registering arithmetic operators")?;
    logic::install(env).wrap_err("registering comparison and logic operators")?;
    functions::install(env).wrap_err("registering elementary functions")?;
    tracing::debug!(
        "standard library installed: {} types, {} operator names",
        env.types().mathematical_types().count(),
        env.operators().names().count()
    );
    Ok(())
}
