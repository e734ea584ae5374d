use miette::Diagnostic;
use std::result;
use thiserror::Error;

#[derive(Error, Debug, Clone, Diagnostic)]
pub enum Error {
    #[error("unknown type `{name}`")]
    #[diagnostic(code(mx::unknown_type))]
    UnknownType {
        name: String,
        #[help]
        help: Option<String>,
    },
    #[error("unknown operator `{name}`")]
    #[diagnostic(code(mx::unknown_operator))]
    UnknownOperator {
        name: String,
        #[help]
        help: Option<String>,
    },
    #[error("no viable overload for {name}({})", .args.join(", "))]
    #[diagnostic(code(mx::no_viable_overload))]
    NoViableOverload {
        name: String,
        args: Vec<String>,
        #[help]
        help: Option<String>,
    },
    #[error("no cast available from `{from}` to `{to}`")]
    #[diagnostic(code(mx::no_cast))]
    NoCast { from: String, to: String },
    #[error("construction error: {0}")]
    #[diagnostic(code(mx::construction))]
    Construction(String),
    #[error("registration conflict: {0}")]
    #[diagnostic(code(mx::registration))]
    Registration(String),
    #[error("cannot compile unresolved node `{node}`")]
    #[diagnostic(
        code(mx::unresolved_type),
        help("resolve the tree and check its outcome before compiling")
    )]
    UnresolvedType { node: String },
    #[error("no evaluator for mode `{mode}`: {subject}")]
    #[diagnostic(code(mx::no_evaluator_for_mode))]
    NoEvaluatorForMode { subject: String, mode: String },
    #[error("variable `{name}` was not found in the scope")]
    #[diagnostic(code(mx::missing_variable))]
    MissingVariable { name: String },
    #[error("variable `{name}` has the wrong type: {message}")]
    #[diagnostic(code(mx::type_check))]
    TypeCheck { name: String, message: String },
    #[error("expected {expected} positional arguments, found {found}")]
    #[diagnostic(code(mx::argument_count))]
    ArgumentCount { expected: usize, found: usize },
    #[error("invalid option: {0}")]
    #[diagnostic(code(mx::invalid_option))]
    InvalidOption(String),
    #[error("{0}")]
    #[diagnostic(code(mx::generic))]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// Errors a caller such as an interactive editor is expected to surface to its user.
    /// Everything else signals a configuration or programming mistake.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnknownType { .. }
                | Error::UnknownOperator { .. }
                | Error::NoViableOverload { .. }
                | Error::NoCast { .. }
                | Error::NoEvaluatorForMode { .. }
                | Error::MissingVariable { .. }
                | Error::TypeCheck { .. }
                | Error::ArgumentCount { .. }
        )
    }

    pub fn help_text(&self) -> Option<String> {
        Diagnostic::help(self).map(|help| help.to_string())
    }

    pub fn code_text(&self) -> Option<String> {
        Diagnostic::code(self).map(|code| code.to_string())
    }
}

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(format!("{:#}", err))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
