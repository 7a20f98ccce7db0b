use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source {path}: {source}")]
    SourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dependency '{requested}' was found neither at {local} nor at {library}")]
    MissingDependency {
        requested: String,
        local: PathBuf,
        library: PathBuf,
    },
    #[error("cyclic dependency on {path} (through {chain})")]
    CyclicDependency { path: PathBuf, chain: String },
    #[error("failed to install package '{package}': {reason}")]
    InstallFailed { package: String, reason: String },
    #[error("builtin template was not found at {0}")]
    MissingTemplate(PathBuf),
    #[error("failed to read builtin template {path}: {source}")]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
    #[error("semantic error: {0}")]
    SemanticError(String),
    #[error("internal compiler error: {0}")]
    Internal(String),
}
