//! Core of the biro toolchain.
//!
//! The pipeline is:
//!
//!   root .biro file
//!     -> preprocessor (directives, merged translation unit)
//!     -> lexer        (tokens)
//!     -> parser       (statements)
//!     -> program      (global and function tables)
//!     -> codegen_cpp  (C++17 source)
//!
//! Building the emitted C++ and fetching packages are left to the caller;
//! `!install` requests reach it through [`PackageInstaller`].

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: preprocessing, lexing and parsing
// ---------------------------------------------------------------------

pub mod preprocessor;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layer: types and program tables
// ---------------------------------------------------------------------

pub mod types;
pub mod program;

// ---------------------------------------------------------------------
// Builtins and their native templates
// ---------------------------------------------------------------------

pub mod builtins;
pub mod templates;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen_cpp;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{
    CompilationArtifact, CompileOptions, compile_file, compile_source, preprocess_file,
};
pub use error::CoreError;
pub use preprocessor::{PackageInstaller, RecordingInstaller};
