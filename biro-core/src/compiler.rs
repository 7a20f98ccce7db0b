use std::path::{Path, PathBuf};

use crate::codegen_cpp::generate_cpp;
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::parser::parse;
use crate::preprocessor::{Dependency, PackageInstaller, PreprocessedSource, Preprocessor};
use crate::program::Program;
use crate::templates::{BuiltinTemplates, default_template_root, load_templates};

/// Where the compiler looks for `!add` libraries and builtin templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub library_root: PathBuf,
    pub template_root: PathBuf,
}

impl CompileOptions {
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        CompileOptions {
            library_root: library_root.into(),
            template_root: default_template_root(),
        }
    }

    pub fn with_template_root(mut self, template_root: impl Into<PathBuf>) -> Self {
        self.template_root = template_root.into();
        self
    }
}

#[derive(Debug)]
pub struct CompilationArtifact {
    pub cpp: String,
    pub dependencies: Vec<Dependency>,
    /// Recoverable diagnostics, preprocessor warnings first, then the
    /// lexer's. Fatal problems are returned as errors.
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the preprocessor alone and return the merged translation unit.
pub fn preprocess_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
    installer: &mut dyn PackageInstaller,
) -> Result<PreprocessedSource, CoreError> {
    Preprocessor::new(&options.library_root, installer).process(path)
}

/// Compile a root source file, following its directives, into C++.
pub fn compile_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
    installer: &mut dyn PackageInstaller,
) -> Result<CompilationArtifact, CoreError> {
    let PreprocessedSource {
        merged,
        dependencies,
        mut diagnostics,
        ..
    } = preprocess_file(path, options, installer)?;
    let templates = load_templates(&options.template_root)?;
    let mut artifact = compile_source(&merged, &templates)?;
    diagnostics.append(&mut artifact.diagnostics);
    artifact.diagnostics = diagnostics;
    artifact.dependencies = dependencies;
    Ok(artifact)
}

/// Compile an already merged translation unit into C++.
pub fn compile_source(
    source: &str,
    templates: &BuiltinTemplates,
) -> Result<CompilationArtifact, CoreError> {
    let parsed = parse(source)?;
    for diagnostic in &parsed.diagnostics {
        log::warn!("{diagnostic}");
    }
    let program = Program::collect(parsed.statements)?;
    let cpp = generate_cpp(&program, templates)?;
    Ok(CompilationArtifact {
        cpp,
        dependencies: Vec::new(),
        diagnostics: parsed.diagnostics,
    })
}
