//! Directive resolution and source merging.
//!
//! A file may start with a run of directive lines:
//!
//! ```text
//! !install json
//! !add util/strings.biro
//! ```
//!
//! The run ends at the first line that does not start with `!` (blank
//! lines included). `add` targets are looked up next to the referencing
//! file first and in the library root second, and are resolved
//! depth-first so nested chains flatten ahead of the file that asked for
//! them. The merged unit is every `add` target in dependency order
//! followed by the root file, with directive lines removed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::span::{FileId, Span};

/// One parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Install(String),
    Add(String),
    Unknown { command: String, args: String },
}

impl Directive {
    /// Parse a trimmed line starting with `!`.
    pub fn parse(line: &str) -> Option<Directive> {
        let body = line.strip_prefix('!')?.trim();
        let (command, args) = body
            .split_once(char::is_whitespace)
            .map_or((body, ""), |(command, args)| (command, args.trim()));
        Some(match command {
            "install" => Directive::Install(args.to_string()),
            "add" => Directive::Add(args.to_string()),
            _ => Directive::Unknown {
                command: command.to_string(),
                args: args.to_string(),
            },
        })
    }
}

/// Entry of the ordered dependency list. Entries are unique as exact
/// values; `Add` carries the resolved absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Install(String),
    Add(PathBuf),
    Other { command: String, args: String },
}

/// Hook for `!install` directives. Package retrieval itself lives outside
/// the compiler.
pub trait PackageInstaller {
    fn install(&mut self, package: &str) -> Result<(), CoreError>;
}

/// Installer that only records what was requested.
#[derive(Debug, Default)]
pub struct RecordingInstaller {
    requested: Vec<String>,
}

impl RecordingInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl PackageInstaller for RecordingInstaller {
    fn install(&mut self, package: &str) -> Result<(), CoreError> {
        log::info!("package '{package}' requested");
        self.requested.push(package.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedSource {
    pub merged: String,
    pub dependencies: Vec<Dependency>,
    /// Warnings about directives that were skipped. Spans point into the
    /// file at index `span.file` of [`PreprocessedSource::files`].
    pub diagnostics: Vec<Diagnostic>,
    /// Every file read, in load order.
    pub files: Vec<PathBuf>,
}

pub struct Preprocessor<'a> {
    library_root: PathBuf,
    installer: &'a mut dyn PackageInstaller,
    dependencies: Vec<Dependency>,
    /// Files whose directives are being resolved, outermost first.
    chain: Vec<PathBuf>,
    sources: HashMap<PathBuf, String>,
    files: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(library_root: impl Into<PathBuf>, installer: &'a mut dyn PackageInstaller) -> Self {
        Preprocessor {
            library_root: library_root.into(),
            installer,
            dependencies: Vec::new(),
            chain: Vec::new(),
            sources: HashMap::new(),
            files: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn process(mut self, root: impl AsRef<Path>) -> Result<PreprocessedSource, CoreError> {
        let root = canonical(root.as_ref())?;
        self.resolve(&root)?;
        log::debug!(
            "resolved {} dependencies for {}",
            self.dependencies.len(),
            root.display()
        );

        let mut merged = String::new();
        for dependency in &self.dependencies {
            if let Dependency::Add(path) = dependency {
                append_code_lines(&mut merged, self.source(path));
            }
        }
        append_code_lines(&mut merged, self.source(&root));

        Ok(PreprocessedSource {
            merged,
            dependencies: self.dependencies,
            diagnostics: self.diagnostics,
            files: self.files,
        })
    }

    fn resolve(&mut self, file: &Path) -> Result<(), CoreError> {
        if self.chain.iter().any(|open| open == file) {
            let chain = self
                .chain
                .iter()
                .chain(std::iter::once(&file.to_path_buf()))
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CoreError::CyclicDependency {
                path: file.to_path_buf(),
                chain,
            });
        }

        let directives = leading_directives(self.load(file)?);
        let file_id = self.file_id(file);

        self.chain.push(file.to_path_buf());
        for (directive, start, end) in directives {
            let dependency = match directive {
                Directive::Install(package) => {
                    let dependency = Dependency::Install(package.clone());
                    if !self.dependencies.contains(&dependency) {
                        self.installer.install(&package)?;
                    }
                    dependency
                }
                Directive::Add(requested) => {
                    let target = self.locate(file, &requested)?;
                    self.resolve(&target)?;
                    Dependency::Add(target)
                }
                Directive::Unknown { command, args } => Dependency::Other { command, args },
            };
            if self.dependencies.contains(&dependency) {
                continue;
            }
            if let Dependency::Other { command, .. } = &dependency {
                log::warn!(
                    "{}: unknown directive '!{command}' is ignored",
                    file.display()
                );
                self.diagnostics.push(Diagnostic::warning(
                    format!("unknown directive '!{command}' is ignored"),
                    Span::new(file_id, start, end),
                ));
            }
            self.dependencies.push(dependency);
        }
        self.chain.pop();
        Ok(())
    }

    /// Resolve an `add` argument relative to the referencing file, falling
    /// back to the library root.
    fn locate(&self, referencing: &Path, requested: &str) -> Result<PathBuf, CoreError> {
        let local = referencing
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(requested);
        if local.is_file() {
            return canonical(&local);
        }
        let library = self.library_root.join(requested);
        if library.is_file() {
            return canonical(&library);
        }
        Err(CoreError::MissingDependency {
            requested: requested.to_string(),
            local,
            library,
        })
    }

    fn load(&mut self, file: &Path) -> Result<&str, CoreError> {
        if !self.sources.contains_key(file) {
            let text = fs::read_to_string(file).map_err(|source| CoreError::SourceIo {
                path: file.to_path_buf(),
                source,
            })?;
            self.sources.insert(file.to_path_buf(), text);
            self.files.push(file.to_path_buf());
        }
        Ok(self.source(file))
    }

    fn file_id(&self, file: &Path) -> FileId {
        let index = self.files.iter().position(|known| known == file);
        FileId(index.unwrap_or(self.files.len()) as u32)
    }

    fn source(&self, file: &Path) -> &str {
        // Every merged file was loaded while resolving directives.
        self.sources.get(file).map(String::as_str).unwrap_or_default()
    }
}

fn canonical(path: &Path) -> Result<PathBuf, CoreError> {
    fs::canonicalize(path).map_err(|source| CoreError::SourceIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Directives of the leading `!` run with the byte range of each line.
fn leading_directives(text: &str) -> Vec<(Directive, u32, u32)> {
    let mut directives = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let Some(directive) = Directive::parse(line.trim()) else {
            break;
        };
        let start = offset + (line.len() - line.trim_start().len());
        let end = offset + line.trim_end().len();
        directives.push((directive, start as u32, end as u32));
        offset += line.len();
    }
    directives
}

/// Append every line of `text` that is not a directive, then a blank line.
fn append_code_lines(merged: &mut String, text: &str) {
    for line in text.lines() {
        if !line.trim_start().starts_with('!') {
            merged.push_str(line);
            merged.push('\n');
        }
    }
    merged.push('\n');
}
