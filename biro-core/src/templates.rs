use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::builtins::{BUILTINS, BuiltinKind};
use crate::error::CoreError;

/// Native sources of the four builtins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinTemplates {
    sources: Vec<(BuiltinKind, String)>,
}

impl BuiltinTemplates {
    pub fn get(&self, kind: BuiltinKind) -> &str {
        self.sources
            .iter()
            .find_map(|(k, source)| (*k == kind).then_some(source.as_str()))
            .unwrap_or_default()
    }
}

pub fn default_template_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../implementations/cpp")
}

/// Load every builtin template below `root`.
///
/// Templates are matched by file name anywhere under the root; the first
/// match in walk order wins. A missing template is reported with the path
/// it was expected at.
pub fn load_templates(root: impl AsRef<Path>) -> Result<BuiltinTemplates, CoreError> {
    let root = root.as_ref();
    let mut found: HashMap<String, PathBuf> = HashMap::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "cpp") {
            let name = entry.file_name().to_string_lossy().into_owned();
            found.entry(name).or_insert_with(|| path.to_path_buf());
        }
    }

    let mut sources = Vec::with_capacity(BUILTINS.len());
    for builtin in BUILTINS {
        let path = found
            .get(builtin.template)
            .ok_or_else(|| CoreError::MissingTemplate(root.join(builtin.template)))?;
        let source = fs::read_to_string(path).map_err(|source| CoreError::TemplateIo {
            path: path.clone(),
            source,
        })?;
        sources.push((builtin.kind, source));
    }
    log::debug!("loaded {} builtin templates from {}", sources.len(), root.display());
    Ok(BuiltinTemplates { sources })
}
