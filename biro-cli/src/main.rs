use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use biro_core::diagnostic::Diagnostic;
use biro_core::templates::default_template_root;
use biro_core::{CompileOptions, RecordingInstaller, compile_file, preprocess_file};
use clap::Parser;

/// Compile a biro program into C++ source.
#[derive(Parser, Debug)]
#[command(name = "biro", version, about, long_about = None)]
struct Cli {
    /// Root .biro file
    input: PathBuf,

    #[arg(
        short,
        long,
        help = "Output file (defaults to the input with a .cpp extension)"
    )]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        env = "BIROLIB",
        help = "Library root searched by !add (defaults to $BIROHOME/lib, then ./lib)"
    )]
    lib: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Directory holding the builtin C++ templates (defaults to the bundled ones)"
    )]
    templates: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "cpp",
        help = "Output format: cpp, merged"
    )]
    emit: String,

    #[arg(short, long, help = "Log every pipeline stage")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Core warnings reach the user as printed diagnostics instead.
    let default_filter = if cli.verbose { "debug" } else { "warn,biro_core=error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let library_root = cli.lib.clone().unwrap_or_else(default_library_root);
    let options = CompileOptions::new(library_root)
        .with_template_root(cli.templates.clone().unwrap_or_else(default_template_root));
    let mut installer = RecordingInstaller::new();

    match cli.emit.as_str() {
        "cpp" => {
            let artifact = compile_file(&cli.input, &options, &mut installer)
                .with_context(|| format!("failed to compile {}", cli.input.display()))?;
            report(&artifact.diagnostics);
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| cli.input.with_extension("cpp"));
            write_output(&output, artifact.cpp.as_bytes())?;
            log::info!("wrote {}", output.display());
        }
        "merged" => {
            let preprocessed = preprocess_file(&cli.input, &options, &mut installer)
                .with_context(|| format!("failed to preprocess {}", cli.input.display()))?;
            report(&preprocessed.diagnostics);
            let merged = preprocessed.merged;
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| cli.input.with_extension("merged.biro"));
            write_output(&output, merged.as_bytes())?;
        }
        other => return Err(anyhow::anyhow!("unsupported emit format: {other}")),
    }

    for package in installer.requested() {
        eprintln!("note: package '{package}' is not installed by the compiler");
    }

    Ok(())
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn default_library_root() -> PathBuf {
    std::env::var_os("BIROHOME")
        .map(|home| PathBuf::from(home).join("lib"))
        .unwrap_or_else(|| PathBuf::from("lib"))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
