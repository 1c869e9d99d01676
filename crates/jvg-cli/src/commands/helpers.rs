// Shared helpers for the command handlers: argument parsing, option
// resolution and artifact output.

use std::fs;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;

use jvg_engine::BuildOptions;

use crate::cli::BuildArgs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(miette::miette!(
            "Unknown output format: {other}. Use 'text' or 'json'."
        )),
    }
}

/// Options file (or defaults) with the command-line flags applied on top.
pub(crate) fn resolve_build_options(args: &BuildArgs) -> miette::Result<BuildOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| miette::miette!("Failed to read {}: {e}", path.display()))?;
            serde_json::from_str::<BuildOptions>(&raw)
                .map_err(|e| miette::miette!("Invalid options file {}: {e}", path.display()))?
        }
        None => BuildOptions::default(),
    };
    if args.assumption_graphs {
        options.assumption_graphs = true;
    }
    if args.no_assumption_graphs {
        options.assumption_graphs = false;
    }
    if args.merge_attractors {
        options.merge_attractors = true;
    }
    if args.no_invariants {
        options.invariants = false;
    }
    Ok(options)
}

pub(crate) fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> miette::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(path, serde_json::to_string_pretty(value).into_diagnostic()?).into_diagnostic()?;
    Ok(())
}
