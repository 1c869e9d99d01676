use miette::IntoDiagnostic;
use tracing::{info, warn};

use jvg_engine::context::GameContext;
use jvg_engine::memo_file::load_memo_file;
use jvg_engine::report::JvgReport;
use jvg_engine::{build_jvg, BuildError};

use crate::cli::BuildArgs;
use crate::commands::helpers::{
    parse_output_format, resolve_build_options, write_json_artifact, OutputFormat,
};

pub(crate) fn run_build_command(args: BuildArgs) -> miette::Result<()> {
    let format = parse_output_format(&args.format)?;
    let options = resolve_build_options(&args)?;
    let memo = load_memo_file(&args.file).into_diagnostic()?;
    info!(
        file = %args.file.display(),
        ranks = memo.game.num_ranks(),
        rows = memo.game.num_rows(),
        "Loaded memo"
    );

    let report = match build_jvg(&memo.algebra, &memo.game, &options) {
        Ok(jvg) => {
            let ctx = GameContext::new(&memo.algebra, &memo.game);
            JvgReport::from_graph(&ctx, &jvg, &options, args.samples)
        }
        Err(BuildError::Realizable) => {
            warn!("No initial state is winning for the environment; specification is realizable");
            JvgReport::realizable(&memo.game, &options)
        }
        Err(BuildError::Invariant(violation)) => {
            return Err(miette::miette!(
                "Justice violation graph construction failed: {violation}"
            ));
        }
    };

    if let Some(path) = &args.out {
        write_json_artifact(path, &report)?;
        info!(path = %path.display(), "Wrote report");
    }
    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?),
    }
    Ok(())
}
