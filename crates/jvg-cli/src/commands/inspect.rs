use std::fmt::Write as _;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;

use jvg_engine::context::GameContext;
use jvg_engine::game::JusticeInfo;
use jvg_engine::memo_file::{load_memo_file, LoadedMemo};
use jvg_symbolic::{SymbolicAlgebra, VarRole};

use crate::commands::helpers::{parse_output_format, OutputFormat};

#[derive(Debug, Serialize)]
pub(crate) struct VariableSummary {
    pub(crate) name: String,
    pub(crate) role: VarRole,
    pub(crate) values: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RankSummary {
    pub(crate) rank: usize,
    /// States in `Z[rank]`, row marker excluded.
    pub(crate) states: u64,
    /// Number of progress columns per row.
    pub(crate) columns: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MemoSummary {
    pub(crate) variables: Vec<VariableSummary>,
    pub(crate) initial_states: u64,
    pub(crate) env_justices: Vec<JusticeInfo>,
    pub(crate) sys_justices: Vec<JusticeInfo>,
    pub(crate) ranks: Vec<RankSummary>,
}

pub(crate) fn summarize(memo: &LoadedMemo) -> MemoSummary {
    let alg = &memo.algebra;
    let game = &memo.game;
    let ctx = GameContext::new(alg, game);
    let vars = ctx.state_vars();
    let registry = alg.registry();
    let variables = registry
        .current_vars()
        .into_iter()
        .map(|id| {
            let var = registry.var(id);
            VariableSummary {
                name: var.name.clone(),
                role: var.role,
                values: var.values.clone(),
            }
        })
        .collect();
    let ranks = game
        .z
        .iter()
        .zip(&game.x)
        .enumerate()
        .map(|(rank, (layer, rows))| RankSummary {
            rank,
            states: alg.count(layer, &vars),
            columns: rows.iter().map(Vec::len).collect(),
        })
        .collect();
    MemoSummary {
        variables,
        initial_states: alg.count(&game.ini, &vars),
        env_justices: game.env_justices.clone(),
        sys_justices: game.sys_justices.clone(),
        ranks,
    }
}

pub(crate) fn render_summary_text(summary: &MemoSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Variables:");
    for var in &summary.variables {
        let _ = writeln!(out, "  {} ({:?}): {}", var.name, var.role, var.values.join(", "));
    }
    let _ = writeln!(out, "Initial states: {}", summary.initial_states);
    let ids = |list: &[JusticeInfo]| list.iter().map(|j| j.id.clone()).collect::<Vec<_>>().join(", ");
    let _ = writeln!(out, "Environment justices: {}", ids(&summary.env_justices));
    let _ = writeln!(out, "System justices: {}", ids(&summary.sys_justices));
    let _ = writeln!(out, "Ranks: {}", summary.ranks.len());
    for rank in &summary.ranks {
        let columns: Vec<String> = rank.columns.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "  rank {}: {} states, columns per row [{}]",
            rank.rank,
            rank.states,
            columns.join(", ")
        );
    }
    out
}

pub(crate) fn run_inspect_command(file: &Path, format: &str) -> miette::Result<()> {
    let format = parse_output_format(format)?;
    let memo = load_memo_file(file).into_diagnostic()?;
    let summary = summarize(&memo);
    match format {
        OutputFormat::Text => print!("{}", render_summary_text(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?),
    }
    Ok(())
}
