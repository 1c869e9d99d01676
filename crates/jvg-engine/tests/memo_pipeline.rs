//! Memo files on disk through graph construction and reporting.

mod common;

use std::io::Write;

use jvg_engine::context::GameContext;
use jvg_engine::memo_file::load_memo_str;
use jvg_engine::report::JvgReport;
use jvg_engine::{build_jvg, BuildError, BuildOptions, InvariantViolation, NodeId, NodeKindTag};
use jvg_symbolic::SymbolicAlgebra;

#[test]
fn alternating_memo_builds_the_expected_graph() {
    let memo = common::load_fixture("alternating.json");
    assert_eq!(memo.game.num_rows(), 2);
    assert_eq!(memo.game.num_ranks(), 2);

    let jvg = build_jvg(&memo.algebra, &memo.game, &BuildOptions::default()).unwrap();
    let tags: Vec<NodeKindTag> = jvg.nodes().map(|n| n.kind.tag()).collect();
    assert_eq!(
        tags,
        vec![
            NodeKindTag::Initial,
            NodeKindTag::AttractorFromCycle,
            NodeKindTag::AttractorNotFromCycle,
            NodeKindTag::Cycle,
        ]
    );
    let cycle = jvg.node(NodeId(3)).unwrap();
    let order = &cycle.assumptions().unwrap().edges;
    assert!(order.contains(&(0, 1)) && order.contains(&(1, 0)));
    let assumption = &cycle.assumptions().unwrap().nodes[&0].assumption;
    assert_eq!(assumption.id, "a0");
    assert_eq!(assumption.text, "e = 0");
}

#[test]
fn merging_shrinks_the_alternating_graph() {
    let memo = common::load_fixture("alternating.json");
    let options = BuildOptions {
        merge_attractors: true,
        ..BuildOptions::default()
    };
    let jvg = build_jvg(&memo.algebra, &memo.game, &options).unwrap();
    assert_eq!(jvg.node_count(), 3);
    assert_eq!(jvg.nodes_of_kind(NodeKindTag::Cycle), vec![NodeId(2)]);
    assert_eq!(jvg.parents(NodeId(2)), vec![NodeId(1)]);
}

#[test]
fn named_values_show_up_in_invariants_and_report() {
    let memo = common::load_fixture("copy.json");
    let options = BuildOptions::default();
    let jvg = build_jvg(&memo.algebra, &memo.game, &options).unwrap();
    assert_eq!(jvg.node_count(), 2);
    let cycles = jvg.nodes_of_kind(NodeKindTag::Cycle);
    assert_eq!(cycles.len(), 1);
    let invariants: Vec<String> = jvg
        .node(cycles[0])
        .unwrap()
        .invariants
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(invariants, vec!["e = false", "s = lo"]);

    let ctx = GameContext::new(&memo.algebra, &memo.game);
    let report = JvgReport::from_graph(&ctx, &jvg, &options, 8);
    let cycle = report.node(cycles[0]).unwrap();
    assert_eq!(cycle.violated_justice.as_deref(), Some("stay_high"));
    assert_eq!(cycle.sample_states[0]["s"], "lo");

    let rendered = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["env_justices"][0]["id"], "true");
    assert_eq!(parsed["options"]["merge_attractors"], false);
}

#[test]
fn inconsistent_progress_layers_are_reported() {
    // rank 0 claims (e=true, s=lo) makes progress without any move
    let json = common::read_fixture("copy.json").replace(
        r#""x": [[[{"eq": {"var": "s", "value": "lo"}}]], [["true"]]]"#,
        r#""x": [[[{"and": [{"eq": {"var": "e", "value": "true"}}, {"eq": {"var": "s", "value": "lo"}}]}]], [["true"]]]"#,
    );
    let json = json.replace(
        r#""initial": {"and": [{"eq": {"var": "e", "value": "false"}}"#,
        r#""initial": {"and": [{"eq": {"var": "e", "value": "true"}}"#,
    );
    let memo = load_memo_str(&json).unwrap();
    let err = build_jvg(&memo.algebra, &memo.game, &BuildOptions::default()).unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&InvariantViolation::PathStuck {
            rank: 0,
            row: 0,
            col: 0
        })
    );
}

#[test]
fn unreachable_losing_region_is_realizable() {
    let json = common::read_fixture("copy.json").replace(
        r#""initial": {"and": [{"eq": {"var": "e", "value": "false"}}, {"eq": {"var": "s", "value": "lo"}}]}"#,
        r#""initial": "false""#,
    );
    let memo = load_memo_str(&json).unwrap();
    assert!(memo.algebra.is_empty(&memo.game.ini));
    let err = build_jvg(&memo.algebra, &memo.game, &BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::Realizable));
}

#[test]
fn memo_written_to_a_temp_file_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(common::read_fixture("alternating.json").as_bytes())
        .unwrap();
    let memo = jvg_engine::memo_file::load_memo_file(file.path()).unwrap();
    assert_eq!(memo.game.sys_justices[0].id, "g0");
}
