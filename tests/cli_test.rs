//! End-to-end tests of command dispatch

use std::fs;

use clap::Parser;
use tempfile::TempDir;

use arbor_sampler::application::PartitionPayload;
use arbor_sampler::cli::args::Cli;
use arbor_sampler::cli::commands::execute_command;
use arbor_sampler::util::testing;

/// Two long edges along X: 0 -> 100 -> 200.
const SKELETON: &str = r#"{"skeleton_id": 3, "nodes": [[1, null, 0, 0, 0], [2, 1, 100, 0, 0], [3, 2, 200, 0, 0]]}"#;

fn workspace() -> (TempDir, String) {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("skeleton.json");
    fs::write(&path, SKELETON).unwrap();
    let path = path.to_string_lossy().to_string();
    (temp, path)
}

#[test]
fn given_partition_with_output_when_executing_then_writes_payload() {
    // Arrange
    let (temp, skeleton) = workspace();
    let out = temp.path().join("partition.json");
    let config_dir = temp.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from([
        "arbor-sampler",
        "-C",
        &config_dir,
        "partition",
        &skeleton,
        "--start",
        "1",
        "--end",
        "3",
        "--length",
        "50",
        "--error",
        "1",
        "--create-boundaries",
        "--output",
        &out.to_string_lossy(),
    ])
    .unwrap();

    // Act
    execute_command(&cli).unwrap();

    // Assert
    let payload: PartitionPayload =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(payload.added_nodes.len(), 2);
    assert_eq!(payload.intervals.len(), 4);
    assert_eq!(payload.intervals.first().map(|i| i[0]), Some(1));
    assert_eq!(payload.intervals.last().map(|i| i[1]), Some(3));
    assert!(payload.added_nodes.iter().all(|n| n.id < 0));
    assert_eq!(payload.added_nodes[0].x, 50.0);
    assert_eq!(payload.added_nodes[0].parent_id, 1);
    assert_eq!(payload.added_nodes[0].child_id, 2);
}

#[test]
fn given_end_above_start_when_executing_then_dataerr_exit_code() {
    let (temp, skeleton) = workspace();
    let config_dir = temp.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from([
        "arbor-sampler",
        "-C",
        &config_dir,
        "partition",
        &skeleton,
        "-s",
        "3",
        "-e",
        "1",
    ])
    .unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), arbor_sampler::exitcode::DATAERR);
}

#[test]
fn given_zero_length_override_when_executing_then_config_exit_code() {
    let (temp, skeleton) = workspace();
    let config_dir = temp.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from([
        "arbor-sampler",
        "-C",
        &config_dir,
        "preview",
        &skeleton,
        "--length",
        "0",
    ])
    .unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), arbor_sampler::exitcode::CONFIG);
}

#[test]
fn given_partition_without_end_when_parsing_then_usage_error() {
    let result = Cli::try_parse_from(["arbor-sampler", "partition", "s.json", "--start", "1"]);
    assert!(result.is_err());
}

#[test]
fn given_negative_placeholder_ids_when_parsing_then_accepted() {
    let cli = Cli::try_parse_from([
        "arbor-sampler", "members", "s.json", "--start", "-1", "--end", "5", "-b", "-2",
    ])
    .unwrap();
    assert!(cli.command.is_some());
}

#[test]
fn given_skeleton_when_executing_tree_then_succeeds() {
    let (temp, skeleton) = workspace();
    let config_dir = temp.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["arbor-sampler", "-C", &config_dir, "tree", &skeleton]).unwrap();

    let result = execute_command(&cli);

    assert!(result.is_ok());
}
