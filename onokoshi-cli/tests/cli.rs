use std::path::{Path, PathBuf};
use std::process::Command;

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "onokoshi-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

/// Run the binary against `store`, writing output to a file, and return it.
fn run_cli(store: &Path, args: &[&str]) -> String {
    let exe = env!("CARGO_BIN_EXE_onokoshi");
    let output_path = temp_path("out");
    let output = Command::new(exe)
        .args(args)
        .arg("--store")
        .arg(store)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let _ = std::fs::remove_file(output_path);
    content
}

fn write_routes(label: &str, text: &str) -> PathBuf {
    let path = temp_path(label);
    std::fs::write(&path, text).expect("write routes");
    path
}

#[test]
fn cli_parse_previews_grouped_routes() {
    let routes = write_routes("parse", "-Katsu 5\n{Mond}Kaze (3)\nTsurumi 12\n");
    let store = temp_path("parse-store");
    let content = run_cli(&store, &["parse", "--file", routes.to_str().unwrap()]);
    assert!(content.contains("1. [Mond] Katsu (5)"));
    assert!(content.contains("2. [Mond] Kaze (3)"));
    assert!(content.contains("3. Tsurumi (12)"));
    assert!(content.contains("3 route(s), 20 elite(s)"));
    assert!(!store.exists());
}

#[test]
fn cli_stats_json_on_empty_store() {
    let store = temp_path("empty-store");
    let content = run_cli(&store, &["stats", "--report", "json"]);
    let value: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(value["routes"].as_array().map(Vec::len), Some(0));
    assert_eq!(value["tags"].as_array().map(Vec::len), Some(0));
}

#[test]
fn cli_records_a_run_and_reports_it() {
    let routes = write_routes("flow", "Katsu 5\nSeirei 8\n");
    let store = temp_path("flow-store");

    let registered = run_cli(
        &store,
        &[
            "route-set",
            "add",
            "--name",
            "400 NoLeyLine",
            "--expected",
            "13",
            "--file",
            routes.to_str().unwrap(),
        ],
    );
    let set_id = registered
        .split_whitespace()
        .nth(1)
        .expect("route set id")
        .to_string();
    assert!(run_cli(&store, &["route-set", "list"]).contains("400 NoLeyLine"));

    let started = run_cli(&store, &["run", "start", &set_id]);
    let run_id = started
        .split_whitespace()
        .nth(1)
        .expect("run id")
        .to_string();

    let marked = run_cli(
        &store,
        &[
            "run", "mark", &run_id, "Katsu", "--count", "2", "--tag", "#ミリ残し",
        ],
    );
    assert!(marked.contains("FINAL COUNT 11"));
    assert!(marked.contains("💬 #ミリ残し"));

    let report = run_cli(&store, &["stats", "--report", "markdown"]);
    assert!(report.contains("# Onokoshi Statistics"));
    assert!(report.contains("**Katsu**: 1 / 1 (100.0%)"));
    assert!(report.contains("#ミリ残し x1"));

    let _ = std::fs::remove_file(routes);
    let _ = std::fs::remove_file(store);
}

#[test]
fn cli_rejects_unknown_tags() {
    let exe = env!("CARGO_BIN_EXE_onokoshi");
    let store = temp_path("tags-store");
    let output = Command::new(exe)
        .args(["run", "mark", "missing", "Katsu", "--tag", "#nope", "--store"])
        .arg(&store)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown tag #nope"));
}

#[test]
fn cli_lists_default_tags() {
    let store = temp_path("vocab-store");
    let content = run_cli(&store, &["tags"]);
    assert_eq!(content.lines().count(), 6);
    assert!(content.lines().any(|line| line == "#あきらめた"));
}
