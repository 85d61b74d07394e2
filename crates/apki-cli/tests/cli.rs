//! Integration tests for the apki CLI
//!
//! Each test runs the binary in a fresh temporary directory with its own
//! HOME, so neither global nor local config from the host leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the apki binary, isolated in `dir`
#[allow(deprecated)]
fn apki(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("apki").expect("Failed to find apki binary");
    cmd.current_dir(dir)
        .env("HOME", dir.join("home"))
        .env_remove("APKI_CONFIG")
        .env_remove("APKI_STORE")
        .env_remove("APKI_BACKEND")
        .env_remove("APKI_INDEX")
        .env_remove("RUST_LOG");
    cmd
}

const INDEX: &str = r#"{
  "packages": [
    {"name": "musl", "provides": ["so:libc.musl-x86_64.so.1=1"]},
    {"name": "zlib", "provides": ["so:libz.so.1=1.2.11"], "depends": ["so:libc.musl-x86_64.so.1"]},
    {"name": "curl", "depends": ["so:libc.musl-x86_64.so.1", "so:libz.so.1", "ca-certificates"]},
    {"name": "ca-certificates", "provides": ["ca-certificates=20191127"]},
    {"name": "curl-doc", "installIf": ["docs", "curl=7.69.1"]}
  ]
}"#;

/// Temp dir with `index.json` written
fn setup() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(temp.path().join("index.json"), INDEX).expect("Failed to write index");
    temp
}

// ============================================================================
// Build and Query
// ============================================================================

#[test]
fn test_build_then_reuse() {
    let temp = setup();

    apki(temp.path())
        .args(["--index", "index.json", "build", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome": "built""#))
        .stdout(predicate::str::contains(r#""quads": 9"#));

    assert!(temp.path().join(".apki/graph.db").exists());

    // Second run reuses the store and does not need the index
    apki(temp.path())
        .args(["build", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome": "reused""#));
}

#[test]
fn test_deps() {
    let temp = setup();

    apki(temp.path())
        .args(["-q", "--index", "index.json", "deps", "curl"])
        .assert()
        .success()
        .stdout("ca-certificates\nmusl\nzlib\n");

    apki(temp.path())
        .args(["deps", "curl", "--hops", "2", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("musl"))
        .stdout(predicate::str::contains("zlib").not());
}

#[test]
fn test_stats_json() {
    let temp = setup();

    apki(temp.path())
        .args(["--index", "index.json", "stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""quads": 9"#))
        .stdout(predicate::str::contains(r#""nodes": 8"#));
}

#[test]
fn test_path_query() {
    let temp = setup();

    apki(temp.path())
        .args([
            "-q",
            "--index",
            "index.json",
            "path",
            "curl",
            "--step",
            "out:install-if",
        ])
        .assert()
        .success()
        .stdout("");

    apki(temp.path())
        .args(["-q", "path", "curl", "--step", "in:install-if"])
        .assert()
        .success()
        .stdout("curl-doc\n");
}

#[test]
fn test_show_keeps_raw_labels() {
    let temp = setup();

    apki(temp.path())
        .args(["-q", "--index", "index.json", "show", "zlib"])
        .assert()
        .success()
        .stdout(predicate::str::contains("so:libz.so.1=1.2.11"))
        .stdout(predicate::str::contains("depend"));
}

#[test]
fn test_memory_backend_builds_per_run() {
    let temp = setup();

    apki(temp.path())
        .args(["--backend", "memory", "--index", "index.json", "stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""quads": 9"#));

    assert!(!temp.path().join(".apki/graph.db").exists());
}

#[test]
fn test_explicit_store_path() {
    let temp = setup();
    let store = temp.path().join("data").join("custom.db");

    apki(temp.path())
        .args(["--index", "index.json", "--store"])
        .arg(&store)
        .args(["build", "--json"])
        .assert()
        .success();

    assert!(store.exists());
}

// ============================================================================
// Error Boundary
// ============================================================================

#[test]
fn test_bad_step_is_client_error() {
    let temp = setup();

    apki(temp.path())
        .args(["--index", "index.json", "path", "curl", "--step", "sideways:depend"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(r#""status":400"#))
        .stderr(predicate::str::contains(r#""code":"query""#));
}

#[test]
fn test_unknown_predicate_is_client_error() {
    let temp = setup();

    apki(temp.path())
        .args(["--index", "index.json", "path", "curl", "--step", "out:requires"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires"));
}

#[test]
fn test_hop_count_is_bounded() {
    let temp = setup();

    apki(temp.path())
        .args(["--index", "index.json", "deps", "curl", "--hops", "10000000000"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(r#""status":400"#))
        .stderr(predicate::str::contains("limit is 16"));

    apki(temp.path())
        .args(["deps", "curl", "--hops", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--hops"));
}

#[test]
fn test_missing_index_is_source_error() {
    let temp = TempDir::new().unwrap();

    apki(temp.path())
        .args(["deps", "curl"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""status":502"#))
        .stderr(predicate::str::contains("--index"));
}

#[test]
fn test_failed_build_can_be_retried() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("index.json"), "{ broken").unwrap();

    apki(temp.path())
        .args(["--index", "index.json", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""code":"source""#));

    std::fs::write(temp.path().join("index.json"), INDEX).unwrap();
    apki(temp.path())
        .args(["--index", "index.json", "build", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome": "built""#));
}

// ============================================================================
// Config Command
// ============================================================================

#[test]
fn test_config_init_and_show() {
    let temp = TempDir::new().unwrap();

    apki(temp.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".apki/config.toml"));
    assert!(temp.path().join(".apki/config.toml").exists());

    apki(temp.path())
        .args(["--backend", "memory", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"backend = "memory""#))
        .stdout(predicate::str::contains("max_steps = 16"));
}

#[test]
fn test_local_config_is_used() {
    let temp = setup();
    std::fs::create_dir_all(temp.path().join(".apki")).unwrap();
    std::fs::write(
        temp.path().join(".apki/config.toml"),
        "[source]\nindex = \"index.json\"\n\n[storage]\npath = \"graph/apk.db\"\n",
    )
    .unwrap();

    apki(temp.path())
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""quads": 9"#));

    assert!(temp.path().join("graph/apk.db").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("apki.toml");
    std::fs::write(&config, "[query]\nmax_steps = 0\n").unwrap();

    apki(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["stats"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("query.max_steps"));
}

#[test]
fn test_unknown_backend_flag() {
    let temp = TempDir::new().unwrap();

    apki(temp.path())
        .args(["--backend", "badger", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("badger"));
}
