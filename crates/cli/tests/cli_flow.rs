use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const ENV_OVERRIDES: &[&str] = &[
    "DOCQA_DOCS_DIR",
    "DOCS_DIR",
    "DOCQA_SNAPSHOT_PATH",
    "VECTOR_DB_PATH",
    "DOCQA_EMBEDDING_MODEL",
    "EMBEDDING_MODEL",
    "DOCQA_EMBEDDING_DIMENSION",
    "DOCQA_EMBEDDING_MODE",
    "DOCQA_EMBEDDING_BASE_URL",
    "OPENAI_BASE_URL",
    "DOCQA_API_KEY",
    "OPENAI_API_KEY",
];

#[allow(deprecated)]
fn docqa(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docqa").expect("binary");
    cmd.current_dir(workdir);
    for name in ENV_OVERRIDES {
        cmd.env_remove(name);
    }
    cmd.env("DOCQA_EMBEDDING_MODE", "stub")
        .env("DOCQA_EMBEDDING_DIMENSION", "64")
        .env("DOCQA_DOCS_DIR", workdir.join("docs"))
        .env("DOCQA_SNAPSHOT_PATH", workdir.join("vector_db/vector_store.json"));
    cmd
}

fn run_json(workdir: &Path, args: &[&str]) -> Value {
    let output = docqa(workdir).args(args).output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn setup_docs() -> TempDir {
    let temp = tempdir().unwrap();
    let docs = temp.path().join("docs");
    fs::create_dir_all(docs.join("guide")).unwrap();
    fs::write(
        docs.join("guide/setup.md"),
        "# Setup\n\nInstall the binary and set DOCS_DIR.\n\n## Troubleshooting\n\nCheck the logs on stderr.\n",
    )
    .unwrap();
    fs::write(
        docs.join("client.py"),
        "class Client:\n    def fetch(self, url):\n        return url\n",
    )
    .unwrap();
    fs::write(docs.join("prices.csv"), "sku,price\nA1,10\nB2,20\n").unwrap();
    temp
}

#[test]
fn index_then_search_returns_ranked_json() {
    let temp = setup_docs();
    let root = temp.path();

    let index = run_json(root, &["index", "--json"]);
    assert_eq!(index["rebuilt"], true);
    assert_eq!(index["model_id"], "stub-hash-64");
    assert_eq!(index["stats"]["documents"], 3);
    assert!(root.join("vector_db/vector_store.json").exists());

    let again = run_json(root, &["index", "--json"]);
    assert_eq!(again["rebuilt"], false);
    assert_eq!(again["records"], index["records"]);

    let search = run_json(root, &["search", "install the binary", "-k", "2", "--json"]);
    let hits = search["hits"].as_array().expect("hits");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["rank"], 1);
    assert!(hits[0]["score"].as_f64().unwrap() >= hits[1]["score"].as_f64().unwrap());
}

#[test]
fn search_without_index_builds_on_first_use() {
    let temp = setup_docs();
    docqa(temp.path())
        .args(["search", "logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(score: "))
        .stdout(predicate::str::contains("Lines: "));
}

#[test]
fn info_reports_staleness_without_embedding() {
    let temp = setup_docs();
    let root = temp.path();

    let before = run_json(root, &["info", "--json"]);
    assert_eq!(before["name"], "docqa");
    assert!(before["snapshot"].is_null());

    run_json(root, &["index", "--json"]);
    let fresh = run_json(root, &["info", "--json"]);
    assert_eq!(fresh["snapshot"]["compatible"], true);
    assert_eq!(fresh["snapshot"]["staleness"]["stale"], false);

    fs::write(root.join("docs/faq.md"), "# FAQ\n\nNew answers.\n").unwrap();
    let stale = run_json(root, &["info", "--json"]);
    assert_eq!(stale["snapshot"]["staleness"]["stale"], true);
}

#[test]
fn dimension_change_is_reported_incompatible_then_rebuilt() {
    let temp = setup_docs();
    let root = temp.path();
    run_json(root, &["index", "--json"]);

    let output = docqa(root)
        .env("DOCQA_EMBEDDING_DIMENSION", "32")
        .args(["info", "--json"])
        .output()
        .unwrap();
    let info: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["snapshot"]["compatible"], false);

    let output = docqa(root)
        .env("DOCQA_EMBEDDING_DIMENSION", "32")
        .args(["index", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rebuilt: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rebuilt["rebuilt"], true);
    assert_eq!(rebuilt["dimension"], 32);
}

#[test]
fn chunk_command_shows_sections() {
    let temp = setup_docs();
    let file = temp.path().join("docs/guide/setup.md");
    let out = run_json(temp.path(), &["chunk", file.to_str().unwrap(), "--json"]);
    assert_eq!(out["stats"]["total_chunks"], 2);
    assert_eq!(out["chunks"][1]["header_context"][1], "Troubleshooting");
}

#[test]
fn openai_mode_without_key_fails_with_config_error() {
    let temp = setup_docs();
    docqa(temp.path())
        .env("DOCQA_EMBEDDING_MODE", "openai")
        .args(["index"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));
}
