use std::sync::Arc;

use svncache::backend::MemoryBackend;
use svncache::config::SvnCacheConfig;
use svncache::error::ApiError;
use svncache::status::VersionState;
use svncache::sync::resolve_root;
use svncache::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

fn context(temp_dir: &TempDir) -> (Arc<MemoryBackend>, CliContext) {
    let root = resolve_root(temp_dir.path());
    let backend = Arc::new(MemoryBackend::new(&root));
    backend.set_file(root.join("a.txt"), VersionState::Modified);
    backend.set_file(root.join("b.txt"), VersionState::NotVersioned);
    let cli = CliContext::with_backend(root, SvnCacheConfig::default(), backend.clone()).unwrap();
    (backend, cli)
}

#[test]
fn list_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let (_backend, cli) = context(&temp_dir);

    let output = cli
        .execute(&Commands::List {
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert!(row.get("path").and_then(|v| v.as_str()).is_some());
        assert!(row.get("state").and_then(|v| v.as_str()).is_some());
        assert!(row.get("locked").and_then(|v| v.as_bool()).is_some());
        assert!(row.get("versioned").and_then(|v| v.as_bool()).is_some());
        assert!(row.get("modified").and_then(|v| v.as_bool()).is_some());
    }
    assert_eq!(rows[0]["path"], ".");
    assert_eq!(rows[1]["path"], "a.txt");
    assert_eq!(rows[1]["state"], "modified");
}

#[test]
fn status_of_unknown_path_reports_not_existing() {
    let temp_dir = TempDir::new().unwrap();
    let (_backend, cli) = context(&temp_dir);

    let output = cli
        .execute(&Commands::Status {
            path: "nowhere.txt".into(),
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["state"], "not-existing");
    assert_eq!(parsed["versioned"], false);
}

#[test]
fn cat_writes_historical_content() {
    let temp_dir = TempDir::new().unwrap();
    let (backend, cli) = context(&temp_dir);
    backend.set_content("svn://memory/trunk/a.txt", 1, "r1 body");
    let output_path = temp_dir.path().join("a.r1");

    cli.execute(&Commands::Cat {
        path: "a.txt".into(),
        revision: 1,
        output: output_path.clone(),
    })
    .unwrap();

    assert_eq!(std::fs::read_to_string(output_path).unwrap(), "r1 body");
}

#[test]
fn commit_on_unmodified_file_is_not_applied() {
    let temp_dir = TempDir::new().unwrap();
    let (backend, cli) = context(&temp_dir);
    backend.clear_calls();

    let result = cli.execute(&Commands::Commit {
        path: "b.txt".into(),
        message: "nope".to_string(),
    });

    assert!(matches!(result, Err(ApiError::NotApplied { .. })));
    assert!(backend.calls().is_empty());
}

#[test]
fn outside_working_copy_fails_to_open() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new("/somewhere/else"));
    let result = CliContext::with_backend(
        temp_dir.path().to_path_buf(),
        SvnCacheConfig::default(),
        backend,
    );
    assert!(matches!(result, Err(ApiError::NotWorkingCopy(_))));
}
