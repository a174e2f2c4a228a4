use exrec_core::session::api::{InitRequest, ListRequest};
use exrec_core::session::{
    ConversationRecord, ExperienceRepository, ExperienceSummary, Manifest, SessionId, SessionState,
};
use exrec_infrastructure::{DirExperienceRepository, validate_directory};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn init_request(session_id: &str) -> InitRequest {
    InitRequest {
        session_id: Some(session_id.to_string()),
        metadata: serde_json::from_value(json!({"agent": "writer", "run": 3})).unwrap(),
        summary: ExperienceSummary {
            name: "Fix flaky test".to_string(),
            context: "ci pipeline".to_string(),
            summary: "Race in the file watcher".to_string(),
            flow: vec!["reproduce".to_string(), "fix".to_string()],
            topics: vec!["testing".to_string(), "rust".to_string()],
        },
    }
}

fn records(n: usize) -> Vec<ConversationRecord> {
    (0..n)
        .map(|i| ConversationRecord::new(format!("question {i}"), "answer", "rationale"))
        .collect()
}

fn id(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

fn read_manifest(repo: &DirExperienceRepository, session_id: &str) -> Manifest {
    let path = repo.session_dir(&id(session_id)).join("manifest.json");
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_single_batch_session_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s1 = id("s1");

    repo.init(init_request("s1")).expect("Should init session");
    repo.write_batch(&s1, 1, records(1)).expect("Should write batch");
    repo.write_notes(&s1, json!({"lessons": ["check timing"]}))
        .expect("Should write notes");
    let finalized = repo.finalize(&s1).expect("Should finalize");

    let manifest = read_manifest(&repo, "s1");
    assert_eq!(manifest.total_conversations, 1);
    assert_eq!(manifest.files.conversations, vec!["conversations_001.json".to_string()]);
    assert_eq!(manifest.files.notes.as_deref(), Some("notes.json"));
    assert_eq!(manifest.metadata["run"], json!(3));
    assert_eq!(manifest.version, "1.0");

    assert_eq!(
        finalized.files,
        vec!["conversations_001.json", "manifest.json", "notes.json"]
    );
    assert_eq!(finalized.total_files, 3);
    assert!(finalized.total_bytes > 0);

    let status = repo.status(&s1).expect("Should derive status");
    assert_eq!(status.status, SessionState::Completed);
    assert_eq!(status.next_batch, -1);
    assert!(!status.has_staging);
}

#[test]
fn test_fresh_session_is_initializing() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());

    repo.init(init_request("fresh")).unwrap();

    let status = repo.status(&id("fresh")).unwrap();
    assert_eq!(status.status, SessionState::Initializing);
    assert_eq!(status.next_batch, 1);
    assert!(status.has_staging);
}

#[test]
fn test_traversal_identifier_creates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let repo = DirExperienceRepository::with_root(&root);

    let err = repo.init(init_request("../../etc")).unwrap_err();
    assert!(err.is_invalid_identifier());
    assert!(!root.exists(), "No directory should be created");
}

#[test]
fn test_batches_in_any_order() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("order");

    repo.init(init_request("order")).unwrap();
    for n in [3, 1, 2] {
        repo.write_batch(&s, n, records(2)).unwrap();
    }

    let status = repo.status(&s).unwrap();
    assert_eq!(status.status, SessionState::InProgress);
    assert_eq!(status.next_batch, 4);
    assert_eq!(status.batch_numbers, vec![1, 2, 3]);

    repo.finalize(&s).unwrap();
    let manifest = read_manifest(&repo, "order");
    assert_eq!(
        manifest.files.conversations,
        vec![
            "conversations_001.json",
            "conversations_002.json",
            "conversations_003.json"
        ]
    );
    assert_eq!(manifest.total_conversations, 6);
}

#[test]
fn test_rewrite_replaces_batch_and_is_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("rewrite");
    repo.init(init_request("rewrite")).unwrap();

    let first = repo.write_batch(&s, 1, records(2)).unwrap();
    let first_bytes = fs::read(&first.file_path).unwrap();
    let second = repo.write_batch(&s, 1, records(2)).unwrap();
    assert_eq!(fs::read(&second.file_path).unwrap(), first_bytes);

    // A different payload fully replaces the old one
    repo.write_batch(&s, 1, records(5)).unwrap();
    repo.finalize(&s).unwrap();
    assert_eq!(read_manifest(&repo, "rewrite").total_conversations, 5);
}

#[test]
fn test_gaps_are_tolerated() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("gaps");
    repo.init(init_request("gaps")).unwrap();

    repo.write_batch(&s, 1, records(1)).unwrap();
    repo.write_batch(&s, 5, records(4)).unwrap();

    assert_eq!(repo.status(&s).unwrap().next_batch, 6);

    repo.finalize(&s).unwrap();
    let manifest = read_manifest(&repo, "gaps");
    assert_eq!(manifest.total_conversations, 5);
    assert_eq!(manifest.files.conversations.len(), 2);
}

#[test]
fn test_finalize_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("again");
    repo.init(init_request("again")).unwrap();
    repo.write_batch(&s, 1, records(3)).unwrap();

    let first = repo.finalize(&s).unwrap();
    let manifest_bytes = fs::read(&first.manifest_path).unwrap();

    for _ in 0..3 {
        let again = repo.finalize(&s).expect("Re-running finalize should succeed");
        assert_eq!(again.files, first.files);
        assert_eq!(fs::read(&again.manifest_path).unwrap(), manifest_bytes);
    }

    let status = repo.status(&s).unwrap();
    assert_eq!(status.status, SessionState::Completed);
    assert_eq!(status.next_batch, -1);
}

#[test]
fn test_finalize_clears_stale_staging() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("stale");
    repo.init(init_request("stale")).unwrap();
    repo.write_batch(&s, 1, records(1)).unwrap();
    repo.finalize(&s).unwrap();

    // Crash between manifest write and staging delete leaves both behind
    repo.init(init_request("stale")).unwrap();
    assert!(repo.status(&s).unwrap().has_staging);

    repo.finalize(&s).unwrap();
    let status = repo.status(&s).unwrap();
    assert!(!status.has_staging);
    assert_eq!(read_manifest(&repo, "stale").total_conversations, 1);
}

#[test]
fn test_finalized_session_validates_clean() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("clean");
    repo.init(init_request("clean")).unwrap();
    repo.write_batch(&s, 1, records(2)).unwrap();
    repo.write_batch(&s, 2, records(1)).unwrap();
    repo.write_notes(&s, json!({"ok": true})).unwrap();
    let finalized = repo.finalize(&s).unwrap();

    let report = validate_directory(&finalized.directory).unwrap();
    assert!(report.valid, "{:?}", report.errors);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_tampered_batch_warns() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());
    let s = id("tamper");
    repo.init(init_request("tamper")).unwrap();
    let batch = repo.write_batch(&s, 1, records(2)).unwrap();
    let finalized = repo.finalize(&s).unwrap();

    // Drop a record without touching the declared count
    let mut value: serde_json::Value =
        serde_json::from_slice(&fs::read(&batch.file_path).unwrap()).unwrap();
    value["records"].as_array_mut().unwrap().pop();
    fs::write(&batch.file_path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();

    let report = validate_directory(&finalized.directory).unwrap();
    assert!(report.valid, "Count drift is a warning, not an error");
    assert!(!report.layers.semantic);
    assert!(!report.layers.cross_file);
    assert_eq!(report.warnings_for("conversations_001.json").len(), 1);
    assert_eq!(report.warnings_for("manifest.json").len(), 1);
}

#[test]
fn test_list_skips_unfinished_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DirExperienceRepository::with_root(temp_dir.path());

    for name in ["done", "pending"] {
        repo.init(init_request(name)).unwrap();
        repo.write_batch(&id(name), 1, records(1)).unwrap();
    }
    repo.finalize(&id("done")).unwrap();

    let listing = repo.list(&ListRequest::default()).unwrap();
    assert_eq!(listing.sessions.len(), 1);
    assert_eq!(listing.sessions[0].session_id, "done");
    assert_eq!(listing.sessions[0].total_conversations, 1);
    assert_eq!(listing.warnings.len(), 1);
    assert!(listing.warnings[0].contains("session_pending"));
}
