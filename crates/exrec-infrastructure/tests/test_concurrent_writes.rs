use exrec_core::session::api::InitRequest;
use exrec_core::session::{
    BatchFile, ConversationRecord, ExperienceRepository, ExperienceSummary, SessionId,
};
use exrec_infrastructure::DirExperienceRepository;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn records(n: usize) -> Vec<ConversationRecord> {
    (0..n)
        .map(|i| ConversationRecord::new(format!("question {i}"), "answer", "rationale"))
        .collect()
}

#[test]
fn test_concurrent_writes_to_same_batch_all_succeed() {
    let temp_dir = TempDir::new().unwrap();
    let repo = Arc::new(DirExperienceRepository::with_root(temp_dir.path()));
    let session_id = SessionId::parse("race").unwrap();
    repo.init(InitRequest {
        session_id: Some("race".to_string()),
        metadata: Default::default(),
        summary: ExperienceSummary {
            name: "race".to_string(),
            context: "concurrent writers".to_string(),
            ..Default::default()
        },
    })
    .unwrap();

    const ROUNDS: usize = 25;
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [1usize, 400]
        .into_iter()
        .map(|size| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let session_id = session_id.clone();
            thread::spawn(move || {
                let payload = records(size);
                (0..ROUNDS)
                    .map(|_| {
                        barrier.wait();
                        repo.write_batch(&session_id, 1, payload.clone())
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for result in handle.join().unwrap() {
            let written = result.expect("Every concurrent write should succeed");
            assert!(written.processed == 1 || written.processed == 400);
        }
    }

    let session_dir = repo.session_dir(&session_id);
    let batch: BatchFile =
        serde_json::from_slice(&fs::read(session_dir.join("conversations_001.json")).unwrap())
            .expect("Final batch should be one complete write");
    assert!(batch.count == 1 || batch.count == 400);
    assert_eq!(batch.records.len(), batch.count);
    assert_eq!(batch.batch_number, 1);

    let leftovers: Vec<String> = fs::read_dir(&session_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}
