use uuidfs::changes::PendingChange;
use uuidfs::record::Field;
use uuidfs::remote::memory::{MemoryRemote, RemoteOp};
use uuidfs::{ApiError, RemoteStore};

use crate::integration::support::{client_over, empty_client, remote_file};

#[test]
fn test_empty_commit_makes_no_remote_call() {
    let (remote, client) = empty_client();
    assert!(client.commit().unwrap().is_none());
    assert_eq!(remote.calls(RemoteOp::ApplyPatches), 0);
    assert_eq!(remote.calls(RemoteOp::FetchIndex), 0);
}

#[test]
fn test_commit_applies_and_clears_the_log() {
    let (remote, client) = empty_client();
    let id = client.create("/docs/a.txt", "alpha").unwrap();

    let receipt = client.commit().unwrap().unwrap();
    assert_eq!(receipt.applied, 2);
    assert_eq!(client.pending_len(), 0);
    assert_eq!(remote.record(&id).unwrap().content().unwrap(), "alpha");
    assert_eq!(remote.record_count(), 2);
}

#[test]
fn test_failed_commit_keeps_every_change() {
    let (remote, client) = empty_client();
    client.create("/a.txt", "1").unwrap();
    client.write("/a.txt", "2").unwrap();
    let before = client.pending_changes();

    remote.fail_next(RemoteOp::ApplyPatches, 1);
    let err = client.commit().unwrap_err();
    assert!(matches!(err, ApiError::RemoteUnavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(client.pending_changes(), before);

    client.commit().unwrap();
    assert_eq!(remote.applied_batches(), vec![before]);
}

#[test]
fn test_changes_made_after_a_failed_commit_follow_the_retried_batch() {
    let (remote, client) = empty_client();
    client.create("/a.txt", "1").unwrap();
    remote.fail_next(RemoteOp::ApplyPatches, 1);
    client.commit().unwrap_err();

    client.create("/b.txt", "2").unwrap();
    client.commit().unwrap();

    let batches = remote.applied_batches();
    assert_eq!(batches.len(), 1);
    let names: Vec<String> = batches[0]
        .iter()
        .filter_map(|change| match change {
            PendingChange::Add(record) => Some(record.name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_write_then_remove_in_one_batch_is_accepted() {
    let remote = MemoryRemote::new();
    remote.seed(remote_file("r-1", "origin", "draft", ".txt", "v1"));
    let (remote, client) = client_over(remote);

    client.write("/draft.txt", "v2").unwrap();
    client.remove("/draft.txt").unwrap();
    let kinds: Vec<&str> = client.pending_changes().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec!["patch", "patch", "patch", "delete"]);

    client.commit().unwrap();
    assert!(remote.record("r-1").is_none());
}

#[test]
fn test_create_then_remove_in_one_batch_leaves_nothing_remote() {
    let (remote, client) = empty_client();
    client.create("/tmp.txt", "scratch").unwrap();
    client.remove("/tmp.txt").unwrap();
    client.commit().unwrap();
    assert_eq!(remote.record_count(), 0);
}

#[test]
fn test_batch_with_patch_after_delete_is_rejected_whole() {
    let remote = MemoryRemote::new();
    remote.seed(remote_file("r-1", "origin", "keep", ".txt", "v1"));
    let (remote, _) = client_over(remote);

    let batch = vec![
        PendingChange::patch("r-1", Field::Data, "v2".into()),
        PendingChange::Delete("r-1".to_string()),
        PendingChange::patch("r-1", Field::Size, 2.into()),
    ];
    assert!(remote.apply_patches(&batch).is_err());
    assert_eq!(remote.record("r-1").unwrap().content().unwrap(), "v1");
}

#[test]
fn test_rename_commits_as_field_patches() {
    let remote = MemoryRemote::new();
    remote.seed(remote_file("r-1", "origin", "old", ".txt", "body"));
    let (remote, client) = client_over(remote);

    client.create_folder("/dest").unwrap();
    client.rename("/old.txt", "/Dest/New.md").unwrap();
    client.commit().unwrap();

    let stored = remote.record("r-1").unwrap();
    assert_eq!(stored.location, "origin/Dest");
    assert_eq!(stored.name, "New");
    assert_eq!(stored.kind, ".md");
    assert_eq!(stored.content().unwrap(), "body");
}

#[test]
fn test_reloaded_index_matches_committed_state() {
    let (remote, client) = empty_client();
    client.create("/x/y.txt", "why").unwrap();
    client.commit().unwrap();

    client.invalidate_index();
    assert!(client.exists("/x/y.txt").unwrap());
    assert_eq!(remote.calls(RemoteOp::FetchIndex), 2);
}
