use std::collections::BTreeSet;
use uuidfs::changes::PendingChange;
use uuidfs::remote::memory::{MemoryRemote, RemoteOp};
use uuidfs::types::FOLDER_MARKER;
use uuidfs::{ApiError, RemoteStore};

use crate::integration::support::{client_over, empty_client, remote_file, remote_folder};

fn seeded() -> MemoryRemote {
    let remote = MemoryRemote::new().with_principal("alice");
    remote.seed(remote_folder("f-docs", "origin", "Docs"));
    remote.seed(remote_file("r-readme", "origin/Docs", "Readme", ".md", "# hello"));
    remote.seed(remote_file("r-notes", "origin", "notes", ".txt", "remember"));
    remote
}

#[test]
fn test_nested_create_emits_ancestors_first() {
    let (_, client) = empty_client();
    client.create("/a/b/c.txt", "hi").unwrap();

    let pending = client.pending_changes();
    assert_eq!(pending.len(), 3);
    let added: Vec<(String, String, String)> = pending
        .iter()
        .map(|change| match change {
            PendingChange::Add(record) => (
                record.location.clone(),
                record.name.clone(),
                record.kind.clone(),
            ),
            other => panic!("expected Add, got {:?}", other),
        })
        .collect();
    assert_eq!(
        added,
        vec![
            ("origin".to_string(), "a".to_string(), FOLDER_MARKER.to_string()),
            ("origin/a".to_string(), "b".to_string(), FOLDER_MARKER.to_string()),
            ("origin/a/b".to_string(), "c".to_string(), ".txt".to_string()),
        ]
    );

    let expected: BTreeSet<String> = ["b".to_string()].into_iter().collect();
    assert_eq!(client.list_direct_children("/a"), expected);
}

#[test]
fn test_create_then_read_returns_content() {
    let (_, client) = empty_client();
    client.create("/hello.txt", "world").unwrap();

    assert_eq!(client.read_content("/hello.txt").unwrap(), "world");
    assert!(client.exists("/hello.txt").unwrap());
    assert_eq!(client.pending_len(), 1);
    assert!(matches!(client.pending_changes()[0], PendingChange::Add(_)));
}

#[test]
fn test_create_on_existing_path_is_rejected() {
    let (_, client) = client_over(seeded());
    let err = client.create("/docs/README.md", "again").unwrap_err();
    assert!(matches!(err, ApiError::AlreadyExists(_)));
    assert_eq!(client.pending_len(), 0);
}

#[test]
fn test_create_under_a_file_is_type_conflict() {
    let (_, client) = client_over(seeded());
    let err = client.create("/notes.txt/inner.txt", "x").unwrap_err();
    assert!(matches!(err, ApiError::TypeConflict(_)));
    assert_eq!(client.pending_len(), 0);
}

#[test]
fn test_create_reuses_existing_remote_folders() {
    let (remote, client) = client_over(seeded());
    client.create("/Docs/guide/intro.md", "start").unwrap();

    // Only `guide` and the file are new; Docs was fetched to confirm it is a folder.
    assert_eq!(client.pending_len(), 2);
    assert_eq!(remote.calls(RemoteOp::FetchRecords), 1);
}

#[test]
fn test_write_to_unknown_path_is_not_found() {
    let (_, client) = client_over(seeded());
    let err = client.write("/nope.txt", "x").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(client.pending_len(), 0);
}

#[test]
fn test_write_patches_data_edited_and_size() {
    let (_, client) = client_over(seeded());
    client.write("/notes.txt", "forget").unwrap();

    assert_eq!(client.read_content("/NOTES.TXT").unwrap(), "forget");
    let record = client.read("/notes.txt").unwrap();
    assert_eq!(record.size, 6);
    assert!(record.edited >= record.created);

    let pending = client.pending_changes();
    assert_eq!(pending.len(), 3);
    assert!(pending.iter().all(|c| c.target() == "r-notes"));
}

#[test]
fn test_read_content_of_folder_is_invalid_type() {
    let (_, client) = client_over(seeded());
    let err = client.read_content("/docs").unwrap_err();
    assert!(matches!(err, ApiError::InvalidType(_)));
}

#[test]
fn test_rename_moves_the_index_entry() {
    let (_, client) = client_over(seeded());
    client.rename("/notes.txt", "/Docs/Todo.md").unwrap();

    let record = client.read("/docs/todo.md").unwrap();
    assert_eq!(record.id, "r-notes");
    assert_eq!(
        client.normalizer().normalize(&record.raw_path()),
        client.normalizer().normalize("/Docs/Todo.md")
    );
    assert!(!client.exists("/notes.txt").unwrap());
    assert_eq!(record.content().unwrap(), "remember");
}

#[test]
fn test_rename_to_same_key_keeps_the_entry() {
    let (_, client) = client_over(seeded());
    client.rename("/notes.txt", "/NOTES.txt").unwrap();
    assert!(client.exists("/notes.txt").unwrap());
    assert_eq!(client.read("/notes.txt").unwrap().name, "NOTES");
}

#[test]
fn test_rename_folder_keeps_marker() {
    let (_, client) = client_over(seeded());
    client.rename("/docs", "/archive.old").unwrap();

    let record = client.read("/archive.old").unwrap();
    assert!(record.is_folder());
    assert_eq!(record.name, "archive.old");
}

#[test]
fn test_rename_onto_existing_path_overwrites_it() {
    let (_, client) = client_over(seeded());
    client.rename("/notes.txt", "/docs/readme.md").unwrap();

    assert_eq!(client.read("/docs/readme.md").unwrap().id, "r-notes");
    // The displaced record still exists by id.
    assert_eq!(client.stat_by_id("r-readme").unwrap().name, "Readme");
}

#[test]
fn test_remove_then_read_is_not_found_twice() {
    let (_, client) = client_over(seeded());
    client.remove("/notes.txt").unwrap();

    assert!(matches!(
        client.read("/notes.txt"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        client.remove("/notes.txt"),
        Err(ApiError::NotFound(_))
    ));
    assert_eq!(
        client.pending_changes(),
        vec![PendingChange::Delete("r-notes".to_string())]
    );
}

#[test]
fn test_removed_id_is_not_refetched() {
    let (remote, client) = client_over(seeded());
    client.remove("/notes.txt").unwrap();
    assert!(matches!(
        client.stat_by_id("r-notes"),
        Err(ApiError::NotFound(_))
    ));
    assert_eq!(remote.calls(RemoteOp::FetchRecords), 0);
}

#[test]
fn test_case_and_form_variants_share_one_key() {
    let (_, client) = empty_client();
    client.create("/Caf\u{e9}.txt", "nfc").unwrap();
    // Decomposed e + combining acute, upper case
    assert!(client.exists("/CAFE\u{301}.TXT").unwrap());
    assert!(matches!(
        client.create("/cafe\u{301}.txt", "nfd"),
        Err(ApiError::AlreadyExists(_))
    ));
}

#[test]
fn test_list_paths_is_sorted() {
    let (_, client) = client_over(seeded());
    assert_eq!(
        client.list_paths().unwrap(),
        vec!["/docs", "/docs/readme.md", "/notes.txt"]
    );
}

#[test]
fn test_listing_degrades_to_empty_when_index_is_unavailable() {
    let remote = seeded();
    remote.fail_next(RemoteOp::FetchIndex, 1);
    let (_, client) = client_over(remote);

    assert!(client.list_direct_children("/").is_empty());
    // The next call loads successfully.
    assert_eq!(client.list_direct_children("/").len(), 2);
}

#[test]
fn test_index_load_failure_surfaces_as_remote_unavailable() {
    let remote = seeded();
    remote.fail_next(RemoteOp::FetchIndex, 1);
    let (_, client) = client_over(remote);
    assert!(matches!(
        client.read("/notes.txt"),
        Err(ApiError::RemoteUnavailable(_))
    ));
}

#[test]
fn test_prefetched_records_skip_record_fetches() {
    let (remote, client) = client_over(seeded().with_records_in_index());
    assert_eq!(client.read_content("/docs/readme.md").unwrap(), "# hello");
    assert_eq!(remote.calls(RemoteOp::FetchRecords), 0);
}

#[test]
fn test_stale_index_entry_is_not_found() {
    let (remote, client) = client_over(seeded());
    client.list_paths().unwrap();

    // Deleted behind the client's back after the index was loaded
    remote
        .apply_patches(&[PendingChange::Delete("r-notes".to_string())])
        .unwrap();
    assert!(matches!(
        client.read("/notes.txt"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_principal_comes_from_the_index() {
    let (_, client) = client_over(seeded());
    assert_eq!(client.principal().unwrap().as_deref(), Some("alice"));
}
