use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuidfs::changes::PendingChange;
use uuidfs::remote::memory::{MemoryRemote, RemoteOp};

use crate::integration::support::{client_over, remote_file, remote_folder};

#[test]
fn test_concurrent_first_use_fetches_the_index_once() {
    let remote = MemoryRemote::new().with_latency(Duration::from_millis(20));
    remote.seed(remote_file("r-1", "origin", "shared", ".txt", "data"));
    let (remote, client) = client_over(remote);
    let client = Arc::new(client);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            thread::spawn(move || client.read_content("/shared.txt").unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "data");
    }

    assert_eq!(remote.calls(RemoteOp::FetchIndex), 1);
}

#[test]
fn test_concurrent_creates_all_land_in_one_commit() {
    let (remote, client) = client_over(MemoryRemote::new());
    let client = Arc::new(client);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = Arc::clone(&client);
            thread::spawn(move || client.create(&format!("/batch/file-{}.txt", i), "x"))
        })
        .collect();
    let ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    // Exactly one thread created the shared parent folder.
    assert_eq!(client.pending_len(), 17);
    assert_eq!(client.list_direct_children("/batch").len(), 16);

    client.commit().unwrap();
    assert_eq!(remote.record_count(), 17);
    for id in ids {
        assert!(remote.record(&id).is_some());
    }
}

#[test]
fn test_writes_racing_a_commit_are_not_lost() {
    let remote = MemoryRemote::new().with_latency(Duration::from_millis(5));
    remote.seed(remote_file("r-1", "origin", "log", ".txt", ""));
    let (remote, client) = client_over(remote);
    let client = Arc::new(client);

    let writer = {
        let client = Arc::clone(&client);
        thread::spawn(move || {
            for i in 0..20 {
                client.write("/log.txt", &format!("line {}", i)).unwrap();
            }
        })
    };
    for _ in 0..5 {
        client.commit().unwrap();
    }
    writer.join().unwrap();
    client.commit().unwrap();

    assert_eq!(client.pending_len(), 0);
    let applied: usize = remote.applied_batches().iter().map(Vec::len).sum();
    assert_eq!(applied, 60);
    assert_eq!(remote.record("r-1").unwrap().content().unwrap(), "line 19");
}

#[test]
fn test_create_racing_index_invalidation_reuses_existing_folder() {
    let remote = MemoryRemote::new().with_latency(Duration::from_millis(200));
    remote.seed(remote_folder("f-docs", "origin", "Docs"));
    let (remote, client) = client_over(remote);
    let client = Arc::new(client);

    // Index load takes 0-200ms, the ancestor fetch 200-400ms.
    let creator = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.create("/docs/new.txt", "fresh"))
    };
    thread::sleep(Duration::from_millis(300));
    client.invalidate_index();
    creator.join().unwrap().unwrap();

    let added: Vec<String> = client
        .pending_changes()
        .iter()
        .filter_map(|change| match change {
            PendingChange::Add(record) => Some(record.raw_path()),
            _ => None,
        })
        .collect();
    assert_eq!(added, vec!["origin/Docs/new.txt".to_string()]);
    assert!(remote.calls(RemoteOp::FetchIndex) >= 2);
    assert_eq!(client.list_direct_children("/docs").len(), 1);
}

#[test]
fn test_read_racing_index_invalidation_still_resolves() {
    let remote = MemoryRemote::new().with_latency(Duration::from_millis(200));
    remote.seed(remote_file("r-a", "origin", "a", ".txt", "present"));
    let (_, client) = client_over(remote);
    let client = Arc::new(client);

    // Index load takes 0-200ms, the record fetch 200-400ms.
    let reader = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.read_content("/a.txt"))
    };
    thread::sleep(Duration::from_millis(300));
    client.invalidate_index();

    assert_eq!(reader.join().unwrap().unwrap(), "present");
    assert!(client.exists("/a.txt").unwrap());
}
