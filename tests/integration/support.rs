use std::sync::Arc;
use uuidfs::remote::memory::MemoryRemote;
use uuidfs::{OverlayClient, PathNormalizer, Record};

pub fn client_over(remote: MemoryRemote) -> (Arc<MemoryRemote>, OverlayClient) {
    let remote = Arc::new(remote);
    let client = OverlayClient::new(remote.clone(), PathNormalizer::default());
    (remote, client)
}

pub fn empty_client() -> (Arc<MemoryRemote>, OverlayClient) {
    client_over(MemoryRemote::new())
}

/// Remote file record at `origin/<dir>/<name><ext>`
pub fn remote_file(id: &str, location: &str, name: &str, ext: &str, content: &str) -> Record {
    Record::file(
        id.to_string(),
        location.to_string(),
        name.to_string(),
        ext.to_string(),
        content,
        1_700_000_000_000,
    )
}

pub fn remote_folder(id: &str, location: &str, name: &str) -> Record {
    Record::folder(
        id.to_string(),
        location.to_string(),
        name.to_string(),
        1_700_000_000_000,
    )
}
