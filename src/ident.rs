//! Record identifier generation
//!
//! Identifiers are UUID-formatted digests of a fresh random string, a nanosecond
//! timestamp and the acting principal. The random component is drawn per call.

use crate::types::RecordId;
use rand::distr::Alphanumeric;
use rand::Rng;

const RANDOM_LEN: usize = 24;

/// Generator for new record identifiers
#[derive(Debug, Clone, Default)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce a new identifier on behalf of `principal`
    ///
    /// With no known principal the digest covers only the randomness and the timestamp.
    pub fn new_id(&self, principal: Option<&str>) -> RecordId {
        let random: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_LEN)
            .map(char::from)
            .collect();
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| chrono::Utc::now().timestamp_micros().saturating_mul(1000));

        let mut hasher = blake3::Hasher::new();
        hasher.update(random.as_bytes());
        hasher.update(&nanos.to_le_bytes());
        if let Some(principal) = principal {
            hasher.update(principal.as_bytes());
        }
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.as_bytes()[..16]);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_are_uuid_shaped() {
        let id = IdGenerator::new().new_id(Some("alice"));
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn test_ids_without_principal_are_still_unique() {
        let gen = IdGenerator::new();
        let ids: HashSet<RecordId> = (0..1000).map(|_| gen.new_id(None)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_concurrent_generation_never_collides() {
        let gen = Arc::new(IdGenerator::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let gen = gen.clone();
            handles.push(thread::spawn(move || {
                (0..500).map(|_| gen.new_id(Some("bob"))).collect::<Vec<_>>()
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 4000);
    }
}
