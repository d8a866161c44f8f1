//! On-disk format for the learned history (KTUH files).
//!
//! Layout: 4-byte magic, 1-byte version, 4-byte CRC32 of the body
//! (little-endian), then a bincode-encoded record list. Saves go through
//! a temp file and rename so a crash never leaves a torn file.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::entry::{Entry, EntryType};

const MAGIC: &[u8; 4] = b"KTUH";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 9;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid header (too short)")]
    InvalidHeader,
    #[error("invalid magic bytes (expected KTUH)")]
    InvalidMagic,
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One entry as stored. Keys and values are raw bytes so a single
/// corrupted record can be dropped without losing the file.
#[derive(Serialize, Deserialize)]
struct EntryRecord {
    key: Vec<u8>,
    value: Vec<u8>,
    description: Vec<u8>,
    entry_type: EntryType,
    last_access_time: u64,
    suggestion_freq: u32,
    conversion_freq: u32,
    bigram_boost: bool,
    next_entries: Vec<u32>,
    removed: bool,
}

#[derive(Serialize, Deserialize, Default)]
struct HistoryData {
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Default)]
pub struct UserHistoryStorage {
    pub entries: Vec<Entry>,
}

impl UserHistoryStorage {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let data = HistoryData {
            entries: self
                .entries
                .iter()
                .map(|e| EntryRecord {
                    key: e.key.clone().into_bytes(),
                    value: e.value.clone().into_bytes(),
                    description: e.description.clone().into_bytes(),
                    entry_type: e.entry_type,
                    last_access_time: e.last_access_time,
                    suggestion_freq: e.suggestion_freq,
                    conversion_freq: e.conversion_freq,
                    bigram_boost: e.bigram_boost,
                    next_entries: e.next_entries.clone(),
                    removed: e.removed,
                })
                .collect(),
        };
        let body =
            bincode::serialize(&data).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < HEADER_LEN {
            return Err(StorageError::InvalidHeader);
        }
        if &bytes[0..4] != MAGIC {
            return Err(StorageError::InvalidMagic);
        }
        if bytes[4] != VERSION {
            return Err(StorageError::UnsupportedVersion(bytes[4]));
        }
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&bytes[5..9]);
        let body = &bytes[HEADER_LEN..];
        if crc32fast::hash(body) != u32::from_le_bytes(crc_bytes) {
            return Err(StorageError::ChecksumMismatch);
        }
        let data: HistoryData = bincode::deserialize(body)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut entries = Vec::with_capacity(data.entries.len());
        for record in data.entries {
            let (Ok(key), Ok(value), Ok(description)) = (
                String::from_utf8(record.key),
                String::from_utf8(record.value),
                String::from_utf8(record.description),
            ) else {
                warn!("dropping history record with invalid UTF-8");
                continue;
            };
            entries.push(Entry {
                key,
                value,
                description,
                entry_type: record.entry_type,
                last_access_time: record.last_access_time,
                suggestion_freq: record.suggestion_freq,
                conversion_freq: record.conversion_freq,
                bigram_boost: record.bigram_boost,
                next_entries: record.next_entries,
                removed: record.removed,
            });
        }
        Ok(Self { entries })
    }

    /// Atomic write: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load from file; a missing file is an empty history.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<Entry> {
        vec![
            Entry {
                key: "わたしの".to_string(),
                value: "私の".to_string(),
                last_access_time: 1000,
                suggestion_freq: 2,
                next_entries: vec![42],
                ..Entry::default()
            },
            Entry {
                key: "なまえは".to_string(),
                value: "名前は".to_string(),
                last_access_time: 1001,
                conversion_freq: 1,
                bigram_boost: true,
                ..Entry::default()
            },
        ]
    }

    #[test]
    fn bytes_round_trip() {
        let storage = UserHistoryStorage::new(sample_entries());
        let bytes = storage.to_bytes().unwrap();
        let loaded = UserHistoryStorage::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[0].key, "わたしの");
        assert_eq!(loaded.entries[0].next_entries, vec![42]);
        assert!(loaded.entries[1].bigram_boost);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.ktuh");
        let storage = UserHistoryStorage::new(sample_entries());
        storage.save(&path).unwrap();

        let loaded = UserHistoryStorage::open(&path).unwrap();
        assert_eq!(loaded.entries.len(), 2);
        // No stray temp file left behind.
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UserHistoryStorage::open(&dir.path().join("none.ktuh")).unwrap();
        assert!(storage.entries.is_empty());
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let storage = UserHistoryStorage::new(sample_entries());
        let mut bytes = storage.to_bytes().unwrap();

        let mut wrong = bytes.clone();
        wrong[0] = b'X';
        assert!(matches!(
            UserHistoryStorage::from_bytes(&wrong),
            Err(StorageError::InvalidMagic)
        ));

        bytes[4] = 99;
        assert!(matches!(
            UserHistoryStorage::from_bytes(&bytes),
            Err(StorageError::UnsupportedVersion(99))
        ));

        assert!(matches!(
            UserHistoryStorage::from_bytes(b"KT"),
            Err(StorageError::InvalidHeader)
        ));
    }

    #[test]
    fn detects_corrupted_body() {
        let storage = UserHistoryStorage::new(sample_entries());
        let mut bytes = storage.to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            UserHistoryStorage::from_bytes(&bytes),
            Err(StorageError::ChecksumMismatch)
        ));
    }
}
