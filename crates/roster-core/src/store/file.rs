// # File Member Store
//
// File-based implementation of MemberStore with crash recovery.
//
// ## Purpose
//
// Keeps the member table across restarts so `/users` has data to show
// while the startup reconciliation is still retrying.
//
// ## Transactions
//
// Every write is applied to a copy of the table, the copy is persisted, and
// only then does it replace the in-memory table. A failed persist leaves
// both the file and memory untouched, which is what makes bulk upserts
// all-or-nothing.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of the previous generation
// - Recovery: Falls back to backup if the main file fails to parse
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "members": {
//     "U1": {
//       "id": "U1",
//       "name": "ada",
//       "real_name": "Ada Lovelace",
//       "deleted": false,
//       "timezone": "Europe/London",
//       "status_text": "",
//       "status_emoji": "",
//       "avatar_url": "https://img/ada.png"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::member::Member;
use crate::traits::MemberStore;

/// Member file format version
/// Used for future migration if format changes
const STORE_FILE_VERSION: &str = "1.0";

type MemberTable = BTreeMap<String, Member>;

/// File-based member store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use roster_core::store::FileMemberStore;
/// use roster_core::{Member, MemberStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileMemberStore::open("/var/lib/roster/members.json").await?;
///
///     // Atomically written to disk before returning
///     store.upsert_member(&Member::new("U1")).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileMemberStore {
    path: PathBuf,
    members: Arc<RwLock<MemberTable>>,
}

/// Serializable member file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    saved_at: DateTime<Utc>,
    members: MemberTable,
}

impl FileMemberStore {
    /// Create or load a file member store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing member file
    /// 3. If it fails to parse, try to load from backup
    /// 4. If both fail, start with an empty table
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let members = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            members: Arc::new(RwLock::new(members)),
        })
    }

    /// Path of the member file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the member table with automatic recovery
    ///
    /// Only parse failures trigger recovery; a read failure (permissions,
    /// I/O) is returned as-is.
    async fn load_with_recovery(path: &Path) -> Result<MemberTable, Error> {
        match Self::load(path).await {
            Ok(members) => {
                tracing::debug!("Loaded member file: {} members", members.len());
                Ok(members)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Member file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty member table.");
                    return Ok(MemberTable::new());
                }

                match Self::load(&backup_path).await {
                    Ok(members) => {
                        tracing::info!("Recovered member file from backup: {} members", members.len());

                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore member file from backup: {}",
                                restore_err
                            );
                        }

                        Ok(members)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty member table.",
                            backup_err
                        );
                        Ok(MemberTable::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load the member table from one file
    async fn load(path: &Path) -> Result<MemberTable, Error> {
        if !path.exists() {
            tracing::debug!("Member file does not exist: {}", path.display());
            return Ok(MemberTable::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!(
                "Failed to read member file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: StoreFileFormat = serde_json::from_str(&content)?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Member file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.members)
    }

    /// Write a member table atomically
    async fn persist(&self, members: &MemberTable) -> Result<(), Error> {
        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            saved_at: Utc::now(),
            members: members.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize members: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut handle = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Member file written: {}", self.path.display());
        Ok(())
    }

    /// Apply a batch to a copy, persist it, then swap it in
    ///
    /// The write lock is held across the persist so concurrent writers
    /// cannot interleave generations.
    async fn commit(&self, batch: &[Member]) -> Result<(), Error> {
        for member in batch {
            member.validate()?;
        }

        let mut guard = self.members.write().await;
        let mut next = guard.clone();
        for member in batch {
            next.insert(member.id.clone(), member.clone());
        }

        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl MemberStore for FileMemberStore {
    async fn upsert_members(&self, members: &[Member]) -> Result<(), Error> {
        self.commit(members).await
    }

    async fn upsert_member(&self, member: &Member) -> Result<(), Error> {
        self.commit(std::slice::from_ref(member)).await
    }

    async fn list_all(&self) -> Result<Vec<Member>, Error> {
        let guard = self.members.read().await;
        Ok(guard.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn member(id: &str, status: &str) -> Member {
        Member {
            status_text: status.to_string(),
            ..Member::new(id)
        }
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");

        let store = FileMemberStore::open(&path).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());

        store.upsert_member(&member("U1", "lunch")).await.unwrap();
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileMemberStore::open(&path).await.unwrap();
        assert_eq!(store2.list_all().await.unwrap(), vec![member("U1", "lunch")]);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("members.json");

        let store = FileMemberStore::open(&path).await.unwrap();
        store.upsert_member(&member("U1", "")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");

        let store = FileMemberStore::open(&path).await.unwrap();
        store.upsert_member(&member("U1", "first")).await.unwrap();

        // Write again to ensure backup is created
        store.upsert_member(&member("U1", "second")).await.unwrap();

        let backup_path = FileMemberStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileMemberStore::open(&path).await.unwrap();
        // The backup holds the generation before the last write
        assert_eq!(store2.list_all().await.unwrap(), vec![member("U1", "first")]);
    }

    #[tokio::test]
    async fn test_file_store_corruption_without_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");
        fs::write(&path, b"{not json").await.unwrap();

        let store = FileMemberStore::open(&path).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_failed_persist_leaves_state_unchanged() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let path = data_dir.join("members.json");

        let store = FileMemberStore::open(&path).await.unwrap();
        store.upsert_member(&member("U1", "kept")).await.unwrap();

        // Pull the directory out from under the store so the temp file
        // cannot be created
        fs::remove_dir_all(&data_dir).await.unwrap();

        let result = store
            .upsert_members(&[member("U1", "lost"), member("U2", "lost")])
            .await;
        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(store.list_all().await.unwrap(), vec![member("U1", "kept")]);
    }

    #[tokio::test]
    async fn test_file_store_rejects_empty_id_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");

        let store = FileMemberStore::open(&path).await.unwrap();
        let result = store
            .upsert_members(&[member("U1", ""), member("", "")])
            .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_store_sequential_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");

        let store = FileMemberStore::open(&path).await.unwrap();
        for i in 0..10 {
            store
                .upsert_member(&member("U1", &format!("status {}", i)))
                .await
                .unwrap();
        }

        let store2 = FileMemberStore::open(&path).await.unwrap();
        assert_eq!(
            store2.list_all().await.unwrap(),
            vec![member("U1", "status 9")]
        );
    }
}
