//! Collection store: the in-memory working copies of the four collections
//! and their write-through to the remote document store.
//!
//! Every mutation is applied to the local copy synchronously and persisted by
//! overwriting the entire owning collection (or partition) remotely. The
//! local replacement happens before the remote acknowledgment returns; on
//! remote failure the local value is NOT rolled back: an error notification
//! is emitted and the optimistic state stays visible. Concurrent writers to
//! the same path are not reconciled: the later write wins wholesale.
//!
//! The store is the sole writer of each collection slice; callers never touch
//! the collections directly.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{self, Account, DirectoryEntry, FileAsset, Note, VaultRecord};
use crate::notify::{NotificationKind, Notifier};
use crate::remote::{paths, RemoteStore};

/// Working copies of the four collections.
struct Collections {
    accounts: BTreeMap<String, Account>,
    files: HashMap<String, Vec<FileAsset>>,
    notes: Vec<Note>,
    /// Which account's vault partition is currently loaded
    vault_owner: Option<String>,
    vault: BTreeMap<i64, VaultRecord>,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            // The directory falls back to the built-in seed accounts until a
            // remote load replaces it.
            accounts: models::seed_accounts(),
            files: HashMap::new(),
            notes: Vec::new(),
            vault_owner: None,
            vault: BTreeMap::new(),
        }
    }
}

/// Owner of all collection state and the only component that talks to the
/// remote store after activation.
pub struct CollectionStore {
    remote: Arc<dyn RemoteStore>,
    notifier: Notifier,
    state: RwLock<Collections>,
    pending_writes: Arc<AtomicUsize>,
}

impl CollectionStore {
    pub fn new(remote: Arc<dyn RemoteStore>, notifier: Notifier) -> Self {
        Self {
            remote,
            notifier,
            state: RwLock::new(Collections::default()),
            pending_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    // ==================== ACTIVATION ====================

    /// Fetch all collections once, at activation or after authentication.
    ///
    /// An absent remote path leaves the local default in place (notably the
    /// seed account directory). Files and vault are loaded only for the
    /// active account's partitions.
    pub async fn load_all(&self, active_account: Option<&str>) -> Result<(), AppError> {
        let accounts: Option<BTreeMap<String, Account>> = self.load(paths::ACCOUNTS).await?;
        let notes: Option<Vec<Note>> = self.load(paths::NOTES).await?;

        let mut files: Option<Vec<FileAsset>> = None;
        let mut vault: Option<BTreeMap<i64, VaultRecord>> = None;
        if let Some(id) = active_account {
            files = self.load(&paths::files(id)).await?;
            vault = self.load(&paths::vault(id)).await?;
        }

        let mut state = self.state.write().await;
        if let Some(accounts) = accounts {
            state.accounts = accounts;
        }
        if let Some(mut notes) = notes {
            models::sort_newest_first(&mut notes);
            state.notes = notes;
        }
        if let Some(id) = active_account {
            state.files.insert(id.to_string(), files.unwrap_or_default());
            state.vault_owner = Some(id.to_string());
            state.vault = vault.unwrap_or_default();
        }
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, AppError> {
        match self.remote.read(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    // ==================== READ ACCESSORS ====================

    /// The public account directory (no secrets).
    pub async fn directory(&self) -> Vec<DirectoryEntry> {
        let state = self.state.read().await;
        state
            .accounts
            .iter()
            .map(|(id, account)| DirectoryEntry::new(id, account))
            .collect()
    }

    pub async fn account(&self, account_id: &str) -> Option<Account> {
        self.state.read().await.accounts.get(account_id).cloned()
    }

    /// One account's file partition (empty if never loaded or never written).
    pub async fn files_for(&self, account_id: &str) -> Vec<FileAsset> {
        self.state
            .read()
            .await
            .files
            .get(account_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The shared note list, newest first.
    pub async fn notes(&self) -> Vec<Note> {
        self.state.read().await.notes.clone()
    }

    /// One account's vault records. Only the loaded partition's owner gets
    /// anything back; every other account id reads empty.
    pub async fn vault_for(&self, account_id: &str) -> Vec<VaultRecord> {
        let state = self.state.read().await;
        if state.vault_owner.as_deref() != Some(account_id) {
            return Vec::new();
        }
        state.vault.values().cloned().collect()
    }

    /// Drop the loaded vault partition (on session termination).
    pub async fn clear_vault(&self) {
        let mut state = self.state.write().await;
        state.vault_owner = None;
        state.vault.clear();
    }

    // ==================== MUTATIONS ====================

    /// Mutate the account map and write it through wholesale.
    pub async fn mutate_accounts<F>(&self, updater: F) -> BTreeMap<String, Account>
    where
        F: FnOnce(&mut BTreeMap<String, Account>),
    {
        let snapshot = {
            let mut state = self.state.write().await;
            updater(&mut state.accounts);
            state.accounts.clone()
        };
        self.persist(paths::ACCOUNTS.to_string(), &snapshot);
        snapshot
    }

    /// Mutate one account's file partition and write it through wholesale.
    /// Returns the new partition for quota recomputation.
    pub async fn mutate_files<F>(&self, account_id: &str, updater: F) -> Vec<FileAsset>
    where
        F: FnOnce(&mut Vec<FileAsset>),
    {
        let snapshot = {
            let mut state = self.state.write().await;
            let partition = state.files.entry(account_id.to_string()).or_default();
            updater(partition);
            partition.clone()
        };
        self.persist(paths::files(account_id), &snapshot);
        snapshot
    }

    /// Mutate the shared note list and write it through wholesale. The
    /// newest-first order is re-established after the updater runs.
    pub async fn mutate_notes<F>(&self, updater: F) -> Vec<Note>
    where
        F: FnOnce(&mut Vec<Note>),
    {
        let snapshot = {
            let mut state = self.state.write().await;
            updater(&mut state.notes);
            models::sort_newest_first(&mut state.notes);
            state.notes.clone()
        };
        self.persist(paths::NOTES.to_string(), &snapshot);
        snapshot
    }

    /// Insert one vault record, persisted at its targeted record path so the
    /// rest of the partition is never rewritten.
    pub async fn put_vault_record(&self, account_id: &str, record: VaultRecord) {
        {
            let mut state = self.state.write().await;
            if state.vault_owner.as_deref() != Some(account_id) {
                state.vault_owner = Some(account_id.to_string());
                state.vault.clear();
            }
            state.vault.insert(record.id, record.clone());
        }
        self.persist(paths::vault_record(account_id, record.id), &record);
    }

    /// Remove one vault record via its targeted record path. Returns whether
    /// the record existed locally.
    pub async fn remove_vault_record(&self, account_id: &str, record_id: i64) -> bool {
        let existed = {
            let mut state = self.state.write().await;
            if state.vault_owner.as_deref() != Some(account_id) {
                return false;
            }
            state.vault.remove(&record_id).is_some()
        };
        if existed {
            self.spawn_remove(paths::vault_record(account_id, record_id));
        }
        existed
    }

    // ==================== WRITE-THROUGH ====================

    /// True while any write-through is still in flight: the local state is
    /// ahead of (or divergent from) the remote copy.
    pub fn sync_pending(&self) -> bool {
        self.pending_writes.load(Ordering::SeqCst) > 0
    }

    /// Wait until no write-through is in flight. A test and shutdown aid;
    /// the engine itself never blocks on persistence.
    pub async fn settle(&self) {
        while self.sync_pending() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn persist<T: Serialize>(&self, path: String, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.spawn_write(path, value),
            Err(e) => {
                tracing::error!("Failed to serialize value for {}: {}", path, e);
                self.notifier.emit("Sync Failed", NotificationKind::Error);
            }
        }
    }

    fn spawn_write(&self, path: String, value: Value) {
        let remote = Arc::clone(&self.remote);
        let notifier = self.notifier.clone();
        let pending = Arc::clone(&self.pending_writes);

        pending.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let result = remote.write(&path, &value).await;
            pending.fetch_sub(1, Ordering::SeqCst);
            if let Err(e) = result {
                // No rollback: the optimistic local state stays visible.
                tracing::error!("Write-through to {} failed: {}", path, e);
                notifier.emit("Sync Failed", NotificationKind::Error);
            }
        });
    }

    fn spawn_remove(&self, path: String) {
        let remote = Arc::clone(&self.remote);
        let notifier = self.notifier.clone();
        let pending = Arc::clone(&self.pending_writes);

        pending.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let result = remote.remove(&path).await;
            pending.fetch_sub(1, Ordering::SeqCst);
            if let Err(e) = result {
                tracing::error!("Remote delete of {} failed: {}", path, e);
                notifier.emit("Sync Failed", NotificationKind::Error);
            }
        });
    }
}
