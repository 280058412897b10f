//! Client operations layer.
//!
//! Every user-facing operation lives here: it validates, drives the owning
//! component, and recovers any error at its own boundary into a single
//! notification. Nothing in this module is fatal to the process.
//!
//! Access gating: while no session is active, only the account directory and
//! the authentication operations are reachable; partition-scoped reads
//! return empty.

use std::sync::Arc;

use chrono::Utc;

use crate::config::{Config, MAX_NAME_LENGTH, MIN_SECRET_LENGTH, OVERRIDE_KEY};
use crate::errors::AppError;
use crate::models::{
    decode_data_url, time_id, DirectoryEntry, FileAsset, Note, VaultRecord,
};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::quota::{self, QuotaMonitor};
use crate::remote::RemoteStore;
use crate::session::{constant_time_compare, SessionManager, TabStorage};
use crate::store::CollectionStore;
use crate::upload::{RawInput, StageOutcome, UploadPipeline};
use crate::workflow::{Advance, DeleteTarget, DeleteWorkflow, TargetKind};

/// The assembled client core: one instance per tab.
pub struct Client {
    store: CollectionStore,
    session: SessionManager,
    uploads: UploadPipeline,
    deletes: DeleteWorkflow,
    quota: QuotaMonitor,
    notifier: Notifier,
}

impl Client {
    pub fn new(config: Config, remote: Arc<dyn RemoteStore>, tab: Box<dyn TabStorage>) -> Self {
        let notifier = Notifier::new();
        Self {
            store: CollectionStore::new(remote, notifier.clone()),
            session: SessionManager::new(tab),
            uploads: UploadPipeline::new(config.max_upload_bytes),
            deletes: DeleteWorkflow::new(),
            quota: QuotaMonitor::new(config.quota_capacity_bytes),
            notifier,
        }
    }

    // ==================== ACTIVATION & SESSION ====================

    /// Restore a persisted session (if any) and fetch all collections once.
    pub async fn activate(&self) -> Result<(), AppError> {
        let restored = self.session.restore();
        if let Some(id) = &restored {
            tracing::info!("Restored session for {}", id);
        }
        self.store
            .load_all(restored.as_deref())
            .await
            .map_err(|e| self.fail(e))?;

        // A session restored into an already-full partition warns right away.
        if let Some(id) = &restored {
            self.check_quota(&self.store.files_for(id).await);
        }
        Ok(())
    }

    /// Authenticate and reload all collections scoped to the new account.
    pub async fn login(&self, account_id: &str, secret: &str) -> Result<(), AppError> {
        let account = self.store.account(account_id).await;
        if let Err(e) = self.session.authenticate(account.as_ref(), account_id, secret) {
            self.notifier.emit("Auth Failed", NotificationKind::Error);
            return Err(e);
        }

        if let Err(e) = self.store.load_all(Some(account_id)).await {
            // The session stands; collections keep their previous values
            // until the next successful reload.
            return Err(self.fail(e));
        }

        tracing::info!("Authenticated as {}", account_id);
        self.notifier.emit("Access Granted", NotificationKind::Success);
        self.check_quota(&self.store.files_for(account_id).await);
        Ok(())
    }

    /// End the session: clear the persisted id, drop the vault partition and
    /// discard any staged uploads or pending deletions.
    pub async fn logout(&self) {
        if let Some(id) = self.session.active() {
            tracing::info!("Session terminated for {}", id);
        }
        self.session.terminate();
        self.store.clear_vault().await;
        self.deletes.cancel();
        self.uploads.clear();
    }

    pub fn active_account(&self) -> Option<String> {
        self.session.active()
    }

    // ==================== ACCOUNT OPERATIONS ====================

    /// Replace an account's secret using the shared override key. No session
    /// is required; this is the signed-out recovery path.
    pub async fn reset_secret(
        &self,
        account_id: &str,
        override_key: &str,
        new_secret: &str,
        confirm: &str,
    ) -> Result<(), AppError> {
        if !constant_time_compare(override_key, OVERRIDE_KEY) {
            return Err(self.fail(AppError::ResetFailed("Wrong Override Key".to_string())));
        }
        if new_secret != confirm {
            return Err(self.fail(AppError::ResetFailed("Secrets Do Not Match".to_string())));
        }
        if new_secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(self.fail(AppError::Validation("Secret Too Short".to_string())));
        }
        if self.store.account(account_id).await.is_none() {
            return Err(self.fail(AppError::NotFound(format!(
                "Unknown account {}",
                account_id
            ))));
        }

        let secret = new_secret.to_string();
        self.store
            .mutate_accounts(|accounts| {
                if let Some(account) = accounts.get_mut(account_id) {
                    account.secret = secret;
                }
            })
            .await;

        self.notifier.emit("Passkey Reset", NotificationKind::Success);
        Ok(())
    }

    /// Change the active account's secret, verifying the current one first.
    pub async fn change_secret(
        &self,
        current: &str,
        new_secret: &str,
        confirm: &str,
    ) -> Result<(), AppError> {
        let account_id = self.require_session()?;
        let account = self
            .store
            .account(&account_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Unknown account {}", account_id)))?;

        if !constant_time_compare(current, &account.secret) {
            return Err(self.fail(AppError::AuthFailed("Auth Failed".to_string())));
        }
        if new_secret != confirm {
            return Err(self.fail(AppError::Validation("Secrets Do Not Match".to_string())));
        }
        if new_secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(self.fail(AppError::Validation("Secret Too Short".to_string())));
        }

        let secret = new_secret.to_string();
        self.store
            .mutate_accounts(|accounts| {
                if let Some(account) = accounts.get_mut(&account_id) {
                    account.secret = secret;
                }
            })
            .await;

        self.notifier.emit("Passkey Updated", NotificationKind::Success);
        Ok(())
    }

    /// Update the active account's display name and, optionally, avatar.
    pub async fn update_profile(
        &self,
        display_name: &str,
        avatar_ref: Option<&str>,
    ) -> Result<(), AppError> {
        let account_id = self.require_session()?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(self.fail(AppError::Validation("Name Required".to_string())));
        }
        if display_name.chars().count() > MAX_NAME_LENGTH {
            return Err(self.fail(AppError::Validation("Name Too Long".to_string())));
        }

        let name = display_name.to_string();
        let avatar = avatar_ref.map(|a| a.to_string());
        self.store
            .mutate_accounts(|accounts| {
                if let Some(account) = accounts.get_mut(&account_id) {
                    account.display_name = name;
                    if let Some(avatar) = avatar {
                        account.avatar_ref = avatar;
                    }
                }
            })
            .await;

        self.notifier.emit("Profile Updated", NotificationKind::Success);
        Ok(())
    }

    // ==================== READS ====================

    /// The public account directory (reachable without a session).
    pub async fn directory(&self) -> Vec<DirectoryEntry> {
        self.store.directory().await
    }

    /// The active account's file partition; empty without a session.
    pub async fn files(&self) -> Vec<FileAsset> {
        match self.session.active() {
            Some(id) => self.store.files_for(&id).await,
            None => Vec::new(),
        }
    }

    /// The shared note log; empty without a session.
    pub async fn notes(&self) -> Vec<Note> {
        match self.session.active() {
            Some(_) => self.store.notes().await,
            None => Vec::new(),
        }
    }

    /// The active account's vault records; empty without a session.
    pub async fn vault_records(&self) -> Vec<VaultRecord> {
        match self.session.active() {
            Some(id) => self.store.vault_for(&id).await,
            None => Vec::new(),
        }
    }

    // ==================== NOTES ====================

    /// Post a message to the shared log, snapshotting the author's current
    /// display name.
    pub async fn post_note(&self, text: &str) -> Result<(), AppError> {
        let account_id = self.require_session()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.fail(AppError::Validation("Empty Message".to_string())));
        }

        let author_name = self
            .store
            .account(&account_id)
            .await
            .map(|a| a.display_name)
            .unwrap_or_else(|| account_id.clone());

        let note = Note {
            id: time_id(),
            author_account_id: account_id,
            author_name,
            text: text.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.store.mutate_notes(|notes| notes.insert(0, note)).await;

        self.notifier
            .emit("Message Transmitted", NotificationKind::Success);
        Ok(())
    }

    /// Edit one of the active account's own messages.
    pub async fn edit_note(&self, note_id: i64, text: &str) -> Result<(), AppError> {
        let account_id = self.require_session()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.fail(AppError::Validation("Empty Message".to_string())));
        }

        let notes = self.store.notes().await;
        let note = notes
            .iter()
            .find(|n| n.id == note_id)
            .ok_or_else(|| self.fail(AppError::NotFound("Message Not Found".to_string())))?;
        if note.author_account_id != account_id {
            return Err(self.fail(AppError::Validation("Not Your Message".to_string())));
        }

        let new_text = text.to_string();
        self.store
            .mutate_notes(|notes| {
                if let Some(note) = notes.iter_mut().find(|n| n.id == note_id) {
                    note.text = new_text;
                }
            })
            .await;

        self.notifier
            .emit("Message Updated", NotificationKind::Success);
        Ok(())
    }

    // ==================== VAULT ====================

    /// Store a credential in the active account's vault partition.
    pub async fn add_vault_record(
        &self,
        site_label: &str,
        identity: &str,
        secret: &str,
    ) -> Result<(), AppError> {
        let account_id = self.require_session()?;
        if site_label.trim().is_empty() || identity.trim().is_empty() || secret.is_empty() {
            return Err(self.fail(AppError::Validation("All Fields Required".to_string())));
        }

        let record = VaultRecord {
            id: time_id(),
            site_label: site_label.trim().to_string(),
            identity: identity.trim().to_string(),
            secret: secret.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.store.put_vault_record(&account_id, record).await;

        self.notifier
            .emit("Credentials Secured", NotificationKind::Success);
        Ok(())
    }

    /// Delete one vault record via its targeted remote path. Vault deletes
    /// are immediate; the two-step workflow guards files and notes only.
    pub async fn delete_vault_record(&self, record_id: i64) -> Result<(), AppError> {
        let account_id = self.require_session()?;
        if !self.store.remove_vault_record(&account_id, record_id).await {
            return Err(self.fail(AppError::NotFound("Record Not Found".to_string())));
        }

        self.notifier.emit("Record Erased", NotificationKind::Success);
        Ok(())
    }

    // ==================== UPLOADS ====================

    /// Size-check a selection and stage the survivors for metadata editing.
    /// The oversize subset is rejected wholesale; if nothing survives, the
    /// whole submission fails.
    pub async fn stage_uploads(&self, inputs: Vec<RawInput>) -> Result<StageOutcome, AppError> {
        let account_id = self.require_session()?;

        let used = quota::used_bytes(&self.store.files_for(&account_id).await);
        let outcome = self.uploads.stage(inputs, used);
        if !outcome.rejected.is_empty() {
            let largest = outcome
                .rejected
                .iter()
                .map(|r| r.size_bytes)
                .max()
                .unwrap_or(0);
            let err = AppError::SizeLimitExceeded {
                message: format!("{} file(s) exceed the size limit", outcome.rejected.len()),
                size_bytes: largest,
            };
            if outcome.accepted == 0 {
                return Err(self.fail(err));
            }
            // Remainder proceeds; the rejection is still surfaced.
            self.fail(err);
        }
        Ok(outcome)
    }

    /// Edit the alias/note of a staged file before committing.
    pub fn set_staged_meta(&self, index: usize, alias: Option<&str>, note: Option<&str>) -> bool {
        self.uploads.set_meta(index, alias, note)
    }

    /// Discard the staging batch.
    pub fn cancel_staged(&self) {
        self.uploads.clear();
    }

    /// Encode the staged batch and append it to the active partition in one
    /// mutation, one persistence round-trip for the whole batch.
    pub async fn commit_staged(&self) -> Result<usize, AppError> {
        let account_id = self.require_session()?;

        let assets = self.uploads.encode_staged(&account_id);
        if assets.is_empty() {
            return Ok(0);
        }
        let count = assets.len();

        let partition = self
            .store
            .mutate_files(&account_id, |files| files.extend(assets))
            .await;

        self.notifier.emit(
            format!("{} assets encrypted", count),
            NotificationKind::Success,
        );
        // After the success message so a crossing warning stays visible.
        self.check_quota(&partition);
        Ok(count)
    }

    /// Store an external link as a zero-size asset, bypassing encoding.
    pub async fn add_link(&self, label: &str, uri: &str, note: &str) -> Result<(), AppError> {
        let account_id = self.require_session()?;
        if uri.trim().is_empty() {
            return Err(self.fail(AppError::Validation("Link Required".to_string())));
        }

        let asset = self.uploads.make_link(&account_id, label.trim(), uri.trim(), note.trim());
        self.store
            .mutate_files(&account_id, |files| files.push(asset))
            .await;

        self.notifier.emit("Pointer Stored", NotificationKind::Success);
        Ok(())
    }

    /// Decode a stored file asset back into its original bytes.
    pub async fn download_file(&self, file_id: i64) -> Result<Vec<u8>, AppError> {
        let account_id = self.require_session()?;

        let partition = self.store.files_for(&account_id).await;
        let asset = partition
            .iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| self.fail(AppError::NotFound("File Not Found".to_string())))?;
        if asset.is_link() {
            return Err(self.fail(AppError::Validation(
                "Links Have No Stored Content".to_string(),
            )));
        }

        let bytes = decode_data_url(&asset.payload).map_err(|e| self.fail(e))?;
        self.notifier
            .emit("Asset Decrypted", NotificationKind::Success);
        Ok(bytes)
    }

    // ==================== DELETE WORKFLOW ====================

    /// Begin the two-step confirmation for deleting a file or note.
    pub fn request_delete(&self, kind: TargetKind, id: i64) -> bool {
        if self.session.active().is_none() {
            return false;
        }
        self.deletes.request(kind, id)
    }

    /// Advance the pending deletion: first call confirms, second executes.
    pub async fn advance_delete(&self) -> Result<Advance, AppError> {
        match self.deletes.advance() {
            Advance::Execute(target) => {
                self.execute_delete(target).await?;
                Ok(Advance::Execute(target))
            }
            other => Ok(other),
        }
    }

    /// Abandon the pending deletion, whatever its stage.
    pub fn cancel_delete(&self) {
        self.deletes.cancel();
    }

    pub fn pending_delete(&self) -> Option<DeleteTarget> {
        self.deletes.pending()
    }

    async fn execute_delete(&self, target: DeleteTarget) -> Result<(), AppError> {
        let account_id = self.require_session()?;

        match target.kind {
            TargetKind::File => {
                let partition = self.store.files_for(&account_id).await;
                if !partition.iter().any(|f| f.id == target.id) {
                    return Err(self.fail(AppError::NotFound("File Not Found".to_string())));
                }
                let partition = self
                    .store
                    .mutate_files(&account_id, |files| files.retain(|f| f.id != target.id))
                    .await;
                self.check_quota(&partition);
            }
            TargetKind::Note => {
                let notes = self.store.notes().await;
                let note = notes
                    .iter()
                    .find(|n| n.id == target.id)
                    .ok_or_else(|| self.fail(AppError::NotFound("Message Not Found".to_string())))?;
                if note.author_account_id != account_id {
                    return Err(self.fail(AppError::Validation("Not Your Message".to_string())));
                }
                self.store
                    .mutate_notes(|notes| notes.retain(|n| n.id != target.id))
                    .await;
            }
        }

        self.notifier.emit("Erased", NotificationKind::Success);
        Ok(())
    }

    // ==================== STATUS ====================

    /// The currently visible notification, if any.
    pub fn current_notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    /// True while any optimistic mutation has not yet reached the remote
    /// store (successfully or not).
    pub fn sync_pending(&self) -> bool {
        self.store.sync_pending()
    }

    /// Test and shutdown aid: wait for all in-flight write-throughs.
    pub async fn settle(&self) {
        self.store.settle().await;
    }

    // ==================== HELPERS ====================

    fn require_session(&self) -> Result<String, AppError> {
        match self.session.active() {
            Some(id) => Ok(id),
            None => Err(self.fail(AppError::AuthFailed("Access Denied".to_string()))),
        }
    }

    /// Surface an error as a notification and hand it back to the caller.
    fn fail(&self, err: AppError) -> AppError {
        tracing::debug!("Operation failed: {}", err);
        self.notifier.emit(err.message(), NotificationKind::Error);
        err
    }

    fn check_quota(&self, partition: &[FileAsset]) {
        if self.quota.observe(quota::used_bytes(partition)) {
            self.notifier
                .emit("Storage Almost Full", NotificationKind::Error);
        }
    }
}
