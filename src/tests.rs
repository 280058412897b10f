//! Integration tests for the TicShare client core.
//!
//! Every test drives the engine through the in-memory remote store adapter;
//! nothing here touches the network.

use std::sync::Arc;

use crate::client::Client;
use crate::config::Config;
use crate::errors::codes;
use crate::notify::NotificationKind;
use crate::remote::{paths, MemoryRemoteStore};
use crate::session::{MemoryTabStorage, TabStorage};
use crate::upload::RawInput;
use crate::workflow::{Advance, TargetKind};

/// Tab storage shared between client instances, standing in for a reload of
/// the same tab.
struct SharedTab(Arc<MemoryTabStorage>);

impl TabStorage for SharedTab {
    fn load(&self) -> Option<String> {
        self.0.load()
    }

    fn save(&self, account_id: &str) {
        self.0.save(account_id)
    }

    fn clear(&self) {
        self.0.clear()
    }
}

/// Test fixture wiring a client against an inspectable in-memory remote.
struct TestFixture {
    client: Client,
    remote: Arc<MemoryRemoteStore>,
    tab: Arc<MemoryTabStorage>,
}

fn test_config() -> Config {
    Config {
        remote_base_url: "http://unused.invalid".to_string(),
        max_upload_bytes: 10_000,
        quota_capacity_bytes: 1_000,
        log_level: "warn".to_string(),
    }
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    async fn with_config(config: Config) -> Self {
        let remote = Arc::new(MemoryRemoteStore::new());
        let tab = Arc::new(MemoryTabStorage::new());
        let client = Client::new(
            config,
            remote.clone() as Arc<dyn crate::remote::RemoteStore>,
            Box::new(SharedTab(tab.clone())),
        );
        client.activate().await.expect("activation failed");
        TestFixture {
            client,
            remote,
            tab,
        }
    }

    /// A second client over the same remote and tab storage, as a reload.
    async fn reload(&self) -> Client {
        let client = Client::new(
            test_config(),
            self.remote.clone() as Arc<dyn crate::remote::RemoteStore>,
            Box::new(SharedTab(self.tab.clone())),
        );
        client.activate().await.expect("activation failed");
        client
    }

    async fn login_user1(&self) {
        self.client.login("user1", "zairo123").await.unwrap();
    }

    fn raw(name: &str, bytes: &[u8]) -> RawInput {
        RawInput {
            file_name: name.to_string(),
            mime_type: "application/octet-stream".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    /// Stage and commit a single file, returning its asset id. Ids are
    /// minted from the millisecond clock, so back-to-back commits are spaced
    /// apart to keep them distinct.
    async fn upload(&self, name: &str, bytes: &[u8]) -> i64 {
        tokio::time::sleep(tokio::time::Duration::from_millis(3)).await;
        self.client
            .stage_uploads(vec![Self::raw(name, bytes)])
            .await
            .unwrap();
        self.client.commit_staged().await.unwrap();
        self.client.settle().await;
        self.client
            .files()
            .await
            .iter()
            .find(|f| f.display_name == name)
            .expect("uploaded file missing")
            .id
    }
}

// ==================== SESSION ====================

#[tokio::test]
async fn test_authenticate_succeeds_iff_secret_matches() {
    let fixture = TestFixture::new().await;

    let err = fixture.client.login("user1", "wrong").await.unwrap_err();
    assert_eq!(err.error_code(), codes::AUTH_FAILED);
    assert!(fixture.client.active_account().is_none());
    assert_eq!(
        fixture.client.current_notification().unwrap().message,
        "Auth Failed"
    );

    fixture.client.login("user1", "zairo123").await.unwrap();
    assert_eq!(fixture.client.active_account().as_deref(), Some("user1"));
    let current = fixture.client.current_notification().unwrap();
    assert_eq!(current.message, "Access Granted");
    assert_eq!(current.kind, NotificationKind::Success);
}

#[tokio::test]
async fn test_unknown_account_fails_authentication() {
    let fixture = TestFixture::new().await;
    let err = fixture.client.login("nobody", "whatever").await.unwrap_err();
    assert_eq!(err.error_code(), codes::AUTH_FAILED);
}

#[tokio::test]
async fn test_reload_restores_session_without_secret() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    let reloaded = fixture.reload().await;
    assert_eq!(reloaded.active_account().as_deref(), Some("user1"));
}

#[tokio::test]
async fn test_logout_gates_partition_reads() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    fixture
        .client
        .add_vault_record("example.com", "zairo", "hunter2")
        .await
        .unwrap();
    fixture.upload("doc.bin", b"payload").await;
    assert_eq!(fixture.client.vault_records().await.len(), 1);
    assert_eq!(fixture.client.files().await.len(), 1);

    fixture.client.logout().await;
    assert!(fixture.client.active_account().is_none());
    assert!(fixture.client.vault_records().await.is_empty());
    assert!(fixture.client.files().await.is_empty());

    // The persisted id is gone too: a reload does not resurrect the session.
    let reloaded = fixture.reload().await;
    assert!(reloaded.active_account().is_none());
}

#[tokio::test]
async fn test_directory_reachable_without_session() {
    let fixture = TestFixture::new().await;
    let directory = fixture.client.directory().await;
    assert_eq!(directory.len(), 2);
    assert!(fixture.client.notes().await.is_empty());
}

// ==================== SECRETS ====================

#[tokio::test]
async fn test_reset_secret_with_override_key() {
    let fixture = TestFixture::new().await;

    let err = fixture
        .client
        .reset_secret("user1", "0000", "newpass", "newpass")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::RESET_FAILED);

    let err = fixture
        .client
        .reset_secret("user1", "1233", "newpass", "different")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::RESET_FAILED);

    let err = fixture
        .client
        .reset_secret("user1", "1233", "ab", "ab")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);

    fixture
        .client
        .reset_secret("user1", "1233", "newpass", "newpass")
        .await
        .unwrap();
    fixture.client.settle().await;

    // Old secret no longer authenticates; the new one does.
    assert!(fixture.client.login("user1", "zairo123").await.is_err());
    fixture.client.login("user1", "newpass").await.unwrap();

    // The whole accounts collection was persisted.
    let persisted = fixture.remote.persisted(paths::ACCOUNTS).await.unwrap();
    assert_eq!(persisted["user1"]["secret"], "newpass");
}

#[tokio::test]
async fn test_change_secret_verifies_current() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    let err = fixture
        .client
        .change_secret("wrong", "fresh-secret", "fresh-secret")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::AUTH_FAILED);

    let err = fixture
        .client
        .change_secret("zairo123", "fresh-secret", "other")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);

    fixture
        .client
        .change_secret("zairo123", "fresh-secret", "fresh-secret")
        .await
        .unwrap();

    fixture.client.logout().await;
    fixture.client.login("user1", "fresh-secret").await.unwrap();
}

#[tokio::test]
async fn test_profile_name_length_cap() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    let too_long = "x".repeat(21);
    let err = fixture
        .client
        .update_profile(&too_long, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);

    let exactly = "y".repeat(20);
    fixture.client.update_profile(&exactly, None).await.unwrap();
    let directory = fixture.client.directory().await;
    let entry = directory.iter().find(|e| e.id == "user1").unwrap();
    assert_eq!(entry.display_name, exactly);
}

// ==================== UPLOADS & FILES ====================

#[tokio::test]
async fn test_upload_download_round_trip() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    let bytes: Vec<u8> = (0u16..256).map(|b| b as u8).collect();
    let id = fixture.upload("blob.bin", &bytes).await;

    let downloaded = fixture.client.download_file(id).await.unwrap();
    assert_eq!(downloaded, bytes);

    // And the partition reached the remote store.
    let persisted = fixture.remote.persisted(&paths::files("user1")).await;
    assert!(persisted.is_some());
}

#[tokio::test]
async fn test_second_upload_over_ceiling_rejected() {
    // 400 + 150 against a 500-byte ceiling: the second upload must not fit.
    let mut config = test_config();
    config.max_upload_bytes = 500;
    config.quota_capacity_bytes = 1_000_000;
    let fixture = TestFixture::with_config(config).await;
    fixture.login_user1().await;

    fixture.upload("first.bin", &vec![0u8; 400]).await;

    let err = fixture
        .client
        .stage_uploads(vec![TestFixture::raw("second.bin", &vec![0u8; 150])])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::SIZE_LIMIT_EXCEEDED);

    let files = fixture.client.files().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].display_name, "first.bin");
}

#[tokio::test]
async fn test_uncommitted_staged_bytes_hold_the_ceiling() {
    let mut config = test_config();
    config.max_upload_bytes = 500;
    config.quota_capacity_bytes = 1_000_000;
    let fixture = TestFixture::with_config(config).await;
    fixture.login_user1().await;

    // Two stage calls before a single commit must not overshoot the ceiling.
    fixture
        .client
        .stage_uploads(vec![TestFixture::raw("first.bin", &vec![0u8; 400])])
        .await
        .unwrap();
    let err = fixture
        .client
        .stage_uploads(vec![TestFixture::raw("second.bin", &vec![0u8; 150])])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::SIZE_LIMIT_EXCEEDED);

    fixture.client.commit_staged().await.unwrap();
    fixture.client.settle().await;

    let files = fixture.client.files().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files.iter().map(|f| f.size_bytes).sum::<u64>(), 400);
}

#[tokio::test]
async fn test_batch_commits_in_one_mutation() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    fixture
        .client
        .stage_uploads(vec![
            TestFixture::raw("a.bin", b"aaa"),
            TestFixture::raw("b.bin", b"bbbb"),
        ])
        .await
        .unwrap();
    assert!(fixture.client.set_staged_meta(0, Some("alias.bin"), Some("keep")));

    let count = fixture.client.commit_staged().await.unwrap();
    assert_eq!(count, 2);
    fixture.client.settle().await;

    let files = fixture.client.files().await;
    assert_eq!(files.len(), 2);
    let aliased = files.iter().find(|f| f.display_name == "alias.bin").unwrap();
    assert_eq!(aliased.note.as_deref(), Some("keep"));
    assert_eq!(
        fixture.client.current_notification().unwrap().message,
        "2 assets encrypted"
    );
}

#[tokio::test]
async fn test_cancelled_batch_commits_nothing() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    fixture
        .client
        .stage_uploads(vec![TestFixture::raw("discarded.bin", b"bytes")])
        .await
        .unwrap();
    fixture.client.cancel_staged();

    assert_eq!(fixture.client.commit_staged().await.unwrap(), 0);
    assert!(fixture.client.files().await.is_empty());
}

#[tokio::test]
async fn test_link_asset_is_zero_size_and_normalized() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    fixture
        .client
        .add_link("Docs", "example.com/docs", "reference")
        .await
        .unwrap();
    fixture.client.settle().await;

    let files = fixture.client.files().await;
    assert_eq!(files.len(), 1);
    let link = &files[0];
    assert!(link.is_link());
    assert_eq!(link.size_bytes, 0);
    assert_eq!(link.payload, "https://example.com/docs");

    let err = fixture.client.download_file(link.id).await.unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);
}

// ==================== DELETE WORKFLOW ====================

#[tokio::test]
async fn test_file_delete_requires_two_confirmations() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    let id = fixture.upload("doomed.bin", b"bytes").await;

    assert!(fixture.client.request_delete(TargetKind::File, id));
    assert_eq!(
        fixture.client.advance_delete().await.unwrap(),
        Advance::NowConfirmed
    );
    // Still present after the first confirmation.
    assert_eq!(fixture.client.files().await.len(), 1);

    match fixture.client.advance_delete().await.unwrap() {
        Advance::Execute(target) => assert_eq!(target.id, id),
        other => panic!("expected execution, got {:?}", other),
    }
    fixture.client.settle().await;

    assert!(fixture.client.files().await.is_empty());
    let persisted = fixture.remote.persisted(&paths::files("user1")).await.unwrap();
    assert_eq!(persisted.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_cancel_leaves_partition_unchanged() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    let id = fixture.upload("kept.bin", b"bytes").await;

    fixture.client.request_delete(TargetKind::File, id);
    fixture.client.advance_delete().await.unwrap();
    assert_eq!(fixture.client.pending_delete().map(|t| t.id), Some(id));
    fixture.client.cancel_delete();

    assert!(fixture.client.pending_delete().is_none());
    assert_eq!(fixture.client.advance_delete().await.unwrap(), Advance::Ignored);
    assert_eq!(fixture.client.files().await.len(), 1);
}

#[tokio::test]
async fn test_delete_without_session_denied() {
    let fixture = TestFixture::new().await;
    assert!(!fixture.client.request_delete(TargetKind::File, 1));
}

// ==================== NOTES ====================

#[tokio::test]
async fn test_notes_shared_and_newest_first() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    fixture.client.post_note("first from zairo").await.unwrap();
    fixture.client.settle().await;
    fixture.client.logout().await;

    fixture.client.login("user2", "stan123").await.unwrap();
    let notes = fixture.client.notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].author_name, "Zairo");

    fixture.client.post_note("reply from stan").await.unwrap();
    let notes = fixture.client.notes().await;
    assert_eq!(notes[0].text, "reply from stan");
    assert_eq!(notes[1].text, "first from zairo");
}

#[tokio::test]
async fn test_note_edit_and_delete_author_only() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    fixture.client.post_note("original text").await.unwrap();
    fixture.client.settle().await;
    let note_id = fixture.client.notes().await[0].id;
    fixture.client.logout().await;

    fixture.client.login("user2", "stan123").await.unwrap();

    let err = fixture
        .client
        .edit_note(note_id, "defaced")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);

    fixture.client.request_delete(TargetKind::Note, note_id);
    fixture.client.advance_delete().await.unwrap();
    let err = fixture.client.advance_delete().await.unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);
    assert_eq!(fixture.client.notes().await.len(), 1);

    // The author can do both.
    fixture.client.logout().await;
    fixture.login_user1().await;
    fixture.client.edit_note(note_id, "amended").await.unwrap();
    assert_eq!(fixture.client.notes().await[0].text, "amended");

    fixture.client.request_delete(TargetKind::Note, note_id);
    fixture.client.advance_delete().await.unwrap();
    fixture.client.advance_delete().await.unwrap();
    fixture.client.settle().await;
    assert!(fixture.client.notes().await.is_empty());
}

// ==================== VAULT ====================

#[tokio::test]
async fn test_vault_unreachable_after_account_switch() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    fixture
        .client
        .add_vault_record("roblox", "zairo", "secret1")
        .await
        .unwrap();
    fixture.client.settle().await;
    let record_id = fixture.client.vault_records().await[0].id;

    // Persisted at its targeted record path.
    let persisted = fixture
        .remote
        .persisted(&paths::vault_record("user1", record_id))
        .await
        .unwrap();
    assert_eq!(persisted["siteLabel"], "roblox");

    fixture.client.logout().await;
    fixture.client.login("user2", "stan123").await.unwrap();
    assert!(fixture.client.vault_records().await.is_empty());

    // Switching back reloads the partition from the remote store.
    fixture.client.logout().await;
    fixture.login_user1().await;
    let records = fixture.client.vault_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identity, "zairo");
}

#[tokio::test]
async fn test_vault_record_targeted_delete() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    fixture
        .client
        .add_vault_record("a.example", "id-a", "pw-a")
        .await
        .unwrap();
    // Distinct millisecond ids.
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    fixture
        .client
        .add_vault_record("b.example", "id-b", "pw-b")
        .await
        .unwrap();
    fixture.client.settle().await;

    let records = fixture.client.vault_records().await;
    assert_eq!(records.len(), 2);
    let victim = records.iter().find(|r| r.site_label == "a.example").unwrap();
    let survivor_id = records.iter().find(|r| r.site_label == "b.example").unwrap().id;

    fixture.client.delete_vault_record(victim.id).await.unwrap();
    fixture.client.settle().await;

    assert_eq!(fixture.client.vault_records().await.len(), 1);
    assert!(fixture
        .remote
        .persisted(&paths::vault_record("user1", victim.id))
        .await
        .is_none());
    assert!(fixture
        .remote
        .persisted(&paths::vault_record("user1", survivor_id))
        .await
        .is_some());
}

// ==================== QUOTA ====================

#[tokio::test]
async fn test_quota_warning_fires_once_per_crossing() {
    // Capacity 1000 bytes, warning at 800.
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    let big = fixture.upload("big.bin", &vec![0u8; 850]).await;
    assert_eq!(
        fixture.client.current_notification().unwrap().message,
        "Storage Almost Full"
    );

    // Still above the threshold: no re-fire, the success message stands.
    fixture.upload("more.bin", &vec![0u8; 100]).await;
    assert_eq!(
        fixture.client.current_notification().unwrap().message,
        "1 assets encrypted"
    );

    // Drop below the threshold, then cross again: the warning re-fires.
    fixture.client.request_delete(TargetKind::File, big);
    fixture.client.advance_delete().await.unwrap();
    fixture.client.advance_delete().await.unwrap();
    fixture.client.settle().await;

    fixture.upload("again.bin", &vec![0u8; 750]).await;
    assert_eq!(
        fixture.client.current_notification().unwrap().message,
        "Storage Almost Full"
    );
}

#[tokio::test]
async fn test_full_partition_warns_at_session_start() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;
    fixture.upload("big.bin", &vec![0u8; 850]).await;

    // A reload restores the session into an already-full partition and must
    // warn right away, before any mutation.
    let reloaded = fixture.reload().await;
    assert_eq!(reloaded.active_account().as_deref(), Some("user1"));
    assert_eq!(
        reloaded.current_notification().unwrap().message,
        "Storage Almost Full"
    );

    // A fresh authentication into the same partition warns too.
    fixture.client.logout().await;
    let fresh = fixture.reload().await;
    assert!(fresh.active_account().is_none());
    fresh.login("user1", "zairo123").await.unwrap();
    assert_eq!(
        fresh.current_notification().unwrap().message,
        "Storage Almost Full"
    );
}

// ==================== PERSISTENCE SEMANTICS ====================

#[tokio::test]
async fn test_persist_failure_keeps_optimistic_state() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    fixture.remote.set_fail_writes(true);
    fixture.client.post_note("living on locally").await.unwrap();
    fixture.client.settle().await;

    // The mutation stays visible locally, never reached the remote, and the
    // failure surfaced as an error notification.
    assert_eq!(fixture.client.notes().await.len(), 1);
    assert!(fixture.remote.persisted(paths::NOTES).await.is_none());
    let current = fixture.client.current_notification().unwrap();
    assert_eq!(current.message, "Sync Failed");
    assert_eq!(current.kind, NotificationKind::Error);
}

#[tokio::test]
async fn test_sync_pending_exposed_during_write() {
    let fixture = TestFixture::new().await;
    fixture.login_user1().await;

    fixture.client.post_note("in flight").await.unwrap();
    fixture.client.settle().await;
    assert!(!fixture.client.sync_pending());
    assert!(fixture.remote.persisted(paths::NOTES).await.is_some());
}

#[tokio::test]
async fn test_absent_collections_load_as_defaults() {
    // A completely empty remote store: the seed directory appears and every
    // other collection is empty rather than an error.
    let fixture = TestFixture::new().await;
    assert_eq!(fixture.client.directory().await.len(), 2);

    fixture.login_user1().await;
    assert!(fixture.client.files().await.is_empty());
    assert!(fixture.client.notes().await.is_empty());
    assert!(fixture.client.vault_records().await.is_empty());
}
