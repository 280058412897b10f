//! Upload pipeline.
//!
//! Selected binary inputs pass a size check, then sit in a staging batch
//! where per-file alias/note metadata can be edited before the whole batch is
//! encoded and committed in one partition write. Link-kind assets bypass
//! encoding entirely and carry an external URI instead of bytes.

use chrono::Utc;
use std::sync::Mutex;

use crate::models::{encode_data_url, time_id, FileAsset, FileKind};

/// A selected binary input, before any processing.
#[derive(Debug)]
pub struct RawInput {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// An input that passed the size check, with its editable metadata.
#[derive(Debug)]
pub struct StagedUpload {
    pub alias: String,
    pub note: String,
    input: RawInput,
}

impl StagedUpload {
    pub fn size_bytes(&self) -> u64 {
        self.input.bytes.len() as u64
    }
}

/// An input rejected by the size check.
#[derive(Debug, Clone)]
pub struct RejectedInput {
    pub file_name: String,
    pub size_bytes: u64,
}

/// Result of staging a selection: how many inputs were accepted and which
/// were rejected outright.
#[derive(Debug)]
pub struct StageOutcome {
    pub accepted: usize,
    pub rejected: Vec<RejectedInput>,
}

/// Converts raw inputs into storable file assets through a staging batch.
pub struct UploadPipeline {
    max_upload_bytes: u64,
    staged: Mutex<Vec<StagedUpload>>,
}

impl UploadPipeline {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self {
            max_upload_bytes,
            staged: Mutex::new(Vec::new()),
        }
    }

    /// Size-filter a selection and stage the survivors. The ceiling applies
    /// to the partition's total stored bytes, so an input is rejected when it
    /// does not fit in what remains after counting both committed and
    /// already-staged bytes; the oversize subset is rejected as a whole and
    /// the remainder proceeds.
    pub fn stage(&self, inputs: Vec<RawInput>, used_bytes: u64) -> StageOutcome {
        let mut staged = self.staged.lock().expect("upload staging lock poisoned");
        let staged_bytes: u64 = staged.iter().map(|s| s.size_bytes()).sum();
        let mut remaining = self
            .max_upload_bytes
            .saturating_sub(used_bytes)
            .saturating_sub(staged_bytes);
        let mut rejected = Vec::new();
        let mut accepted = 0;

        for input in inputs {
            let size_bytes = input.bytes.len() as u64;
            if size_bytes > remaining {
                rejected.push(RejectedInput {
                    file_name: input.file_name,
                    size_bytes,
                });
                continue;
            }
            remaining -= size_bytes;
            staged.push(StagedUpload {
                alias: input.file_name.clone(),
                note: String::new(),
                input,
            });
            accepted += 1;
        }

        StageOutcome { accepted, rejected }
    }

    pub fn staged_count(&self) -> usize {
        self.staged.lock().expect("upload staging lock poisoned").len()
    }

    /// Edit the alias/note of one staged file. Returns whether the index was
    /// valid.
    pub fn set_meta(&self, index: usize, alias: Option<&str>, note: Option<&str>) -> bool {
        let mut staged = self.staged.lock().expect("upload staging lock poisoned");
        match staged.get_mut(index) {
            Some(entry) => {
                if let Some(alias) = alias {
                    entry.alias = alias.to_string();
                }
                if let Some(note) = note {
                    entry.note = note.to_string();
                }
                true
            }
            None => false,
        }
    }

    /// Discard the staging batch without committing anything.
    pub fn clear(&self) {
        self.staged.lock().expect("upload staging lock poisoned").clear();
    }

    /// Drain the staging batch into encoded file assets, ready to commit in
    /// a single partition mutation.
    pub fn encode_staged(&self, owner_account_id: &str) -> Vec<FileAsset> {
        let drained: Vec<StagedUpload> = self
            .staged
            .lock()
            .expect("upload staging lock poisoned")
            .drain(..)
            .collect();

        let base_id = time_id();
        let created_at = Utc::now().to_rfc3339();

        drained
            .into_iter()
            .enumerate()
            .map(|(i, staged)| FileAsset {
                // Offset keeps ids unique within a batch minted in one tick.
                id: base_id + i as i64,
                owner_account_id: owner_account_id.to_string(),
                display_name: staged.alias.clone(),
                mime_type: staged.input.mime_type.clone(),
                kind: FileKind::Data,
                size_bytes: staged.input.bytes.len() as u64,
                payload: encode_data_url(&staged.input.mime_type, &staged.input.bytes),
                note: if staged.note.is_empty() {
                    None
                } else {
                    Some(staged.note.clone())
                },
                created_at: created_at.clone(),
            })
            .collect()
    }

    /// Build a zero-size link-kind asset. No encoding, no size check.
    pub fn make_link(
        &self,
        owner_account_id: &str,
        label: &str,
        uri: &str,
        note: &str,
    ) -> FileAsset {
        let normalized = normalize_uri(uri);
        FileAsset {
            id: time_id(),
            owner_account_id: owner_account_id.to_string(),
            display_name: if label.is_empty() {
                uri.to_string()
            } else {
                label.to_string()
            },
            mime_type: "link".to_string(),
            kind: FileKind::Link,
            size_bytes: 0,
            payload: normalized,
            note: if note.is_empty() {
                None
            } else {
                Some(note.to_string())
            },
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Qualify a bare host/path with a scheme if none is present.
fn normalize_uri(uri: &str) -> String {
    let lower = uri.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        uri.to_string()
    } else {
        format!("https://{}", uri)
    }
}
