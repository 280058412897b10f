//! Shared note model.

use serde::{Deserialize, Serialize};

/// A message on the shared log, visible to every authenticated account.
///
/// The author's display name is snapshotted at posting time; a later profile
/// rename does not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Time-derived unique id (epoch milliseconds)
    pub id: i64,
    pub author_account_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: String,
}

/// Sort notes newest-first by id, the display order of the shared log.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.id.cmp(&a.id));
}
