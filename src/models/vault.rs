//! Vault record model.

use serde::{Deserialize, Serialize};

/// A stored credential, partitioned per account under `vault/{accountId}`.
///
/// Never exposed for any account other than the currently authenticated one.
/// Secrets are stored as entered; the vault offers access gating, not
/// cryptographic protection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    /// Time-derived unique id (epoch milliseconds)
    pub id: i64,
    pub site_label: String,
    pub identity: String,
    pub secret: String,
    pub created_at: String,
}
