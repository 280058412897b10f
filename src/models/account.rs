//! Account model and the built-in seed directory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An account in the shared directory.
///
/// Accounts are keyed by a stable id in the `accounts` collection; the id is
/// the map key and never appears inside the record. The secret is stored in
/// plaintext, a property of the deployed system that is preserved, not an
/// invitation to imitate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub display_name: String,
    /// URI of the avatar image (or an inline data URL)
    pub avatar_ref: String,
    pub secret: String,
}

/// Public view of an account for the signed-out picker: id, name and avatar,
/// never the secret.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: String,
    pub display_name: String,
    pub avatar_ref: String,
}

impl DirectoryEntry {
    pub fn new(id: &str, account: &Account) -> Self {
        Self {
            id: id.to_string(),
            display_name: account.display_name.clone(),
            avatar_ref: account.avatar_ref.clone(),
        }
    }
}

/// The two built-in accounts used when the remote `accounts` path has never
/// been written. A fresh deployment is usable without any provisioning step.
pub fn seed_accounts() -> BTreeMap<String, Account> {
    let mut accounts = BTreeMap::new();
    accounts.insert(
        "user1".to_string(),
        Account {
            display_name: "Zairo".to_string(),
            avatar_ref: "https://api.dicebear.com/7.x/avataaars/svg?seed=Zairo".to_string(),
            secret: "zairo123".to_string(),
        },
    );
    accounts.insert(
        "user2".to_string(),
        Account {
            display_name: "stan și bran realitatea plus ❤".to_string(),
            avatar_ref: "https://api.dicebear.com/7.x/avataaars/svg?seed=Stan".to_string(),
            secret: "stan123".to_string(),
        },
    );
    accounts
}
