//! Remote document store adapter.
//!
//! The remote store is a path-addressed JSON document service: every write
//! replaces the value at a path wholesale, there are no transactions and no
//! partial updates. The core only ever talks to it through [`RemoteStore`],
//! so tests substitute an in-memory adapter for the real HTTP one.

mod http;
mod memory;

pub use http::*;
pub use memory::*;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;

/// Narrow interface over the remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the value at `path`. An absent path is `None`, not an error.
    async fn read(&self, path: &str) -> Result<Option<Value>, AppError>;

    /// Replace the value at `path` wholesale.
    async fn write(&self, path: &str, value: &Value) -> Result<(), AppError>;

    /// Delete the value at `path`.
    async fn remove(&self, path: &str) -> Result<(), AppError>;
}

/// Logical path layout of the remote store.
pub mod paths {
    /// Full account map.
    pub const ACCOUNTS: &str = "accounts";

    /// Full shared note list.
    pub const NOTES: &str = "notes";

    /// Ordered list of one account's file assets.
    pub fn files(account_id: &str) -> String {
        format!("files/{}", account_id)
    }

    /// One account's full vault partition.
    pub fn vault(account_id: &str) -> String {
        format!("vault/{}", account_id)
    }

    /// A single vault record, addressable for targeted deletes without
    /// rewriting the whole partition.
    pub fn vault_record(account_id: &str, record_id: i64) -> String {
        format!("vault/{}/{}", account_id, record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::paths;

    #[test]
    fn test_path_layout() {
        assert_eq!(paths::files("user1"), "files/user1");
        assert_eq!(paths::vault("user2"), "vault/user2");
        assert_eq!(
            paths::vault_record("user1", 1700000000000),
            "vault/user1/1700000000000"
        );
    }
}
