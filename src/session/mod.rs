//! Session management.
//!
//! At most one authenticated account per client instance. The active account
//! id is persisted to tab-scoped storage so a reload restores the session
//! without re-authenticating; that storage is trusted verbatim on restore,
//! which is a deliberate trust boundary of the original system (tampering
//! with it is equivalent to an authentication bypass within that tab).
//!
//! Secret comparisons use constant-time equality to avoid timing leaks.

use std::sync::{Mutex, RwLock};

use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::models::Account;

/// Tab-scoped persisted state: one slot holding the active account id.
pub trait TabStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, account_id: &str);
    fn clear(&self);
}

/// In-process [`TabStorage`] used by the headless shell and by tests.
#[derive(Default)]
pub struct MemoryTabStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTabStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabStorage for MemoryTabStorage {
    fn load(&self) -> Option<String> {
        self.slot.lock().expect("tab storage lock poisoned").clone()
    }

    fn save(&self, account_id: &str) {
        *self.slot.lock().expect("tab storage lock poisoned") = Some(account_id.to_string());
    }

    fn clear(&self) {
        *self.slot.lock().expect("tab storage lock poisoned") = None;
    }
}

/// Tracks the single active-account binding for this client instance.
pub struct SessionManager {
    tab: Box<dyn TabStorage>,
    active: RwLock<Option<String>>,
}

impl SessionManager {
    pub fn new(tab: Box<dyn TabStorage>) -> Self {
        Self {
            tab,
            active: RwLock::new(None),
        }
    }

    /// The currently authenticated account id, if any.
    pub fn active(&self) -> Option<String> {
        self.active.read().expect("session lock poisoned").clone()
    }

    /// Verify `secret` against the account's stored secret and bind the
    /// session on success. Credentials are compared verbatim: no hashing,
    /// no lockout, no rate limiting.
    pub fn authenticate(
        &self,
        account: Option<&Account>,
        account_id: &str,
        secret: &str,
    ) -> Result<(), AppError> {
        let account = account
            .ok_or_else(|| AppError::AuthFailed(format!("Unknown account {}", account_id)))?;

        if !constant_time_compare(secret, &account.secret) {
            return Err(AppError::AuthFailed("Wrong secret".to_string()));
        }

        *self.active.write().expect("session lock poisoned") = Some(account_id.to_string());
        self.tab.save(account_id);
        Ok(())
    }

    /// Restore a persisted session from tab storage. The stored id is
    /// treated as authenticated without re-verifying the secret.
    pub fn restore(&self) -> Option<String> {
        let restored = self.tab.load();
        if let Some(id) = &restored {
            *self.active.write().expect("session lock poisoned") = Some(id.clone());
        }
        restored
    }

    /// Clear the active session and the persisted identifier.
    pub fn terminate(&self) {
        *self.active.write().expect("session lock poisoned") = None;
        self.tab.clear();
    }
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
