//! Data models for the TicShare client core.
//!
//! These records mirror the documents held by the remote store, using the
//! logical field names of the sync contract (camelCase on the wire).

mod account;
mod file_asset;
mod note;
mod vault;

pub use account::*;
pub use file_asset::*;
pub use note::*;
pub use vault::*;

use chrono::Utc;

/// Produce a time-derived unique id (epoch milliseconds).
///
/// Matches the id scheme of every record the original deployment wrote, so
/// new records sort and deduplicate consistently with existing ones.
pub fn time_id() -> i64 {
    Utc::now().timestamp_millis()
}
