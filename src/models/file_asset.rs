//! File asset model and data-URL payload helpers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// What a file asset's payload holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Inline content, base64-encoded as a data URL
    Data,
    /// Pointer to an external URI; carries no bytes
    Link,
}

impl Default for FileKind {
    fn default() -> Self {
        FileKind::Data
    }
}

/// A stored file asset, partitioned per owning account under
/// `files/{accountId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    /// Time-derived unique id (epoch milliseconds)
    pub id: i64,
    pub owner_account_id: String,
    pub display_name: String,
    pub mime_type: String,
    #[serde(default)]
    pub kind: FileKind,
    /// 0 for link-kind assets
    pub size_bytes: u64,
    /// Data URL for `kind = data`, external URI for `kind = link`
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

impl FileAsset {
    pub fn is_link(&self) -> bool {
        self.kind == FileKind::Link
    }
}

/// Encode raw bytes as a `data:` URL with the given MIME type.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Decode a `data:` URL back into its raw bytes.
pub fn decode_data_url(payload: &str) -> Result<Vec<u8>, AppError> {
    let encoded = payload
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .ok_or_else(|| AppError::Validation("Payload is not a base64 data URL".to_string()))?;

    STANDARD
        .decode(encoded)
        .map_err(|e| AppError::Validation(format!("Malformed payload encoding: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let bytes = b"%PDF-1.7 not really a pdf";
        let url = encode_data_url("application/pdf", bytes);
        assert!(url.starts_with("data:application/pdf;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_plain_uri() {
        let err = decode_data_url("https://example.com/file.bin").unwrap_err();
        assert_eq!(err.error_code(), crate::errors::codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_kind_defaults_to_data_on_old_records() {
        // Records written before the link feature carry no kind field.
        let json = r#"{
            "id": 1700000000000,
            "ownerAccountId": "user1",
            "displayName": "report.txt",
            "mimeType": "text/plain",
            "sizeBytes": 5,
            "payload": "data:text/plain;base64,aGVsbG8=",
            "createdAt": "2023-11-14T22:13:20Z"
        }"#;
        let asset: FileAsset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.kind, FileKind::Data);
        assert!(!asset.is_link());
    }
}
