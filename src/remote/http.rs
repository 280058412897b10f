//! HTTP adapter for a Firebase-RTDB-style JSON REST document store.
//!
//! Paths map to `{base}/{path}.json`; a GET of an absent path returns the
//! JSON literal `null`, a PUT replaces the value wholesale and a DELETE
//! removes it.

use async_trait::async_trait;
use serde_json::Value;

use super::RemoteStore;
use crate::errors::AppError;

/// Remote store adapter backed by an HTTP JSON document service.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, AppError> {
        let response = self.client.get(self.url(path)).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Persist(format!(
                "Remote read of {} failed with status {}",
                path,
                response.status()
            )));
        }

        let value: Value = response.json().await?;
        // Absent paths read as JSON null, which is "no value", not an error.
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), AppError> {
        let response = self.client.put(self.url(path)).json(value).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Persist(format!(
                "Remote write of {} failed with status {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let response = self.client.delete(self.url(path)).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Persist(format!(
                "Remote delete of {} failed with status {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }
}
