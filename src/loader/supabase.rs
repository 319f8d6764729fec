//! Supabase (PostgREST) table store

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use super::error::{StoreError, StoreResult};
use super::store::TableStore;
use super::value::Record;

/// Request timeout for a single insert call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Inserts rows through the Supabase REST endpoint (`/rest/v1/{table}`)
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    schema: Option<String>,
}

impl SupabaseStore {
    /// Create a store for a project URL and service role key
    pub fn new(url: &str, service_role_key: &str) -> StoreResult<Self> {
        let base_url = url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StoreError::InvalidConfig(format!(
                "Supabase URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        if service_role_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "Supabase service role key is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_role_key.trim())
            .map_err(|e| StoreError::InvalidConfig(format!("Invalid service role key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_role_key.trim()))
            .map_err(|e| StoreError::InvalidConfig(format!("Invalid service role key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            schema: None,
        })
    }

    /// Target a schema other than `public`
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema.filter(|s| !s.is_empty());
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url,
            urlencoding::encode(table)
        )
    }
}

impl TableStore for SupabaseStore {
    fn describe(&self) -> String {
        format!("Supabase at {}", self.base_url)
    }

    fn check_connection(&self) -> StoreResult<()> {
        let response = self
            .client
            .get(format!("{}/rest/v1/", self.base_url))
            .send()
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unreachable(
                format!("credentials refused ({})", response.status()),
            )),
            status => Err(StoreError::Unreachable(format!(
                "unexpected status {}",
                status
            ))),
        }
    }

    fn insert_rows(&self, table: &str, rows: &[Record]) -> StoreResult<()> {
        let body =
            serde_json::to_vec(rows).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut request = self
            .client
            .post(self.table_url(table))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=minimal")
            .body(body);
        if let Some(schema) = &self.schema {
            request = request.header("Content-Profile", schema.as_str());
        }

        let response = request
            .send()
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .text()
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        Err(StoreError::Rejected {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_url() {
        let err = SupabaseStore::new("project.supabase.co", "key").err().unwrap();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_empty_key() {
        let err = SupabaseStore::new("https://project.supabase.co", "  ")
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_table_url() {
        let store = SupabaseStore::new("https://project.supabase.co/", "key").unwrap();
        assert_eq!(
            store.table_url("games_temp"),
            "https://project.supabase.co/rest/v1/games_temp"
        );
        assert_eq!(store.describe(), "Supabase at https://project.supabase.co");
    }
}
