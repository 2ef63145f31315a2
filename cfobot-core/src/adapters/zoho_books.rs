//! Zoho Books API client
//!
//! Read-only ledger queries scoped to one organization per entity.
//!
//! API Documentation: https://www.zoho.com/books/api/v3/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value as JsonValue;
use url::form_urlencoded;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::Entity;
use crate::ports::LedgerApi;
use crate::services::CredentialCache;

/// Zoho Books client
pub struct ZohoBooksClient {
    client: Client,
    default_base: String,
    cache: Arc<CredentialCache>,
}

impl ZohoBooksClient {
    pub fn new(default_base: &str, cache: Arc<CredentialCache>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            default_base: default_base.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn from_config(config: &Config, cache: Arc<CredentialCache>) -> Result<Self> {
        Self::new(&config.api_base, cache, config.request_timeout)
    }

    /// `{base}/{endpoint}?organization_id=...&params`
    ///
    /// Endpoints that already carry a query string are appended to with `&`.
    pub fn build_url(&self, entity: &Entity, endpoint: &str, params: &[(String, String)]) -> String {
        let base = entity.api_base_or(&self.default_base);
        let endpoint = endpoint.trim_start_matches('/');
        let separator = if endpoint.contains('?') { '&' } else { '?' };

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("organization_id", &entity.org_id)
            .extend_pairs(params)
            .finish();

        format!("{}/{}{}{}", base, endpoint, separator, query)
    }

    async fn send(&self, url: &str, token: &str) -> Result<JsonValue> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        classify_response(status, &body)
    }
}

#[async_trait]
impl LedgerApi for ZohoBooksClient {
    async fn call(
        &self,
        entity: &Entity,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<JsonValue> {
        let url = self.build_url(entity, endpoint, params);
        debug!("GET {}", url);

        let credential = self.cache.get_token().await?;
        match self.send(&url, &credential.token).await {
            Err(e) if e.is_auth_failure() => {
                warn!(
                    "Ledger rejected the access token for {} ({}), refreshing once",
                    entity.code, endpoint
                );
                self.cache.invalidate(&credential.token).await;
                let credential = self.cache.get_token().await?;
                self.send(&url, &credential.token).await
            }
            result => result,
        }
    }
}

/// Turn a ledger response into a tree or a `LedgerApi` error
///
/// Zoho can answer HTTP 200 with a non-zero `code`, so the body is checked
/// as well as the status. An empty body is an empty (null) tree.
fn classify_response(status: u16, body: &str) -> Result<JsonValue> {
    if !(200..300).contains(&status) {
        return Err(Error::ledger_api(status, body));
    }

    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }

    let tree: JsonValue = serde_json::from_str(body)?;

    let code = tree.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
    let has_error = tree.get("error").is_some_and(|e| !e.is_null());
    if code != 0 || has_error {
        return Err(Error::ledger_api(status, body));
    }

    Ok(tree)
}
