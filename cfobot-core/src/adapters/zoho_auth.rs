//! Zoho Accounts OAuth client
//!
//! Exchanges the long-lived refresh token for short-lived access tokens.
//!
//! API Documentation: https://www.zoho.com/accounts/protocol/oauth/web-apps/access-token-expiry.html

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::IssuedToken;
use crate::ports::TokenIssuer;

/// Lifetime assumed when the token response has no `expires_in`
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Refresh-token grant against `{accounts_url}/oauth/v2/token`
pub struct ZohoOAuthIssuer {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl fmt::Debug for ZohoOAuthIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZohoOAuthIssuer")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ZohoOAuthIssuer {
    pub fn new(
        accounts_url: &str,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if refresh_token.is_empty() {
            return Err(Error::config("Zoho refresh token cannot be empty"));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token_url: format!("{}/oauth/v2/token", accounts_url.trim_end_matches('/')),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.accounts_url,
            &config.client_id,
            &config.client_secret,
            &config.refresh_token,
            config.request_timeout,
        )
    }
}

#[async_trait]
impl TokenIssuer for ZohoOAuthIssuer {
    async fn issue(&self) -> Result<IssuedToken> {
        debug!("POST {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| Error::auth(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        parse_token_response(&body)
    }
}

/// Zoho reports a rejected grant as HTTP 200 with an `error` field
fn parse_token_response(body: &str) -> Result<IssuedToken> {
    let value: JsonValue = serde_json::from_str(body)
        .map_err(|e| Error::auth(format!("invalid token response: {}", e)))?;

    if let Some(error) = value.get("error").filter(|v| !v.is_null()) {
        let reason = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(Error::auth(format!("token refresh rejected: {}", reason)));
    }

    let access_token = value
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::auth("token response has no access_token"))?;

    let expires_in = value
        .get("expires_in")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME);

    Ok(IssuedToken {
        access_token: access_token.to_string(),
        expires_in,
    })
}
