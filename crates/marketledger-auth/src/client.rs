//! Token endpoint client.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::token::{ErrorResponse, TokenPair, TokenResponse};

/// Client for the credential exchange and refresh endpoints.
#[derive(Debug, Clone)]
pub struct TokenClient {
    /// Endpoint exchanging credentials for a token pair.
    pub obtain_url: Url,
    /// Endpoint exchanging a refresh token for a new access token.
    pub refresh_url: Url,
    http_client: Client,
}

#[derive(Serialize)]
struct ObtainRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

impl TokenClient {
    /// Creates a token client for an API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs cannot be built.
    pub fn new(base_url: &Url) -> Result<Self> {
        Ok(Self {
            obtain_url: base_url.join("token/")?,
            refresh_url: base_url.join("token/refresh/")?,
            http_client: Client::new(),
        })
    }

    /// Uses the given HTTP client for token requests.
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Exchanges a username and password for a token pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn obtain(&self, username: &str, password: &str) -> Result<TokenPair> {
        let response = self
            .http_client
            .post(self.obtain_url.clone())
            .json(&ObtainRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(error.into_error(status.as_u16()));
        }

        let token_response: TokenResponse = response.json().await?;
        debug!("Obtained token pair for {username}");
        Ok(TokenPair::from_response(token_response))
    }

    /// Refreshes an access token using the pair's refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the pair has no refresh token.
    pub async fn refresh(&self, current: &TokenPair) -> Result<TokenPair> {
        let refresh = current.refresh_token()?;

        let response = self
            .http_client
            .post(self.refresh_url.clone())
            .json(&RefreshRequest { refresh })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(error.into_error(status.as_u16()));
        }

        let token_response: TokenResponse = response.json().await?;
        let mut new_pair = TokenPair::from_response(token_response);

        // Preserve refresh token if not rotated
        if new_pair.refresh.is_none() {
            new_pair.refresh.clone_from(&current.refresh);
        }

        Ok(new_pair)
    }
}
