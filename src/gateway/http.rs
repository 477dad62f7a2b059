use std::collections::HashSet;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};
use crate::gateway::{MailGateway, RemoteBody, RemoteDomain, RemoteMessage};
use crate::token;

/// Number of random bytes in a generated address local part.
const LOCAL_PART_BYTES: usize = 5;

/// `reqwest`-backed gateway speaking the provider's JSON API on a fixed
/// scheme and host.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}://{}", scheme, host),
        }
    }

    /// Issues a GET and deserializes the 2xx response body.
    ///
    /// Non-2xx responses become `ClientError::Api` carrying the body as
    /// text; failure payloads are not always JSON, so the body is passed
    /// through raw rather than rejected.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("GET {} failed with status {}", url, status);
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ClientError::Transport(format!("malformed response from {}: {}", path, e))
        })
    }
}

#[async_trait]
impl MailGateway for HttpGateway {
    async fn active_domains(&self) -> ClientResult<Vec<String>> {
        let domains: Vec<RemoteDomain> = self.get_json("/domains").await?;
        Ok(domains
            .into_iter()
            .filter(|d| d.is_active && !d.is_private)
            .map(|d| d.domain)
            .collect())
    }

    async fn create_address(&self) -> ClientResult<String> {
        let domains = self.active_domains().await?;
        if domains.is_empty() {
            return Err(ClientError::Transport(
                "provider returned no active domains".to_string(),
            ));
        }

        let domain = &domains[rand::thread_rng().gen_range(0..domains.len())];
        let local_part = token::generate(LOCAL_PART_BYTES, &HashSet::new());
        let address = format!("{}@{}", local_part, domain);
        debug!("assigned random address {}", address);
        Ok(address)
    }

    async fn list_messages(&self, address: &str) -> ClientResult<Vec<RemoteMessage>> {
        self.get_json(&format!("/messages?address={}", address))
            .await
    }

    async fn read_message(&self, address: &str, remote_id: &str) -> ClientResult<RemoteBody> {
        self.get_json(&format!("/messages/{}?address={}", remote_id, address))
            .await
    }
}
