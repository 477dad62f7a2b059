pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::error::ClientResult;

pub use http::HttpGateway;

/// A message entry as returned by the provider's listing endpoint.
///
/// `id` is the provider-assigned identifier. It is opaque and only
/// stable within one mailbox; some providers serialize it as a JSON
/// number, others as a string, so both are accepted and normalized.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteMessage {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub date: String,
}

/// Message detail as returned by the provider's read endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBody {
    #[serde(default)]
    pub text_body: String,
    #[serde(default)]
    pub html_body: String,
}

/// A domain entry from the provider's domain listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteDomain {
    pub domain: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_private: bool,
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Narrow interface to the remote mail provider.
///
/// The session layer only talks to the provider through this trait, so
/// tests substitute an in-memory implementation the same way the HTTP
/// one is used in production.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Lists the domains the provider currently issues addresses under.
    async fn active_domains(&self) -> ClientResult<Vec<String>>;

    /// Assigns a fresh random address on the provider.
    async fn create_address(&self) -> ClientResult<String>;

    /// Lists the messages currently held for `address`.
    async fn list_messages(&self, address: &str) -> ClientResult<Vec<RemoteMessage>>;

    /// Reads the full body of one message, keyed by its provider id.
    async fn read_message(&self, address: &str, remote_id: &str) -> ClientResult<RemoteBody>;
}
