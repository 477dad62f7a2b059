use std::sync::Arc;

use crate::config::Settings;
use crate::error::ClientResult;
use crate::gateway::{HttpGateway, MailGateway};
use crate::session::MailboxSession;

/// Entry point tying a gateway to mailbox sessions.
pub struct Client {
    gateway: Arc<dyn MailGateway>,
}

impl Client {
    /// Builds a client over an arbitrary gateway implementation.
    pub fn new(gateway: Arc<dyn MailGateway>) -> Self {
        Self { gateway }
    }

    /// Builds a client over the HTTP gateway described by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Arc::new(HttpGateway::new(
            &settings.api_scheme,
            &settings.api_host,
        )))
    }

    pub fn gateway(&self) -> Arc<dyn MailGateway> {
        Arc::clone(&self.gateway)
    }

    /// Creates a session on a freshly assigned random address.
    pub async fn create(&self) -> ClientResult<MailboxSession> {
        let session = MailboxSession::new(Arc::clone(&self.gateway));
        session.connect(None).await?;
        Ok(session)
    }

    /// Creates a session attached to an existing address. No remote
    /// call is made; the address is adopted as-is.
    pub async fn login(&self, address: &str) -> ClientResult<MailboxSession> {
        let session = MailboxSession::new(Arc::clone(&self.gateway));
        session.connect(Some(address.to_string())).await?;
        Ok(session)
    }
}
