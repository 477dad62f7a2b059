//! End-to-end flow against an in-memory gateway: create a mailbox,
//! observe the ready event, fetch the listing, read one message.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use dropmail::error::ClientResult;
use dropmail::gateway::{MailGateway, RemoteBody, RemoteMessage};
use dropmail::prelude::*;

struct FixtureGateway;

#[async_trait]
impl MailGateway for FixtureGateway {
    async fn active_domains(&self) -> ClientResult<Vec<String>> {
        Ok(vec!["example.com".to_string()])
    }

    async fn create_address(&self) -> ClientResult<String> {
        Ok("alice@example.com".to_string())
    }

    async fn list_messages(&self, address: &str) -> ClientResult<Vec<RemoteMessage>> {
        assert_eq!(address, "alice@example.com");
        Ok(vec![serde_json::from_str(
            r#"{"id":101,"from":"bob@example.com","subject":"hello","date":"2026-08-30"}"#,
        )
        .unwrap()])
    }

    async fn read_message(&self, address: &str, remote_id: &str) -> ClientResult<RemoteBody> {
        assert_eq!(address, "alice@example.com");
        assert_eq!(remote_id, "101");
        Ok(serde_json::from_str(r#"{"textBody":"hi","htmlBody":"<p>hi</p>"}"#).unwrap())
    }
}

#[tokio::test]
async fn create_fetch_and_read_one_message() {
    let client = Client::new(Arc::new(FixtureGateway));

    let session = MailboxSession::new(client.gateway());
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    session
        .on_ready(move |address| {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(address);
            }
        })
        .await;

    session.connect(None).await.unwrap();
    assert_eq!(rx.await.unwrap(), "alice@example.com");

    let messages = session.fetch().await.unwrap();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.remote_id, "101");
    assert_eq!(message.from, "bob@example.com");
    assert_eq!(message.subject, "hello");
    assert_eq!(message.date, "2026-08-30");
    assert!(message.body.is_none());

    let read = session.read(&message.local_id).await.unwrap();
    assert_eq!(
        read.body,
        Some(Body {
            text: "hi".to_string(),
            html: "<p>hi</p>".to_string(),
        })
    );
}

#[tokio::test]
async fn login_attaches_and_fetches_the_existing_mailbox() {
    let client = Client::new(Arc::new(FixtureGateway));

    let session = client.login("alice@example.com").await.unwrap();
    assert_eq!(
        session.address().await.as_deref(),
        Some("alice@example.com")
    );

    let messages = session.fetch().await.unwrap();
    assert_eq!(messages.len(), 1);
}
