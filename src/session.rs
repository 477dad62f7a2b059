use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};
use crate::gateway::MailGateway;
use crate::listener;
use crate::token;

/// Message body, populated only after an explicit [`MailboxSession::read`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Body {
    pub text: String,
    pub html: String,
}

/// A message in the mailbox, keyed by its locally generated identifier.
///
/// `local_id` is the caller-facing handle: it is stable for the life of
/// the session and never reused. `remote_id` is the provider's key and
/// is only used to address read requests.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub local_id: String,
    pub remote_id: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub body: Option<Body>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Unconnected,
    Connecting,
    Ready,
}

type ReadyHook = Box<dyn FnOnce(String) + Send + 'static>;

struct SessionInner {
    state: SessionState,
    address: Option<String>,
    /// Provider message id -> local id, for the life of the session.
    remote_index: HashMap<String, String>,
    /// Insertion-ordered by first-seen time.
    messages: Vec<Message>,
    ready_hook: Option<ReadyHook>,
}

/// Live client-side state of one disposable mailbox.
///
/// The session moves `Unconnected -> Connecting -> Ready` and never
/// back. All mutable state sits behind one async mutex; network calls
/// are made outside the lock and the merge of their results runs
/// synchronously under it, so the check-then-insert step in
/// [`fetch`](Self::fetch) can never observe a half-applied update.
#[derive(Clone)]
pub struct MailboxSession {
    gateway: Arc<dyn MailGateway>,
    inner: Arc<Mutex<SessionInner>>,
    listener: Arc<Mutex<Option<CancellationToken>>>,
}

impl MailboxSession {
    pub fn new(gateway: Arc<dyn MailGateway>) -> Self {
        Self {
            gateway,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Unconnected,
                address: None,
                remote_index: HashMap::new(),
                messages: Vec::new(),
                ready_hook: None,
            })),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Registers the handler for the single `ready` event.
    ///
    /// If the session is already `Ready` the handler still fires on a
    /// spawned task, never synchronously inside this call.
    pub async fn on_ready<F>(&self, hook: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let mut inner = self.inner.lock().await;
        match (&inner.state, &inner.address) {
            (SessionState::Ready, Some(address)) => {
                let address = address.clone();
                tokio::spawn(async move { hook(address) });
            }
            _ => inner.ready_hook = Some(Box::new(hook)),
        }
    }

    /// Connects the session, either adopting `address` directly or
    /// asking the provider to assign a fresh random one.
    ///
    /// A second call is a usage error. On a failed remote call the
    /// session stays `Connecting` and the error is returned; it does
    /// not fall back to `Unconnected`.
    pub async fn connect(&self, address: Option<String>) -> ClientResult<()> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != SessionState::Unconnected {
                return Err(ClientError::InvalidState(
                    "connect may only be called once".to_string(),
                ));
            }
            inner.state = SessionState::Connecting;

            if let Some(address) = address {
                info!("attached to existing mailbox {}", address);
                Self::mark_ready(&mut inner, address);
                return Ok(());
            }
        }

        // Lock released across the remote call.
        let address = self.gateway.create_address().await?;
        info!("provider assigned mailbox {}", address);

        let mut inner = self.inner.lock().await;
        Self::mark_ready(&mut inner, address);
        Ok(())
    }

    fn mark_ready(inner: &mut SessionInner, address: String) {
        inner.state = SessionState::Ready;
        inner.address = Some(address.clone());
        if let Some(hook) = inner.ready_hook.take() {
            // Deliver on a fresh task so the hook never runs inside the
            // call that registered it or inside connect itself.
            tokio::spawn(async move { hook(address) });
        }
    }

    /// The mailbox address, once connected.
    pub async fn address(&self) -> Option<String> {
        self.inner.lock().await.address.clone()
    }

    async fn ready_address(&self) -> ClientResult<String> {
        let inner = self.inner.lock().await;
        match (&inner.state, &inner.address) {
            (SessionState::Ready, Some(address)) => Ok(address.clone()),
            _ => Err(ClientError::InvalidState(
                "session is not connected".to_string(),
            )),
        }
    }

    /// Polls the provider once and merges the result into the session.
    ///
    /// Messages whose provider id is already known are skipped; each
    /// genuinely new one gets a fresh local identifier, generated
    /// against everything issued so far. Returns the full current
    /// collection; computing deltas is the poll loop's job.
    pub async fn fetch(&self) -> ClientResult<Vec<Message>> {
        let address = self.ready_address().await?;
        let remote = self.gateway.list_messages(&address).await?;

        let mut inner = self.inner.lock().await;

        // Merge runs without await points: checking a remote id and
        // inserting its mapping are atomic with respect to any other
        // task touching this session.
        let mut issued: HashSet<String> = inner.remote_index.values().cloned().collect();
        for entry in remote {
            if inner.remote_index.contains_key(&entry.id) {
                continue;
            }
            let local_id = token::generate(token::DEFAULT_TOKEN_BYTES, &issued);
            issued.insert(local_id.clone());
            inner.remote_index.insert(entry.id.clone(), local_id.clone());
            debug!("new message {} (remote id {})", local_id, entry.id);
            inner.messages.push(Message {
                local_id,
                remote_id: entry.id,
                from: entry.from,
                subject: entry.subject,
                date: entry.date,
                body: None,
            });
        }

        Ok(inner.messages.clone())
    }

    /// Reads the full body of a message by its local identifier.
    ///
    /// The body is fetched from the provider on every call and
    /// overwritten in place; an earlier read is not cached.
    pub async fn read(&self, local_id: &str) -> ClientResult<Message> {
        let address = self.ready_address().await?;
        let remote_id = {
            let inner = self.inner.lock().await;
            inner
                .messages
                .iter()
                .find(|m| m.local_id == local_id)
                .map(|m| m.remote_id.clone())
                .ok_or_else(|| ClientError::UnknownIdentifier(local_id.to_string()))?
        };

        let detail = self.gateway.read_message(&address, &remote_id).await?;

        let mut inner = self.inner.lock().await;
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.local_id == local_id)
            .ok_or_else(|| ClientError::UnknownIdentifier(local_id.to_string()))?;
        message.body = Some(Body {
            text: detail.text_body,
            html: detail.html_body,
        });
        Ok(message.clone())
    }

    /// Starts the poll loop: an immediate fetch, then one fetch
    /// `interval` after each previous one completes. `on_batch` is
    /// invoked with exactly the newly seen messages of each round, in
    /// list order, and never with an empty batch.
    ///
    /// Only one loop may be active per session; starting a second one
    /// is rejected rather than silently orphaning the first.
    pub async fn listen<F>(&self, interval: Duration, on_batch: F) -> ClientResult<()>
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        self.ready_address().await?;

        let mut guard = self.listener.lock().await;
        if let Some(cancel) = guard.as_ref() {
            if !cancel.is_cancelled() {
                return Err(ClientError::InvalidState(
                    "a listener is already active".to_string(),
                ));
            }
        }

        let cancel = CancellationToken::new();
        *guard = Some(cancel.clone());
        listener::spawn(self.clone(), interval, on_batch, cancel);
        Ok(())
    }

    /// Stops the poll loop. Idempotent; safe to call before `listen`.
    ///
    /// Cancellation only prevents future rounds: a fetch already in
    /// flight runs to completion, but its result is not delivered to
    /// the batch callback and does not reschedule another round.
    pub async fn stop(&self) {
        if let Some(cancel) = self.listener.lock().await.take() {
            debug!("stopping listener");
            cancel.cancel();
        }
    }

    /// Snapshot of the provider ids seen so far, taken by the poll loop
    /// before each round to compute that round's delta.
    pub(crate) async fn known_remote_ids(&self) -> HashSet<String> {
        self.inner
            .lock()
            .await
            .remote_index
            .keys()
            .cloned()
            .collect()
    }
}
