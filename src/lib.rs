//! Disposable-inbox client.
//!
//! Creates or attaches to a temporary mailbox on a remote provider,
//! assigns locally stable identifiers to incoming messages, and
//! discovers new messages through a cancellable polling loop. The HTTP
//! transport sits behind the [`gateway::MailGateway`] trait so the
//! synchronization core is testable against an in-memory provider.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod session;
pub mod token;

pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::Settings;
    pub use crate::error::{ClientError, ClientResult};
    pub use crate::gateway::{HttpGateway, MailGateway, RemoteBody, RemoteMessage};
    pub use crate::session::{Body, MailboxSession, Message};

    pub use log::{debug, error, info, warn};
    pub use std::sync::Arc;
}
