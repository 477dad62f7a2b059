use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::session::{MailboxSession, Message};

/// Spawns the poll-loop task for a session.
///
/// The loop is self-rescheduling rather than fixed-rate: the next fetch
/// is timed from the completion of the previous one, so a slow round
/// delays the schedule instead of overlapping it, and fetches issued by
/// the loop are strictly sequential.
///
/// A failed fetch is logged and the loop reschedules anyway; a remote
/// that is temporarily degraded stays reachable without the caller
/// having to restart the listener.
pub(crate) fn spawn<F>(
    session: MailboxSession,
    interval: Duration,
    mut on_batch: F,
    cancel: CancellationToken,
) where
    F: FnMut(Vec<Message>) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let seen = session.known_remote_ids().await;

            match session.fetch().await {
                Ok(messages) => {
                    // Cancelled mid-fetch: drop the result instead of
                    // delivering it, and schedule nothing further.
                    if cancel.is_cancelled() {
                        debug!("listener cancelled during fetch, discarding result");
                        return;
                    }
                    let delta: Vec<Message> = messages
                        .into_iter()
                        .filter(|m| !seen.contains(&m.remote_id))
                        .collect();
                    if !delta.is_empty() {
                        debug!("poll round produced {} new message(s)", delta.len());
                        on_batch(delta);
                    }
                }
                Err(e) => {
                    if cancel.is_cancelled() {
                        return;
                    }
                    warn!("poll fetch failed, retrying next round: {}", e);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("listener stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    });
}
