//! Best-effort reply broadcast.

use super::relay::{Endpoint, PublishStatus};
use crate::error::{QuoteError, Result};
use crate::nostr::{Event, Keys, Tag, KIND_TEXT_NOTE};

pub struct ReplyPublisher<'a, E: Endpoint> {
    keys: &'a Keys,
    endpoints: &'a [E],
}

impl<'a, E: Endpoint> ReplyPublisher<'a, E> {
    pub fn new(keys: &'a Keys, endpoints: &'a [E]) -> Self {
        Self { keys, endpoints }
    }

    /// Sign a kind-1 reply to `in_reply_to` and send it to every endpoint.
    ///
    /// Succeeds when at least one endpoint accepted it; per-endpoint failures only
    /// count against that endpoint.
    pub fn publish(&self, in_reply_to: &str, content: &str) -> Result<Event> {
        let event = Event::sign(
            self.keys,
            chrono::Utc::now().timestamp(),
            KIND_TEXT_NOTE,
            vec![Tag::reply_to(in_reply_to)],
            content,
        )?;

        let accepted = self.broadcast(&event);
        if accepted == 0 {
            return Err(QuoteError::PublishFailed);
        }
        log::info!(
            "Published reply {} to {}/{} relays",
            event.id,
            accepted,
            self.endpoints.len()
        );
        Ok(event)
    }

    /// Number of endpoints that acknowledged `event`
    pub fn broadcast(&self, event: &Event) -> usize {
        self.endpoints
            .iter()
            .filter(|endpoint| match endpoint.publish(event) {
                Ok(PublishStatus::Accepted) => true,
                Ok(PublishStatus::Rejected(reason)) => {
                    log::debug!("Relay {}: rejected {}: {}", endpoint.url(), event.id, reason);
                    false
                }
                Err(e) => {
                    log::debug!("Relay {}: publish failed: {}", endpoint.url(), e);
                    false
                }
            })
            .count()
    }
}
