//! WebSocket relay client (NIP-01)
//!
//! Every call opens its own connection, runs one exchange, and closes it. The async
//! exchange is driven to completion on a throwaway current-thread runtime so callers
//! stay fully synchronous, and the whole exchange is bounded by the relay timeout.
//!
//! Query:   -> ["REQ", sub, filter]   <- ["EVENT", sub, ev]* ["EOSE", sub]   -> ["CLOSE", sub]
//! Publish: -> ["EVENT", ev]          <- ["OK", id, accepted, message]

use std::future::Future;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;

use crate::nostr::{Event, Filter};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Subscription closed by relay: {0}")]
    Closed(String),

    #[error("Connection dropped before reply")]
    Disconnected,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Failed to create tokio runtime: {0}")]
    Runtime(String),
}

/// Outcome of sending one event to one relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Accepted,
    Rejected(String),
}

/// A queryable, independently reachable record store
pub trait Endpoint {
    fn url(&self) -> &str;

    /// All stored events matching `filter`, up to end-of-stored-events
    fn query(&self, filter: &Filter) -> Result<Vec<Event>, RelayError>;

    fn publish(&self, event: &Event) -> Result<PublishStatus, RelayError>;
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn url(&self) -> &str {
        (**self).url()
    }

    fn query(&self, filter: &Filter) -> Result<Vec<Event>, RelayError> {
        (**self).query(filter)
    }

    fn publish(&self, event: &Event) -> Result<PublishStatus, RelayError> {
        (**self).publish(event)
    }
}

/// Message received from a relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    Eose(String),
    Closed {
        subscription_id: String,
        message: String,
    },
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    Notice(String),
    /// Anything this client does not act on (AUTH, COUNT, future verbs)
    Other(String),
}

impl RelayMessage {
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| RelayError::Protocol(e.to_string()))?;
        let items = value
            .as_array()
            .ok_or_else(|| RelayError::Protocol("relay message is not an array".to_string()))?;

        let str_at = |i: usize| -> Result<String, RelayError> {
            items
                .get(i)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| RelayError::Protocol(format!("missing string at index {}", i)))
        };

        let verb = str_at(0)?;
        match verb.as_str() {
            "EVENT" => {
                let event = items
                    .get(2)
                    .cloned()
                    .ok_or_else(|| RelayError::Protocol("EVENT without payload".to_string()))?;
                let event: Event = serde_json::from_value(event)
                    .map_err(|e| RelayError::Protocol(format!("bad event: {}", e)))?;
                Ok(RelayMessage::Event {
                    subscription_id: str_at(1)?,
                    event: Box::new(event),
                })
            }
            "EOSE" => Ok(RelayMessage::Eose(str_at(1)?)),
            "CLOSED" => Ok(RelayMessage::Closed {
                subscription_id: str_at(1)?,
                message: str_at(2).unwrap_or_default(),
            }),
            "OK" => Ok(RelayMessage::Ok {
                event_id: str_at(1)?,
                accepted: items.get(2).and_then(|v| v.as_bool()).unwrap_or(false),
                message: str_at(3).unwrap_or_default(),
            }),
            "NOTICE" => Ok(RelayMessage::Notice(str_at(1).unwrap_or_default())),
            _ => Ok(RelayMessage::Other(verb)),
        }
    }
}

fn client_message<T: serde::Serialize>(parts: &T) -> Result<Message, RelayError> {
    serde_json::to_string(parts)
        .map(Message::text)
        .map_err(|e| RelayError::Protocol(e.to_string()))
}

/// Relay reached over `ws://` or `wss://`
#[derive(Debug, Clone)]
pub struct Relay {
    url: String,
    timeout: Duration,
}

impl Relay {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    fn run<T, F>(&self, exchange: F) -> Result<T, RelayError>
    where
        F: Future<Output = Result<T, RelayError>>,
    {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RelayError::Runtime(e.to_string()))?;

        let limit = self.timeout;
        rt.block_on(async move {
            tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| RelayError::Timeout(limit))?
        })
    }
}

impl Endpoint for Relay {
    fn url(&self) -> &str {
        &self.url
    }

    fn query(&self, filter: &Filter) -> Result<Vec<Event>, RelayError> {
        self.run(query_exchange(&self.url, filter))
    }

    fn publish(&self, event: &Event) -> Result<PublishStatus, RelayError> {
        self.run(publish_exchange(&self.url, event))
    }
}

async fn query_exchange(url: &str, filter: &Filter) -> Result<Vec<Event>, RelayError> {
    let (mut ws, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| RelayError::Connect(e.to_string()))?;

    let sub = hex::encode(rand::random::<[u8; 8]>());
    ws.send(client_message(&("REQ", &sub, filter))?)
        .await
        .map_err(|e| RelayError::Protocol(e.to_string()))?;

    let mut events = Vec::new();
    let mut closed_by_relay = None;
    while let Some(frame) = ws.next().await {
        let frame = frame.map_err(|e| RelayError::Protocol(e.to_string()))?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Tungstenite answers pings itself
            _ => continue,
        };
        match RelayMessage::parse(text.as_str()) {
            Ok(RelayMessage::Event {
                subscription_id,
                event,
            }) if subscription_id == sub => events.push(*event),
            Ok(RelayMessage::Eose(id)) if id == sub => break,
            Ok(RelayMessage::Closed {
                subscription_id,
                message,
            }) if subscription_id == sub => {
                closed_by_relay = Some(message);
                break;
            }
            Ok(RelayMessage::Notice(notice)) => log::debug!("Relay {}: NOTICE {}", url, notice),
            Ok(_) => {}
            Err(e) => log::debug!("Relay {}: skipping message ({})", url, e),
        }
    }

    if let Some(message) = closed_by_relay {
        let _ = ws.close(None).await;
        return Err(RelayError::Closed(message));
    }

    let _ = ws.send(client_message(&("CLOSE", &sub))?).await;
    let _ = ws.close(None).await;
    Ok(events)
}

async fn publish_exchange(url: &str, event: &Event) -> Result<PublishStatus, RelayError> {
    let (mut ws, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| RelayError::Connect(e.to_string()))?;

    ws.send(client_message(&("EVENT", event))?)
        .await
        .map_err(|e| RelayError::Protocol(e.to_string()))?;

    let mut status = None;
    while let Some(frame) = ws.next().await {
        let frame = frame.map_err(|e| RelayError::Protocol(e.to_string()))?;
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match RelayMessage::parse(text.as_str()) {
            Ok(RelayMessage::Ok {
                event_id,
                accepted,
                message,
            }) if event_id == event.id => {
                status = Some(if accepted {
                    PublishStatus::Accepted
                } else {
                    PublishStatus::Rejected(message)
                });
                break;
            }
            Ok(RelayMessage::Notice(notice)) => log::debug!("Relay {}: NOTICE {}", url, notice),
            Ok(_) => {}
            Err(e) => log::debug!("Relay {}: skipping message ({})", url, e),
        }
    }

    let _ = ws.close(None).await;
    status.ok_or(RelayError::Disconnected)
}
