//! Signed record model (NIP-01).
//!
//! An event id is the SHA-256 of the compact JSON array
//! `[0, pubkey, created_at, kind, tags, content]`; the signature is a BIP-340 Schnorr
//! signature over those 32 bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::keys::{self, Keys};
use crate::error::{QuoteError, Result};

/// Profile metadata (JSON document in `content`)
pub const KIND_METADATA: u32 = 0;
/// Plain text note
pub const KIND_TEXT_NOTE: u32 = 1;

/// One tag: a name followed by positional values, e.g. `["e", <id>, <relay>, "reply"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// Reply marker pointing at another event (NIP-10 marked form)
    pub fn reply_to(event_id: &str) -> Self {
        Tag(vec![
            "e".to_string(),
            event_id.to_string(),
            String::new(),
            "reply".to_string(),
        ])
    }

    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub content: String,
    #[serde(default)]
    pub sig: String,
}

impl Event {
    /// Build and sign a new event with `keys`
    pub fn sign(
        keys: &Keys,
        created_at: i64,
        kind: u32,
        tags: Vec<Tag>,
        content: impl Into<String>,
    ) -> Result<Self> {
        let content = content.into();
        let pubkey = keys.public_key_hex();
        let id = compute_id(&pubkey, created_at, kind, &tags, &content)?;
        let sig = keys.sign(&id)?;

        Ok(Self {
            id: hex::encode(id),
            pubkey,
            created_at,
            kind,
            tags,
            content,
            sig: hex::encode(sig),
        })
    }

    /// Parse one JSON object (a line of the ingestion stream)
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QuoteError::Encode(e.to_string()))
    }

    /// Check that `id` matches the content and `sig` is valid for `pubkey`
    pub fn verify(&self) -> bool {
        let Ok(expected) =
            compute_id(&self.pubkey, self.created_at, self.kind, &self.tags, &self.content)
        else {
            return false;
        };
        if hex::encode(expected) != self.id {
            return false;
        }
        keys::verify(&self.pubkey, &expected, &self.sig)
    }

    /// Value of the last tag named `name` (e.g. the reply target among `e` tags)
    pub fn last_tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|t| t.name() == Some(name))
            .and_then(Tag::value)
    }
}

fn compute_id(
    pubkey: &str,
    created_at: i64,
    kind: u32,
    tags: &[Tag],
    content: &str,
) -> Result<[u8; 32]> {
    let canonical = serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))
        .map_err(|e| QuoteError::Encode(e.to_string()))?;
    Ok(Sha256::digest(canonical.as_bytes()).into())
}

/// Subscription filter, sent verbatim in a `REQ`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: u32) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }

    pub fn author(mut self, pubkey: impl Into<String>) -> Self {
        self.authors.push(pubkey.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `event` satisfies every populated field (limit is ignored)
    pub fn matches(&self, event: &Event) -> bool {
        (self.ids.is_empty() || self.ids.iter().any(|id| *id == event.id))
            && (self.authors.is_empty() || self.authors.iter().any(|a| *a == event.pubkey))
            && (self.kinds.is_empty() || self.kinds.contains(&event.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> Keys {
        Keys::from_secret_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_signed_event_verifies() {
        let keys = test_keys();
        let event = Event::sign(&keys, 1_700_000_000, KIND_TEXT_NOTE, vec![], "hello").unwrap();

        assert_eq!(event.id.len(), 64);
        assert_eq!(event.sig.len(), 128);
        assert_eq!(event.pubkey, keys.public_key_hex());
        assert!(event.verify());
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let keys = test_keys();
        let mut event = Event::sign(&keys, 1_700_000_000, KIND_TEXT_NOTE, vec![], "hello").unwrap();
        event.content = "goodbye".to_string();
        assert!(!event.verify());
    }

    #[test]
    fn test_reply_tag_shape() {
        let keys = test_keys();
        let target = "ab".repeat(32);
        let event = Event::sign(
            &keys,
            1,
            KIND_TEXT_NOTE,
            vec![Tag::reply_to(&target)],
            "https://example.com/x.png",
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["tags"][0], serde_json::json!(["e", target, "", "reply"]));
        assert!(event.verify());
    }

    #[test]
    fn test_last_tag_value_picks_last_match() {
        let line = r##"{"id":"x","pubkey":"p","created_at":1,"kind":1,
            "tags":[["e","root"],["p","someone"],["e","parent","","reply"]],
            "content":"#makeitquote","sig":""}"##;
        let event = Event::from_json(line).unwrap();

        assert_eq!(event.last_tag_value("e"), Some("parent"));
        assert_eq!(event.last_tag_value("p"), Some("someone"));
        assert_eq!(event.last_tag_value("q"), None);
    }

    #[test]
    fn test_missing_tags_default_to_empty() {
        let event =
            Event::from_json(r#"{"id":"x","pubkey":"p","created_at":1,"kind":1,"content":""}"#)
                .unwrap();
        assert!(event.tags.is_empty());
        assert!(Event::from_json("not json").is_err());
    }

    #[test]
    fn test_filter_serializes_only_populated_fields() {
        let filter = Filter::new().kind(KIND_TEXT_NOTE).id("abc").limit(1);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, serde_json::json!({"ids": ["abc"], "kinds": [1], "limit": 1}));

        let filter = Filter::new().kind(KIND_METADATA).author("pk");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, serde_json::json!({"authors": ["pk"], "kinds": [0]}));
    }

    #[test]
    fn test_filter_matches() {
        let keys = test_keys();
        let event = Event::sign(&keys, 1, KIND_TEXT_NOTE, vec![], "hi").unwrap();

        assert!(Filter::new().kind(KIND_TEXT_NOTE).id(&event.id).matches(&event));
        assert!(Filter::new().author(keys.public_key_hex()).matches(&event));
        assert!(!Filter::new().kind(KIND_METADATA).matches(&event));
        assert!(!Filter::new().id("00").matches(&event));
    }
}
