//! First-success retrieval across redundant relays.

use super::relay::Endpoint;
use crate::nostr::{Event, Filter, KIND_METADATA, KIND_TEXT_NOTE};

/// How to pick the author's profile when relays may disagree on the latest one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfileStrategy {
    /// First relay (in priority order) holding any metadata record wins
    #[default]
    FirstFound,
    /// Ask every relay and keep the record with the newest `created_at`
    MostRecent,
}

pub struct SourceRetriever<'a, E: Endpoint> {
    endpoints: &'a [E],
    profile_strategy: ProfileStrategy,
}

impl<'a, E: Endpoint> SourceRetriever<'a, E> {
    pub fn new(endpoints: &'a [E], profile_strategy: ProfileStrategy) -> Self {
        Self {
            endpoints,
            profile_strategy,
        }
    }

    /// Records from the first endpoint, in order, that yields at least one.
    ///
    /// Failing endpoints are skipped; records that do not match the filter or fail
    /// signature verification do not count. Empty only when every endpoint is
    /// unreachable, failing or empty.
    pub fn query(&self, filter: &Filter) -> Vec<Event> {
        for endpoint in self.endpoints {
            let events = self.query_one(endpoint, filter);
            if !events.is_empty() {
                return events;
            }
        }
        Vec::new()
    }

    pub fn find_note(&self, id: &str) -> Option<Event> {
        let filter = Filter::new().kind(KIND_TEXT_NOTE).id(id).limit(1);
        self.query(&filter).into_iter().next()
    }

    pub fn find_profile(&self, pubkey: &str) -> Option<Event> {
        let filter = Filter::new().kind(KIND_METADATA).author(pubkey);
        match self.profile_strategy {
            ProfileStrategy::FirstFound => self.query(&filter).into_iter().next(),
            ProfileStrategy::MostRecent => self
                .endpoints
                .iter()
                .flat_map(|endpoint| self.query_one(endpoint, &filter))
                .max_by_key(|event| event.created_at),
        }
    }

    fn query_one(&self, endpoint: &E, filter: &Filter) -> Vec<Event> {
        match endpoint.query(filter) {
            Ok(events) => {
                let total = events.len();
                let valid: Vec<Event> = events
                    .into_iter()
                    .filter(|event| filter.matches(event) && event.verify())
                    .collect();
                if valid.len() < total {
                    log::warn!(
                        "Relay {}: dropped {} invalid record(s)",
                        endpoint.url(),
                        total - valid.len()
                    );
                }
                valid
            }
            Err(e) => {
                log::debug!("Relay {}: query failed: {}", endpoint.url(), e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::network::relay::{PublishStatus, RelayError};
    use crate::nostr::Keys;

    /// Scripted endpoint for retrieval and publish tests
    pub(crate) struct FakeEndpoint {
        pub url: String,
        pub events: Option<Vec<Event>>,
        pub accepts: Option<bool>,
        pub calls: Cell<usize>,
    }

    impl FakeEndpoint {
        pub fn holding(url: &str, events: Vec<Event>) -> Self {
            Self {
                url: url.to_string(),
                events: Some(events),
                accepts: Some(true),
                calls: Cell::new(0),
            }
        }

        pub fn unreachable(url: &str) -> Self {
            Self {
                url: url.to_string(),
                events: None,
                accepts: None,
                calls: Cell::new(0),
            }
        }

        pub fn rejecting(url: &str) -> Self {
            Self {
                accepts: Some(false),
                ..Self::holding(url, vec![])
            }
        }
    }

    impl Endpoint for FakeEndpoint {
        fn url(&self) -> &str {
            &self.url
        }

        fn query(&self, filter: &Filter) -> Result<Vec<Event>, RelayError> {
            self.calls.set(self.calls.get() + 1);
            match &self.events {
                Some(events) => Ok(events.iter().filter(|e| filter.matches(e)).cloned().collect()),
                None => Err(RelayError::Connect("refused".to_string())),
            }
        }

        fn publish(&self, _event: &Event) -> Result<PublishStatus, RelayError> {
            self.calls.set(self.calls.get() + 1);
            match self.accepts {
                Some(true) => Ok(PublishStatus::Accepted),
                Some(false) => Ok(PublishStatus::Rejected("blocked".to_string())),
                None => Err(RelayError::Connect("refused".to_string())),
            }
        }
    }

    fn note(keys: &Keys, content: &str) -> Event {
        Event::sign(keys, 1_700_000_000, KIND_TEXT_NOTE, vec![], content).unwrap()
    }

    fn profile(keys: &Keys, created_at: i64, name: &str) -> Event {
        let content = format!(r#"{{"name":"{}"}}"#, name);
        Event::sign(keys, created_at, KIND_METADATA, vec![], content).unwrap()
    }

    #[test]
    fn test_first_non_empty_endpoint_wins() {
        let keys = Keys::generate();
        let target = note(&keys, "quoted");
        let endpoints = vec![
            FakeEndpoint::holding("a", vec![]),
            FakeEndpoint::holding("b", vec![target.clone()]),
            FakeEndpoint::unreachable("c"),
        ];
        let retriever = SourceRetriever::new(&endpoints, ProfileStrategy::FirstFound);

        assert_eq!(retriever.find_note(&target.id), Some(target));
        assert_eq!(endpoints[0].calls.get(), 1);
        assert_eq!(endpoints[1].calls.get(), 1);
        // Short-circuits before the third endpoint
        assert_eq!(endpoints[2].calls.get(), 0);
    }

    #[test]
    fn test_skips_failing_endpoints() {
        let keys = Keys::generate();
        let target = note(&keys, "quoted");
        let endpoints = vec![
            FakeEndpoint::unreachable("a"),
            FakeEndpoint::unreachable("b"),
            FakeEndpoint::holding("c", vec![target.clone()]),
        ];
        let retriever = SourceRetriever::new(&endpoints, ProfileStrategy::FirstFound);
        assert_eq!(retriever.find_note(&target.id), Some(target));
    }

    #[test]
    fn test_empty_when_all_exhausted() {
        let endpoints = vec![
            FakeEndpoint::holding("a", vec![]),
            FakeEndpoint::unreachable("b"),
        ];
        let retriever = SourceRetriever::new(&endpoints, ProfileStrategy::FirstFound);
        assert!(retriever.query(&Filter::new().kind(KIND_TEXT_NOTE)).is_empty());
        assert!(retriever.find_note(&"00".repeat(32)).is_none());
    }

    #[test]
    fn test_forged_records_do_not_count() {
        let keys = Keys::generate();
        let genuine = note(&keys, "quoted");
        let mut forged = genuine.clone();
        forged.content = "tampered".to_string();

        let endpoints = vec![
            FakeEndpoint::holding("a", vec![forged]),
            FakeEndpoint::holding("b", vec![genuine.clone()]),
        ];
        let retriever = SourceRetriever::new(&endpoints, ProfileStrategy::FirstFound);
        assert_eq!(retriever.find_note(&genuine.id), Some(genuine));
    }

    #[test]
    fn test_profile_strategies() {
        let keys = Keys::generate();
        let old = profile(&keys, 100, "old");
        let new = profile(&keys, 200, "new");
        let endpoints = vec![
            FakeEndpoint::holding("a", vec![old.clone()]),
            FakeEndpoint::unreachable("b"),
            FakeEndpoint::holding("c", vec![new.clone()]),
        ];
        let pubkey = keys.public_key_hex();

        let first = SourceRetriever::new(&endpoints, ProfileStrategy::FirstFound);
        assert_eq!(first.find_profile(&pubkey), Some(old));

        let recent = SourceRetriever::new(&endpoints, ProfileStrategy::MostRecent);
        assert_eq!(recent.find_profile(&pubkey), Some(new));
    }
}
