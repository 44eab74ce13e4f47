//! Request handling: from a note id or a streamed trigger event to a posted card.

use std::io::BufRead;

use crate::config::Config;
use crate::error::{QuoteError, Result};
use crate::network::{Endpoint, ReplyPublisher, SourceRetriever, Uploader};
use crate::nostr::{Event, Keys, Profile, KIND_TEXT_NOTE};
use crate::render::{Card, Render};

pub struct QuoteBot<E: Endpoint, R: Render, U: Uploader> {
    config: Config,
    endpoints: Vec<E>,
    renderer: R,
    uploader: U,
}

impl<E: Endpoint, R: Render, U: Uploader> QuoteBot<E, R, U> {
    pub fn new(config: Config, endpoints: Vec<E>, renderer: R, uploader: U) -> Self {
        Self {
            config,
            endpoints,
            renderer,
            uploader,
        }
    }

    fn retriever(&self) -> SourceRetriever<'_, E> {
        SourceRetriever::new(&self.endpoints, self.config.profile_strategy)
    }

    /// Look up the note and its author, then describe the card to draw
    pub fn card_for(&self, note_id: &str) -> Result<Card> {
        let retriever = self.retriever();

        let note = retriever
            .find_note(note_id)
            .ok_or_else(|| QuoteError::NoteNotFound(note_id.to_string()))?;
        let metadata = retriever
            .find_profile(&note.pubkey)
            .ok_or_else(|| QuoteError::AuthorNotFound(note.pubkey.clone()))?;
        let profile = Profile::parse(&metadata.content)?;

        Ok(Card {
            body: note.content,
            attribution: profile.attribution(),
            portrait: profile.portrait().map(str::to_string),
        })
    }

    /// Render and host a card for `note_id`; returns the image reference
    pub fn generate(&mut self, note_id: &str) -> Result<String> {
        let card = self.card_for(note_id)?;
        let png = self.renderer.render(&card)?;
        log::debug!("Rendered {} ({} bytes)", note_id, png.len());

        let reference = self.uploader.store(&png)?;
        Ok(format!("{}{}", reference, self.config.image_suffix))
    }

    /// Process one stdin line from the event stream.
    ///
    /// Returns the posted reply, or `None` when the line is not a request for us.
    pub fn handle_line(&mut self, keys: &Keys, line: &str) -> Result<Option<Event>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let event: Event =
            serde_json::from_str(line).map_err(|e| QuoteError::InvalidLine(e.to_string()))?;
        if event.kind != KIND_TEXT_NOTE
            || !event.content.contains(&self.config.trigger)
            || event.pubkey == keys.public_key_hex()
        {
            return Ok(None);
        }
        log::info!("Request {} from {}", event.id, event.pubkey);

        // Only trust what a relay says the request event contains
        let request = self
            .retriever()
            .find_note(&event.id)
            .ok_or_else(|| QuoteError::NoteNotFound(event.id.clone()))?;
        let parent = request
            .last_tag_value("e")
            .ok_or_else(|| QuoteError::NoParent(request.id.clone()))?
            .to_string();

        let image = self.generate(&parent)?;
        let reply = ReplyPublisher::new(keys, &self.endpoints).publish(&request.id, &image)?;
        Ok(Some(reply))
    }

    /// Run `handle_line` over every line of `reader` until EOF.
    ///
    /// Lines that are not UTF-8 or not events are skipped; per-request failures
    /// are logged. Only a read error stops the loop. Returns the number of replies.
    pub fn stream<B: BufRead>(&mut self, keys: &Keys, mut reader: B) -> std::io::Result<usize> {
        let mut buf = Vec::new();
        let mut replies = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(replies);
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    log::debug!("Skipping line: {}", e);
                    continue;
                }
            };
            match self.handle_line(keys, line) {
                Ok(Some(reply)) => {
                    log::info!("Replied {} -> {}", reply.id, reply.content);
                    replies += 1;
                }
                Ok(None) => {}
                Err(QuoteError::InvalidLine(e)) => log::debug!("Skipping line: {}", e),
                Err(e) => log::error!("{}", e),
            }
        }
    }
}
