//! makeitquote: renders Nostr notes as quote-card images and replies with them.
//!
//! `render` draws cards, `network` talks to relays and the image host, `nostr`
//! holds the record model, and `pipeline` ties one request together.

pub mod config;
pub mod error;
pub mod network;
pub mod nostr;
pub mod pipeline;
pub mod render;

pub use config::{Cli, Config};
pub use error::{QuoteError, Result};
pub use pipeline::QuoteBot;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Git revision of the build, "HEAD" when unknown
pub const REVISION: &str = env!("MAKEITQUOTE_REVISION");

/// Default log filter; `RUST_LOG` overrides it
pub const DEFAULT_LOG_FILTER: &str = "info,cosmic_text=warn,reqwest=warn";

/// Logs go to stderr; stdout carries only results
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .target(env_logger::Target::Stderr)
        .init();
}
