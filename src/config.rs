//! Command line and runtime configuration
//!
//! Everything is resolved once at startup into an immutable `Config`. Asset paths
//! default to locations next to the executable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use clap::Parser;

use crate::network::{ProfileStrategy, Relay};
use crate::render::card::Zone;

pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay-jp.nostr.wirednet.jp",
    "wss://nostr-relay.nokotaro.com/",
    "wss://nostr.h3z.jp/",
    "wss://nostr.wine/",
    "wss://relay.nostr.band",
    "wss://relay.snort.social",
    "wss://relay.damus.io",
    "wss://relay.nostrich.land/",
];

/// Card template, transparent where the portrait shows through
pub const BACKGROUND_PNG: &[u8] = include_bytes!("../assets/background.png");

/// Secret key (nsec or hex) used to sign replies in stream mode
pub const SIGNING_KEY_ENV: &str = "MAKEITQUOTE_NSEC";

pub const DEFAULT_TRIGGER: &str = "#makeitquote";
pub const DEFAULT_FONT: &str = "Koruri-Regular.ttf";
pub const DEFAULT_EMOJI_DIR: &str = "png";
/// Appended to the upload reference so clients render it inline
pub const IMAGE_SUFFIX: &str = ".png";

const ZONE_OFFSET_SECS: i32 = 9 * 3600;
const ZONE_LABEL: &str = "JST";

/// Render Nostr notes as quote cards.
///
/// With a note id, render that note and print "<id> <image url>". Without one,
/// read relay events from stdin, one JSON object per line, and reply with a card
/// to every note that contains the trigger.
#[derive(Parser, Debug)]
#[command(name = "makeitquote", disable_version_flag = true)]
pub struct Cli {
    /// Note to render: hex id, note1... or nevent1...
    pub note: Option<String>,

    /// Directory of emoji_u<hex>.png assets
    #[arg(short = 'd', long = "emoji-dir")]
    pub emoji_dir: Option<PathBuf>,

    /// Font file used for all text
    #[arg(short = 'f', long = "font")]
    pub font: Option<PathBuf>,

    /// Print version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Relay URL; repeat to use several (replaces the built-in list)
    #[arg(long = "relay")]
    pub relays: Vec<String>,

    /// Per-relay and per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// How to pick among several profile records
    #[arg(long, value_enum, default_value_t = ProfileStrategy::FirstFound)]
    pub profile_strategy: ProfileStrategy,

    /// Substring that makes a streamed note a request
    #[arg(long, default_value = DEFAULT_TRIGGER)]
    pub trigger: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub relays: Vec<String>,
    pub font: PathBuf,
    pub emoji_dir: PathBuf,
    pub timeout: Duration,
    pub profile_strategy: ProfileStrategy,
    pub trigger: String,
    pub image_suffix: String,
    pub zone: Zone,
}

impl Config {
    pub fn from_cli(cli: &Cli, base_dir: &Path) -> Self {
        let relays = if cli.relays.is_empty() {
            DEFAULT_RELAYS.iter().map(|s| s.to_string()).collect()
        } else {
            cli.relays.clone()
        };

        Self {
            relays,
            font: cli
                .font
                .clone()
                .unwrap_or_else(|| base_dir.join(DEFAULT_FONT)),
            emoji_dir: cli
                .emoji_dir
                .clone()
                .unwrap_or_else(|| base_dir.join(DEFAULT_EMOJI_DIR)),
            timeout: Duration::from_secs(cli.timeout.max(1)),
            profile_strategy: cli.profile_strategy,
            trigger: cli.trigger.clone(),
            image_suffix: IMAGE_SUFFIX.to_string(),
            zone: default_zone(),
        }
    }

    pub fn endpoints(&self) -> Vec<Relay> {
        self.relays
            .iter()
            .map(|url| Relay::new(url.clone(), self.timeout))
            .collect()
    }
}

pub fn default_zone() -> Zone {
    Zone {
        offset: FixedOffset::east_opt(ZONE_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
        label: ZONE_LABEL.to_string(),
    }
}

/// Directory holding the running executable
pub fn base_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
