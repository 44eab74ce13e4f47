use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;

use makeitquote::config::{self, Cli, Config, BACKGROUND_PNG, SIGNING_KEY_ENV};
use makeitquote::network::VoidCatUploader;
use makeitquote::nostr::{nip19, Keys};
use makeitquote::render::CardRenderer;
use makeitquote::QuoteBot;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", makeitquote::VERSION);
        return ExitCode::SUCCESS;
    }

    makeitquote::init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let base_dir = config::base_dir().context("cannot locate executable directory")?;
    let config = Config::from_cli(&cli, &base_dir);

    // Stream mode cannot do anything useful without a signing key
    let keys = match cli.note {
        Some(_) => None,
        None => {
            let secret = std::env::var(SIGNING_KEY_ENV)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| anyhow!("{} is not set", SIGNING_KEY_ENV))?;
            let keys = Keys::parse(secret.trim()).context("invalid signing key")?;
            log::info!("Replying as {}", keys.public_key_hex());
            Some(keys)
        }
    };

    let renderer = CardRenderer::from_paths(
        BACKGROUND_PNG,
        &config.font,
        &config.emoji_dir,
        config.timeout,
        config.zone.clone(),
    )?;
    let endpoints = config.endpoints();
    let uploader = VoidCatUploader::new(config.timeout);
    log::info!(
        "makeitquote {} ({}), {} relays",
        makeitquote::VERSION,
        makeitquote::REVISION,
        endpoints.len()
    );
    let mut bot = QuoteBot::new(config, endpoints, renderer, uploader);

    match (cli.note, keys) {
        (Some(note), _) => {
            let id = nip19::parse_event_id(&note)?;
            let image = bot.generate(&id)?;
            println!("{} {}", id, image);
            Ok(())
        }
        (None, Some(keys)) => {
            let replies = bot
                .stream(&keys, std::io::stdin().lock())
                .context("reading stdin")?;
            log::info!("Input closed after {} replies", replies);
            Ok(())
        }
        (None, None) => Err(anyhow!("{} is not set", SIGNING_KEY_ENV)),
    }
}
