//! Terminal client for the weiqi engine server. Connects over a websocket,
//! sets up one game and lets you play it by typing coordinates.

mod board_view;
mod channel;
mod config;
mod game_loop;
mod input;
mod thinking;

#[macro_use]
extern crate log;
extern crate simplelog;

use anyhow::Context;
use clap::Parser;
use std::fs::File;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = config::Args::parse();
    init_logger()?;

    let client_config = config::load_config(&args);
    let session_config = client_config
        .session_config(&args)
        .context("Invalid game settings")?;
    let url = client_config.socket_url(&args);

    info!(
        "Starting a {0}x{0} game, {1}, komi {2}, human plays {3}.",
        session_config.lines(),
        session_config.mode().wire_name(),
        session_config.komi(),
        session_config.human_color()
    );
    game_loop::run(session_config, &url).await
}

fn init_logger() -> anyhow::Result<()> {
    use simplelog::*;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            File::create("client.log").context("Could not create client.log")?,
        ),
    ])
    .context("Could not set up logging")?;

    debug!("Logger successfully initialized");
    Ok(())
}
