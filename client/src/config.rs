//! This module is in charge of defining the configuration format with types
//! and reading the configuration.
//!
//! Every value can come from the command line or from the config file. The
//! command line wins, and whatever neither of them sets falls back to the
//! defaults of `SessionConfig`.

use clap::Parser;
use serde::Deserialize;
use std::{fs, path::PathBuf};

use weiqi::channel::{resolve_socket_url, PageOrigin};
use weiqi::config::{DEFAULT_KOMI, DEFAULT_THINK_SECONDS};
use weiqi::{Color, ConfigError, PlayMode, SessionConfig};

/// Loaded when `--config` is not given. It is fine for it to be missing.
pub const DEFAULT_CONFIG_FILE: &str = "client-config.toml";

/// Play Go against an engine server from the terminal.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct Args {
    /// Path to a toml config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// WebSocket url of the engine server, e.g. ws://localhost:8080
    #[arg(long)]
    pub url: Option<String>,
    /// Board size: 9, 13 or 19.
    #[arg(long)]
    pub size: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub komi: Option<f64>,
    /// Your color, B or W.
    #[arg(long)]
    pub color: Option<String>,
    /// One of human-ai, ai-ai, human-human.
    #[arg(long)]
    pub mode: Option<String>,
    /// Seconds the engine may think per move, 1 to 10.
    #[arg(long)]
    pub ai_time: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Overrides the url derived from `origin`.
    pub socket_url: Option<String>,
    /// Origin of the engine server's web page, e.g. `https://go.example.org`.
    pub origin: String,
    pub board_size: Option<i64>,
    pub komi: Option<f64>,
    pub mode: Option<String>,
    pub human_color: Option<String>,
    pub ai_time: Option<i64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            socket_url: None,
            origin: "http://localhost:8080".to_string(),
            board_size: None,
            komi: None,
            mode: None,
            human_color: None,
            ai_time: None,
        }
    }
}

impl ClientConfig {
    /// Combines the command line with this file into the config of one game.
    pub fn session_config(&self, args: &Args) -> Result<SessionConfig, ConfigError> {
        let mode = match args.mode.as_ref().or(self.mode.as_ref()) {
            Some(name) => PlayMode::from_wire_name(name)?,
            None => PlayMode::default(),
        };
        let human_color = match args.color.as_ref().or(self.human_color.as_ref()) {
            Some(initial) => Color::from_initial(initial)
                .ok_or_else(|| ConfigError::UnknownColor(initial.clone()))?,
            None => Color::Black,
        };
        SessionConfig::new(
            args.size.or(self.board_size).unwrap_or(19),
            args.komi.or(self.komi).unwrap_or(DEFAULT_KOMI),
            mode,
            human_color,
            args.ai_time
                .or(self.ai_time)
                .unwrap_or(DEFAULT_THINK_SECONDS as i64),
        )
    }

    pub fn socket_url(&self, args: &Args) -> String {
        resolve_socket_url(
            args.url.as_deref(),
            self.socket_url.as_deref(),
            &PageOrigin::parse(&self.origin),
        )
    }
}

/// Loads the config file named on the command line, or the default file if
/// there is one. Exits the process if the file can't be used.
pub fn load_config(args: &Args) -> ClientConfig {
    match load_config_inner(args) {
        Ok(config) => config,
        Err(err) => {
            // With the immediate exit, we can't use error!() here.
            println!("Error loading config: {err}");
            std::process::exit(1);
        }
    }
}

/// Inner method to unify error handling
fn load_config_inner(args: &Args) -> Result<ClientConfig, String> {
    let config_filename = match &args.config {
        Some(path) => path.clone(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(ClientConfig::default());
            }
            default
        }
    };

    let config_file = fs::read_to_string(&config_filename).map_err(|_| {
        format!(
            "Could not read config file at path: {}",
            config_filename.display()
        )
    })?;

    info!("Loaded config file: {}", config_filename.display());

    parse_config(&config_file).map_err(|e| {
        format!(
            "Could not parse config file at path: {}\nCaused by: {:?}",
            config_filename.display(),
            e
        )
    })
}

fn parse_config(text: &str) -> Result<ClientConfig, toml::de::Error> {
    toml::from_str(text)
}
