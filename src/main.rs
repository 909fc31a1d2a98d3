// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Draftly API server.
//!
//! Usage:
//!   draftly-server                          # defaults, .env and environment
//!   draftly-server --config draftly.toml    # layered file under the environment
//!   draftly-server --port 8080

use std::process::exit;

use clap::Parser;
use draftly::api::rest::{run_server, AppState};
use draftly::config::Settings;
use draftly::store::UserStore;
use env_logger::Env;
use log::{error, info};

#[derive(Parser)]
#[command(name = "draftly-server", about = "Gmail reply assistant API server")]
struct Cli {
    /// Optional configuration file (toml, yaml or json)
    #[arg(long, env = "DRAFTLY_CONFIG")]
    config: Option<String>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::new(cli.config.as_deref()).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {}", err);
        exit(1);
    });
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log.level.as_str())).init();

    let users = match UserStore::connect(&settings.database.url, settings.database.max_connections).await {
        Ok(users) => users,
        Err(e) => {
            error!("Failed to open user store: {}. Exiting.", e);
            exit(1);
        }
    };

    let state = match AppState::new(settings, users, reqwest::Client::new()) {
        Ok(state) => state,
        Err(e) => {
            error!("Reply drafting unavailable: {}. Set DEEPSEEK_API_KEY. Exiting.", e);
            exit(1);
        }
    };

    if !state.oauth.is_configured() {
        info!("Google sign-in is not configured; /auth/google will fail until GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET are set");
    }

    run_server(state).await
}
