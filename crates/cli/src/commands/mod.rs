//! Subcommand implementations.

pub mod budget;
pub mod doctor;
pub mod propose;
pub mod register;
pub mod status;

use ctrldot_client::CtrlDotClient;
use ctrldot_config::GuardConfig;

/// Global `--url` / `--token` flags.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Load the guard configuration and apply command-line overrides.
pub fn load_config(overrides: &Overrides) -> Result<GuardConfig, Box<dyn std::error::Error>> {
    let config = GuardConfig::load()
        .map_err(|e| format!("Failed to load config: {e}"))?
        .with_overrides(overrides.url.clone(), overrides.token.clone());
    config.validate()?;
    tracing::debug!(config = ?config, "Resolved configuration");
    Ok(config)
}

/// Build a client from the resolved configuration.
pub fn client(config: &GuardConfig) -> Result<CtrlDotClient, Box<dyn std::error::Error>> {
    Ok(CtrlDotClient::from_config(config)?)
}
