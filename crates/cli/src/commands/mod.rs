//! Subcommand implementations

pub mod auto;
pub mod campaigns;
pub mod dial;
pub mod init_config;
pub mod queue;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dialer_core::{DialerConfig, DialerConsole, OperatorIdentity};
use tracing::{info, warn};
use url::Url;

use crate::cli::{Credentials, Selection};

/// Options shared by every subcommand
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub base_url: Option<Url>,
}

/// `<user config dir>/dialer/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dialer").join("config.toml"))
}

pub fn load_config(options: &GlobalOptions) -> Result<DialerConfig> {
    let path = options
        .config
        .clone()
        .or_else(|| default_config_path().filter(|path| path.exists()));

    let mut config = DialerConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "failed to load configuration from the environment".to_string(),
    })?;
    if let Some(base_url) = &options.base_url {
        config.base_url = base_url.clone();
        config.validate()?;
    }
    Ok(config)
}

/// A logged-in console with the most urgent campaign already selected
pub struct OperatorSession {
    pub console: DialerConsole,
    pub operator: OperatorIdentity,
}

impl OperatorSession {
    pub async fn open(config: DialerConfig, credentials: &Credentials) -> Result<Self> {
        let console = DialerConsole::connect(config)?;
        let session = console.session().context("console has no session")?;
        let operator = session
            .login(&credentials.username, &credentials.password)
            .await
            .context("login failed")?;
        info!(
            "Logged in as {} ({})",
            operator.username.as_deref().unwrap_or(&credentials.username),
            if operator.is_admin() { "admin" } else { "operator" }
        );

        console.navigator().load_active_campaigns(&operator).await?;
        Ok(Self { console, operator })
    }

    /// Switch to the campaign and list the operator asked for
    pub async fn select(&self, selection: &Selection) -> Result<()> {
        if let Some(id) = selection.campaign {
            let campaign = self
                .console
                .snapshot()
                .campaigns
                .into_iter()
                .find(|campaign| campaign.id == id)
                .with_context(|| format!("campaign {} is not among your active campaigns", id))?;
            self.console.navigator().select_campaign(campaign).await?;
        }
        if let Some(id) = selection.list {
            let list = self
                .console
                .snapshot()
                .lists
                .into_iter()
                .find(|list| list.id == id)
                .with_context(|| format!("list {} is not an active list of the selected campaign", id))?;
            self.console.navigator().select_list(list).await?;
        }
        Ok(())
    }

    pub async fn close(self) {
        self.console.leave();
        if let Some(session) = self.console.session() {
            if let Err(e) = session.logout().await {
                warn!("Logout failed: {}", e);
            }
        }
    }
}
