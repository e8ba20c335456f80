pub mod actions;
pub mod config;
pub mod equal;
pub mod init;
pub mod match_cmd;
pub mod viewed;
pub mod visit;
pub mod watch;

use anyhow::Context;
use playbooks_core::action::{ActionPayload, ChannelAction};
use playbooks_core::client::HttpActionsClient;
use playbooks_core::config::Config;
use playbooks_core::host::NavigationState;
use playbooks_core::poster::WelcomeMessagePoster;
use playbooks_core::viewed::ViewedDb;
use playbooks_core::{paths, PlaybooksError};
use std::path::Path;

/// Server settings given on the command line or through the environment.
pub struct ServerArgs {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// Load `.playbooks/config.yaml` (or defaults when the project is not
/// initialized) and apply command-line overrides.
pub fn load_config(root: &Path, server: &ServerArgs) -> anyhow::Result<Config> {
    let mut config = match Config::load(root) {
        Ok(config) => config,
        Err(PlaybooksError::NotInitialized) => Config::default(),
        Err(e) => return Err(e).context("failed to load config"),
    };
    if let Some(url) = &server.url {
        config.server.url = url.clone();
    }
    if let Some(token) = &server.token {
        config.server.token = Some(token.clone());
    }
    Ok(config)
}

/// Read a YAML list of channel actions.
pub fn load_rules(path: &Path) -> anyhow::Result<Vec<ChannelAction>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&data).with_context(|| format!("invalid rules in {}", path.display()))
}

pub type Poster<N> = WelcomeMessagePoster<N, HttpActionsClient, ViewedDb>;

/// Build a poster session over `navigation` wired to the configured server
/// and the project's viewed database.
pub fn poster<N: NavigationState>(
    root: &Path,
    config: &Config,
    navigation: N,
) -> anyhow::Result<Poster<N>> {
    let route = config
        .automation
        .channel_route()
        .context("invalid automation.extra_route_patterns")?;
    let client =
        HttpActionsClient::from_config(&config.server).context("failed to build HTTP client")?;
    let viewed = ViewedDb::open(&paths::viewed_db_path(root))
        .context("failed to open viewed database")?;
    Ok(WelcomeMessagePoster::new(navigation, client, viewed)
        .with_route(route)
        .with_policy(config.automation.revisit_policy))
}

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}

pub const ACTION_HEADERS: &[&str] = &["#", "ID", "ACTION", "TRIGGER", "ENABLED", "DETAIL"];

pub fn action_row(index: usize, action: &ChannelAction) -> Vec<String> {
    let detail = match &action.payload {
        ActionPayload::WelcomeMessage { message } => truncate(message, 48),
        ActionPayload::PromptRunPlaybook {
            keywords,
            playbook_id,
        } => format!("[{}] -> {playbook_id}", keywords.join(", ")),
    };
    vec![
        index.to_string(),
        action.id.clone().unwrap_or_else(|| "-".to_string()),
        action.action_type().to_string(),
        action.trigger_type.to_string(),
        if action.enabled { "yes" } else { "no" }.to_string(),
        detail,
    ]
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_first_line() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello\n", 10), "hello");
        assert_eq!(truncate("hello\nworld", 10), "hello...");
        assert_eq!(truncate("abcdefghijkl", 4), "abcd...");
    }

    #[test]
    fn prompt_row_shows_keywords_and_playbook() {
        let action = ChannelAction::prompt_run_playbook("C1", ["sev1", "outage"], "P1");
        let row = action_row(0, &action);
        assert_eq!(row[1], "-");
        assert_eq!(row[3], "keywords");
        assert_eq!(row[5], "[sev1, outage] -> P1");
    }
}
