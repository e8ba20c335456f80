use super::{load_config, poster, runtime, ServerArgs};
use crate::output::{print_json, print_table};
use anyhow::Context;
use playbooks_core::host::{Channel, ChannelType};
use playbooks_core::navigation::Navigator;
use playbooks_core::poster::NavigationOutcome;
use playbooks_core::route::RouteMatch;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct Visit {
    path: String,
    channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<RouteMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<NavigationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Parse `ID` or `ID:TYPE`.
fn parse_channel(arg: &str) -> anyhow::Result<Channel> {
    let (id, channel_type) = match arg.split_once(':') {
        Some((id, code)) => (id, code.parse::<ChannelType>()?),
        None => (arg, ChannelType::Open),
    };
    if id.is_empty() {
        anyhow::bail!("empty channel id in '{arg}'");
    }
    Ok(Channel::new(id, channel_type))
}

/// The host route for viewing `channel` in `team`.
pub fn channel_path(team: &str, channel: &Channel) -> String {
    let kind = match channel.channel_type {
        ChannelType::Direct | ChannelType::Group => "messages",
        ChannelType::Open | ChannelType::Private => "channels",
    };
    format!("/{team}/{kind}/{}", channel.id)
}

pub fn run(
    root: &Path,
    server: &ServerArgs,
    team: &str,
    channels: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let channels = channels
        .iter()
        .map(|arg| parse_channel(arg).with_context(|| format!("invalid channel '{arg}'")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = load_config(root, server)?;
    let route = config.automation.channel_route()?;
    let nav = Navigator::new();
    let session = poster(root, &config, nav.subscribe())?;
    let rt = runtime()?;

    let mut visits = Vec::new();
    for channel in channels {
        let path = channel_path(team, &channel);
        let channel_id = channel.id.clone();
        let matched = route.parse(&path);
        nav.navigate(path.clone(), Some(channel));
        let (outcome, error) = match rt.block_on(session.on_navigate()) {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(e.to_string())),
        };
        visits.push(Visit {
            path,
            channel_id,
            route: matched,
            outcome,
            error,
        });
    }

    let failures = visits.iter().filter(|v| v.error.is_some()).count();
    if json {
        print_json(&visits)?;
    } else {
        let rows = visits
            .iter()
            .map(|v| {
                vec![
                    v.channel_id.clone(),
                    v.path.clone(),
                    v.route
                        .as_ref()
                        .and_then(|r| r.team.clone())
                        .unwrap_or_else(|| "-".to_string()),
                    match (&v.outcome, &v.error) {
                        (Some(outcome), _) => outcome.as_str().to_string(),
                        (None, Some(e)) => format!("error: {e}"),
                        (None, None) => String::new(),
                    },
                ]
            })
            .collect();
        print_table(&["CHANNEL", "PATH", "TEAM", "OUTCOME"], rows);
    }

    if failures > 0 {
        anyhow::bail!("{failures} navigation(s) failed");
    }
    Ok(())
}
