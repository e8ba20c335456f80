use super::{load_config, poster, runtime, ServerArgs};
use crate::output::print_json;
use anyhow::Context;
use playbooks_core::host::{Channel, ChannelType};
use playbooks_core::navigation::{Location, Navigator};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Parse one navigation line: `<path> [<channel_id> [<type>]]`.
///
/// Blank lines and `#` comments yield `None`.
fn parse_line(line: &str) -> anyhow::Result<Option<Location>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut fields = line.split_whitespace();
    let path = fields.next().unwrap_or_default();
    let channel = match (fields.next(), fields.next()) {
        (None, _) => None,
        (Some(id), None) => Some(Channel::new(id, ChannelType::Open)),
        (Some(id), Some(code)) => Some(Channel::new(id, code.parse::<ChannelType>()?)),
    };
    if let Some(extra) = fields.next() {
        anyhow::bail!("unexpected field '{extra}'");
    }
    Ok(Some(Location::new(path, channel)))
}

/// Publish every navigation read from stdin. Dropping `nav` at EOF closes
/// the subscription the poster listens on.
async fn feed(nav: Navigator) -> anyhow::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_line(&line) {
            Ok(Some(Location { path, channel })) => {
                match channel {
                    Some(channel) => nav.navigate(path, Some(channel)),
                    None => nav.leave(path),
                }
                count += 1;
                // Let the listener observe this location before the next one.
                tokio::task::yield_now().await;
            }
            Ok(None) => {}
            Err(e) => warn!("skipping navigation line {line:?}: {e:#}"),
        }
    }
    Ok(count)
}

pub fn run(root: &Path, server: &ServerArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(root, server)?;
    let nav = Navigator::new();
    let changes = nav.subscribe();
    let session = poster(root, &config, nav.subscribe())?;
    let rt = runtime()?;

    info!(server = %config.server.url, "watching navigations on stdin");
    let (read, summary) = rt.block_on(async { tokio::join!(feed(nav), session.listen(changes)) });
    let lines = read?;
    info!(lines, "stdin closed");

    if json {
        print_json(&summary)
    } else {
        println!(
            "navigations: {}, sent: {}, failures: {}, channels evaluated: {}",
            summary.navigations, summary.sent, summary.failures, summary.channels_evaluated
        );
        Ok(())
    }
}
