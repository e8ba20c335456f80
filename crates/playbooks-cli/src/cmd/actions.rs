use super::{action_row, load_config, load_rules, runtime, ServerArgs, ACTION_HEADERS};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use playbooks_core::action::{upsert_action, ChannelAction, TriggerType, Upsert};
use playbooks_core::client::HttpActionsClient;
use playbooks_core::host::ChannelActionsApi;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ActionsSubcommand {
    /// List the actions configured for a channel
    List {
        channel: String,
        /// Only this trigger: new_member_joins or keywords (default: both)
        #[arg(long)]
        trigger: Option<TriggerType>,
    },

    /// Merge a rules file into a channel's actions on the server
    Apply {
        channel: String,
        /// YAML list of channel actions
        #[arg(long)]
        file: PathBuf,
    },
}

pub fn run(
    root: &Path,
    server: &ServerArgs,
    subcmd: ActionsSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(root, server)?;
    let client =
        HttpActionsClient::from_config(&config.server).context("failed to build HTTP client")?;
    let rt = runtime()?;

    match subcmd {
        ActionsSubcommand::List { channel, trigger } => {
            rt.block_on(list(&client, &channel, trigger, json))
        }
        ActionsSubcommand::Apply { channel, file } => {
            let rules = load_rules(&file)?;
            rt.block_on(apply(&client, &channel, rules, json))
        }
    }
}

async fn fetch_all(
    client: &HttpActionsClient,
    channel: &str,
    trigger: Option<TriggerType>,
) -> anyhow::Result<Vec<ChannelAction>> {
    let triggers = match trigger {
        Some(t) => vec![t],
        None => vec![TriggerType::NewMemberJoins, TriggerType::KeywordsPosted],
    };
    let mut actions = Vec::new();
    for t in triggers {
        let fetched = client
            .fetch_channel_actions(channel, t)
            .await
            .with_context(|| format!("failed to fetch {t} actions for {channel}"))?;
        actions.extend(fetched);
    }
    Ok(actions)
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

async fn list(
    client: &HttpActionsClient,
    channel: &str,
    trigger: Option<TriggerType>,
    json: bool,
) -> anyhow::Result<()> {
    let actions = fetch_all(client, channel, trigger).await?;
    if json {
        return print_json(&actions);
    }
    if actions.is_empty() {
        println!("No actions configured for {channel}.");
        return Ok(());
    }
    let rows = actions
        .iter()
        .enumerate()
        .map(|(i, a)| action_row(i, a))
        .collect();
    print_table(ACTION_HEADERS, rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Applied {
    change: &'static str,
    action: ChannelAction,
}

async fn apply(
    client: &HttpActionsClient,
    channel: &str,
    rules: Vec<ChannelAction>,
    json: bool,
) -> anyhow::Result<()> {
    let mut actions = fetch_all(client, channel, None).await?;
    let existing = actions.len();

    // Merge locally first so two rules for one slot produce one write.
    let mut touched = BTreeSet::new();
    for mut rule in rules {
        rule.channel_id = channel.to_string();
        let index = match upsert_action(&mut actions, rule) {
            Upsert::Replaced(i) | Upsert::Appended(i) => i,
        };
        touched.insert(index);
    }

    let mut applied = Vec::new();
    for index in touched {
        let action = &mut actions[index];
        let change = if index < existing {
            client
                .update_channel_action(action)
                .await
                .with_context(|| format!("failed to update {} action", action.action_type()))?;
            "updated"
        } else {
            let id = client
                .create_channel_action(action)
                .await
                .with_context(|| format!("failed to create {} action", action.action_type()))?;
            action.id = Some(id);
            "created"
        };
        applied.push(Applied {
            change,
            action: action.clone(),
        });
    }

    if json {
        return print_json(&applied);
    }
    if applied.is_empty() {
        println!("Nothing to apply.");
        return Ok(());
    }
    for a in &applied {
        println!(
            "{:8} {} {} ({})",
            a.change,
            a.action.action_type(),
            a.action.id.as_deref().unwrap_or("-"),
            a.action.trigger_type
        );
    }
    Ok(())
}
