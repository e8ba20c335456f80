use super::{action_row, load_rules, ACTION_HEADERS};
use crate::output::{print_json, print_table};
use playbooks_core::action::ChannelAction;
use playbooks_core::matcher::{match_actions, prompts_for_post, PlaybookPrompt, TriggerEvent};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct MatchReport<'a> {
    event: TriggerEvent,
    matched: Vec<MatchedRule<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    prompts: Vec<PlaybookPrompt>,
}

#[derive(Serialize)]
struct MatchedRule<'a> {
    index: usize,
    action: &'a ChannelAction,
}

pub fn run(
    file: &Path,
    join: bool,
    text: Option<&str>,
    channel: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let event = match (join, text) {
        (true, _) => TriggerEvent::NewMemberJoins,
        (false, Some(text)) => TriggerEvent::keywords_posted(text),
        (false, None) => anyhow::bail!("either --join or --text is required"),
    };

    let rules = load_rules(file)?;
    let hits = match_actions(&rules, &event);
    let matched: Vec<MatchedRule<'_>> = rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| hits.iter().any(|hit| std::ptr::eq(*hit, *rule)))
        .filter(|(_, rule)| channel.map_or(true, |c| rule.channel_id == c))
        .map(|(index, action)| MatchedRule { index, action })
        .collect();

    let prompts: Vec<PlaybookPrompt> = match &event {
        TriggerEvent::KeywordsPosted { text } => matched
            .iter()
            .flat_map(|m| {
                prompts_for_post(std::slice::from_ref(m.action), &m.action.channel_id, text)
            })
            .collect(),
        TriggerEvent::NewMemberJoins => Vec::new(),
    };

    if json {
        return print_json(&MatchReport {
            event,
            matched,
            prompts,
        });
    }

    if matched.is_empty() {
        println!("No rules match.");
        return Ok(());
    }
    let rows = matched
        .iter()
        .map(|m| action_row(m.index, m.action))
        .collect();
    print_table(ACTION_HEADERS, rows);

    if !prompts.is_empty() {
        println!();
        for prompt in &prompts {
            println!(
                "prompt: run playbook {} in {} (matched: {})",
                prompt.playbook_id,
                prompt.channel_id,
                prompt.keywords.join(", ")
            );
        }
    }
    Ok(())
}
