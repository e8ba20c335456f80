//! Trigger matching: which configured actions fire for an observed event.

use crate::action::{ActionPayload, ChannelAction, TriggerType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TriggerEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerEvent {
    NewMemberJoins,
    KeywordsPosted { text: String },
}

impl TriggerEvent {
    pub fn keywords_posted(text: impl Into<String>) -> Self {
        TriggerEvent::KeywordsPosted { text: text.into() }
    }

    pub fn trigger_type(&self) -> TriggerType {
        match self {
            TriggerEvent::NewMemberJoins => TriggerType::NewMemberJoins,
            TriggerEvent::KeywordsPosted { .. } => TriggerType::KeywordsPosted,
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Select the actions that fire for `event`, preserving input order.
///
/// Disabled actions never match. An empty keyword never matches.
pub fn match_actions<'a>(
    actions: &'a [ChannelAction],
    event: &TriggerEvent,
) -> Vec<&'a ChannelAction> {
    let lowered_text = match event {
        TriggerEvent::KeywordsPosted { text } => Some(text.to_lowercase()),
        TriggerEvent::NewMemberJoins => None,
    };

    actions
        .iter()
        .filter(|action| action.enabled && action.trigger_type == event.trigger_type())
        .filter(|action| match (&action.payload, &lowered_text) {
            (ActionPayload::WelcomeMessage { .. }, None) => true,
            (ActionPayload::PromptRunPlaybook { keywords, .. }, Some(text)) => {
                keywords.iter().any(|k| keyword_hits(k, text))
            }
            (ActionPayload::WelcomeMessage { .. }, Some(_)) => false,
            (ActionPayload::PromptRunPlaybook { .. }, None) => false,
        })
        .collect()
}

/// The keywords of `action` that occur in `text`, in configured order.
pub fn matched_keywords<'a>(action: &'a ChannelAction, text: &str) -> Vec<&'a str> {
    let lowered = text.to_lowercase();
    action
        .keywords()
        .unwrap_or_default()
        .iter()
        .filter(|k| keyword_hits(k, &lowered))
        .map(String::as_str)
        .collect()
}

fn keyword_hits(keyword: &str, lowered_text: &str) -> bool {
    !keyword.is_empty() && lowered_text.contains(&keyword.to_lowercase())
}

// ---------------------------------------------------------------------------
// Playbook prompts
// ---------------------------------------------------------------------------

/// A suggestion to start a playbook run, raised by a keyword match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookPrompt {
    pub channel_id: String,
    pub playbook_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    pub keywords: Vec<String>,
}

/// Turn the keyword matches for a post in `channel_id` into prompts.
pub fn prompts_for_post(
    actions: &[ChannelAction],
    channel_id: &str,
    text: &str,
) -> Vec<PlaybookPrompt> {
    let event = TriggerEvent::keywords_posted(text);
    match_actions(actions, &event)
        .into_iter()
        .filter_map(|action| match &action.payload {
            ActionPayload::PromptRunPlaybook { playbook_id, .. } => Some(PlaybookPrompt {
                channel_id: channel_id.to_string(),
                playbook_id: playbook_id.clone(),
                action_id: action.id.clone(),
                keywords: matched_keywords(action, text)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }),
            ActionPayload::WelcomeMessage { .. } => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
