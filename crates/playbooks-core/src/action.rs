//! Channel action data model.
//!
//! A `ChannelAction` is one automation rule configured on a channel: a
//! trigger (when it becomes eligible) paired with a payload (what to do).
//! The payload variant *is* the action type, so the two can never disagree.

use crate::error::{PlaybooksError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "send_welcome_message")]
    WelcomeMessage,
    #[serde(rename = "prompt_run_playbook")]
    PromptRunPlaybook,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::WelcomeMessage => "send_welcome_message",
            ActionType::PromptRunPlaybook => "prompt_run_playbook",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = PlaybooksError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "send_welcome_message" => Ok(ActionType::WelcomeMessage),
            "prompt_run_playbook" => Ok(ActionType::PromptRunPlaybook),
            _ => Err(PlaybooksError::InvalidActionType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    #[serde(rename = "new_member_joins")]
    NewMemberJoins,
    #[serde(rename = "keywords")]
    KeywordsPosted,
}

impl TriggerType {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerType::NewMemberJoins => "new_member_joins",
            TriggerType::KeywordsPosted => "keywords",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerType {
    type Err = PlaybooksError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "new_member_joins" => Ok(TriggerType::NewMemberJoins),
            "keywords" => Ok(TriggerType::KeywordsPosted),
            _ => Err(PlaybooksError::InvalidTriggerType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionPayload
// ---------------------------------------------------------------------------

/// What an action does once its trigger fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    /// Post an ephemeral welcome message to the joining member.
    WelcomeMessage { message: String },
    /// Suggest running `playbook_id` when any of `keywords` is posted.
    PromptRunPlaybook {
        keywords: Vec<String>,
        playbook_id: String,
    },
}

impl ActionPayload {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionPayload::WelcomeMessage { .. } => ActionType::WelcomeMessage,
            ActionPayload::PromptRunPlaybook { .. } => ActionType::PromptRunPlaybook,
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChannelAction", into = "RawChannelAction")]
pub struct ChannelAction {
    /// Server-assigned; `None` until the action has been persisted.
    pub id: Option<String>,
    pub channel_id: String,
    pub enabled: bool,
    pub trigger_type: TriggerType,
    pub payload: ActionPayload,
}

impl ChannelAction {
    /// Build an action, rejecting trigger/payload combinations that cannot
    /// be evaluated.
    ///
    /// A `KeywordsPosted` trigger needs a keyword list, which only
    /// `PromptRunPlaybook` payloads carry. `NewMemberJoins` with a prompt
    /// payload is accepted but never matches.
    pub fn new(
        channel_id: impl Into<String>,
        trigger_type: TriggerType,
        payload: ActionPayload,
    ) -> Result<Self> {
        if trigger_type == TriggerType::KeywordsPosted
            && !matches!(payload, ActionPayload::PromptRunPlaybook { .. })
        {
            return Err(PlaybooksError::InvalidAction {
                reason: format!(
                    "trigger '{}' requires a keyword list, but action '{}' has none",
                    trigger_type,
                    payload.action_type()
                ),
            });
        }
        Ok(Self {
            id: None,
            channel_id: channel_id.into(),
            enabled: true,
            trigger_type,
            payload,
        })
    }

    /// An enabled welcome message fired when a member joins.
    pub fn welcome_message(channel_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            channel_id: channel_id.into(),
            enabled: true,
            trigger_type: TriggerType::NewMemberJoins,
            payload: ActionPayload::WelcomeMessage {
                message: message.into(),
            },
        }
    }

    /// An enabled playbook prompt fired when any keyword is posted.
    pub fn prompt_run_playbook<K, S>(
        channel_id: impl Into<String>,
        keywords: K,
        playbook_id: impl Into<String>,
    ) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            channel_id: channel_id.into(),
            enabled: true,
            trigger_type: TriggerType::KeywordsPosted,
            payload: ActionPayload::PromptRunPlaybook {
                keywords: keywords.into_iter().map(Into::into).collect(),
                playbook_id: playbook_id.into(),
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn action_type(&self) -> ActionType {
        self.payload.action_type()
    }

    /// The keyword list, for payloads that carry one.
    pub fn keywords(&self) -> Option<&[String]> {
        match &self.payload {
            ActionPayload::PromptRunPlaybook { keywords, .. } => Some(keywords),
            ActionPayload::WelcomeMessage { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Structural equality
// ---------------------------------------------------------------------------

/// Do `a` and `b` occupy the same trigger slot?
///
/// Ids, enabled flags, messages and playbook ids are ignored. Keyword lists
/// compare element-wise, in order and case-sensitively.
pub fn equal_action_type(a: &ChannelAction, b: &ChannelAction) -> bool {
    if a.action_type() != b.action_type() {
        return false;
    }
    if a.trigger_type != b.trigger_type {
        return false;
    }
    match a.trigger_type {
        TriggerType::NewMemberJoins => true,
        TriggerType::KeywordsPosted => match (a.keywords(), b.keywords()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        },
    }
}

// ---------------------------------------------------------------------------
// Replace-in-place editing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Upsert {
    Replaced(usize),
    Appended(usize),
}

/// Insert `action` into `actions`, replacing the first entry in the same
/// trigger slot instead of appending a duplicate.
///
/// A replacement with no id inherits the id of the entry it replaces.
pub fn upsert_action(actions: &mut Vec<ChannelAction>, mut action: ChannelAction) -> Upsert {
    match actions.iter().position(|a| equal_action_type(a, &action)) {
        Some(index) => {
            if action.id.is_none() {
                action.id = actions[index].id.clone();
            }
            actions[index] = action;
            Upsert::Replaced(index)
        }
        None => {
            actions.push(action);
            Upsert::Appended(actions.len() - 1)
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct RawChannelAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    channel_id: String,
    #[serde(default)]
    enabled: bool,
    action_type: ActionType,
    trigger_type: TriggerType,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct WelcomeMessageFields {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct PromptRunPlaybookFields {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    playbook_id: String,
}

impl TryFrom<RawChannelAction> for ChannelAction {
    type Error = PlaybooksError;

    fn try_from(raw: RawChannelAction) -> Result<Self> {
        let payload = if raw.payload.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            raw.payload
        };
        let payload = match raw.action_type {
            ActionType::WelcomeMessage => {
                let fields: WelcomeMessageFields = serde_json::from_value(payload)?;
                ActionPayload::WelcomeMessage {
                    message: fields.message,
                }
            }
            ActionType::PromptRunPlaybook => {
                let fields: PromptRunPlaybookFields = serde_json::from_value(payload)?;
                ActionPayload::PromptRunPlaybook {
                    keywords: fields.keywords,
                    playbook_id: fields.playbook_id,
                }
            }
        };
        let mut action = ChannelAction::new(raw.channel_id, raw.trigger_type, payload)?;
        action.id = raw.id;
        action.enabled = raw.enabled;
        Ok(action)
    }
}

impl From<ChannelAction> for RawChannelAction {
    fn from(action: ChannelAction) -> Self {
        let action_type = action.action_type();
        let payload = match action.payload {
            ActionPayload::WelcomeMessage { message } => serde_json::json!({ "message": message }),
            ActionPayload::PromptRunPlaybook {
                keywords,
                playbook_id,
            } => serde_json::json!({ "keywords": keywords, "playbook_id": playbook_id }),
        };
        RawChannelAction {
            id: action.id,
            channel_id: action.channel_id,
            enabled: action.enabled,
            action_type,
            trigger_type: action.trigger_type,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
