//! Contracts for the host application collaborators the poster depends on.
//!
//! - [`NavigationState`]: where the user currently is
//! - [`ChannelActionsApi`]: the Playbooks server (network, may fail)
//! - [`ViewedStore`]: the durable per-user "has viewed channel" record

use crate::action::{ChannelAction, TriggerType};
use crate::error::{PlaybooksError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChannelType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Open => "O",
            ChannelType::Private => "P",
            ChannelType::Direct => "D",
            ChannelType::Group => "G",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelType {
    type Err = PlaybooksError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "O" | "open" => Ok(ChannelType::Open),
            "P" | "private" => Ok(ChannelType::Private),
            "D" | "direct" => Ok(ChannelType::Direct),
            "G" | "group" => Ok(ChannelType::Group),
            _ => Err(PlaybooksError::InvalidChannelType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type", default)]
    pub channel_type: ChannelType,
}

impl Channel {
    pub fn new(id: impl Into<String>, channel_type: ChannelType) -> Self {
        Self {
            id: id.into(),
            channel_type,
        }
    }
}

// ---------------------------------------------------------------------------
// NavigationState
// ---------------------------------------------------------------------------

pub trait NavigationState {
    /// The channel or DM the user is viewing, if any.
    fn current_channel(&self) -> Option<Channel>;
    /// The current URL path.
    fn current_path(&self) -> String;
}

// ---------------------------------------------------------------------------
// ChannelActionsApi
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChannelActionsApi: Send + Sync {
    async fn fetch_channel_actions(
        &self,
        channel_id: &str,
        trigger_type: TriggerType,
    ) -> Result<Vec<ChannelAction>>;

    /// Ask the server to send the welcome message if it has not already.
    ///
    /// Resolves `true` when the message was sent now or earlier.
    async fn check_and_send_message_on_join(&self, channel_id: &str) -> Result<bool>;
}

#[async_trait]
impl<T: ChannelActionsApi + ?Sized> ChannelActionsApi for Arc<T> {
    async fn fetch_channel_actions(
        &self,
        channel_id: &str,
        trigger_type: TriggerType,
    ) -> Result<Vec<ChannelAction>> {
        (**self).fetch_channel_actions(channel_id, trigger_type).await
    }

    async fn check_and_send_message_on_join(&self, channel_id: &str) -> Result<bool> {
        (**self).check_and_send_message_on_join(channel_id).await
    }
}

// ---------------------------------------------------------------------------
// ViewedStore
// ---------------------------------------------------------------------------

pub trait ViewedStore {
    fn has_viewed_by_channel_id(&self) -> Result<HashMap<String, bool>>;
    fn mark_channel_viewed(&self, channel_id: &str) -> Result<()>;

    fn has_viewed(&self, channel_id: &str) -> Result<bool> {
        Ok(self
            .has_viewed_by_channel_id()?
            .get(channel_id)
            .copied()
            .unwrap_or(false))
    }
}

impl<T: ViewedStore + ?Sized> ViewedStore for Arc<T> {
    fn has_viewed_by_channel_id(&self) -> Result<HashMap<String, bool>> {
        (**self).has_viewed_by_channel_id()
    }

    fn mark_channel_viewed(&self, channel_id: &str) -> Result<()> {
        (**self).mark_channel_viewed(channel_id)
    }

    fn has_viewed(&self, channel_id: &str) -> Result<bool> {
        (**self).has_viewed(channel_id)
    }
}
