//! HTTP client for the channel-action endpoints of the Playbooks plugin API.
//!
//! ```text
//! GET  {api}/actions/channels/{channel_id}?trigger_type={t}            → [ChannelAction]
//! GET  {api}/actions/channels/{channel_id}/check-and-send-message-on-join → {"viewed": bool}
//! POST {api}/actions/channels/{channel_id}                              → {"id": "..."}
//! PUT  {api}/actions/channels/{channel_id}/{action_id}
//! ```
//!
//! Non-2xx responses become [`PlaybooksError::Api`]. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::action::{ChannelAction, TriggerType};
use crate::config::ServerConfig;
use crate::error::{PlaybooksError, Result};
use crate::host::ChannelActionsApi;
use crate::paths::API_PATH;

#[derive(Deserialize)]
struct CheckAndSendResponse {
    #[serde(default)]
    viewed: bool,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

pub struct HttpActionsClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpActionsClient {
    pub fn new(server_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: format!("{}{}", server_url.trim_end_matches('/'), API_PATH),
            token,
        })
    }

    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        Self::new(&server.url, server.token.clone(), server.timeout())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn channel_url(&self, channel_id: &str) -> String {
        format!("{}/actions/channels/{}", self.api_url, channel_id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self
            .http
            .request(method, url)
            .header("X-Requested-With", "XMLHttpRequest");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> Result<Response> {
        let response = req.send().await?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "playbooks api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlaybooksError::Api {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        Ok(response)
    }

    /// Persist a new action; returns the server-assigned id.
    pub async fn create_channel_action(&self, action: &ChannelAction) -> Result<String> {
        let url = self.channel_url(&action.channel_id);
        let req = self.request(Method::POST, &url).json(action);
        let created: CreatedResponse = self.send(req, &url).await?.json().await?;
        Ok(created.id)
    }

    /// Overwrite an existing action, addressed by its id.
    pub async fn update_channel_action(&self, action: &ChannelAction) -> Result<()> {
        let id = action
            .id
            .as_deref()
            .ok_or_else(|| PlaybooksError::InvalidAction {
                reason: "cannot update an action that has no id".to_string(),
            })?;
        let url = format!("{}/{}", self.channel_url(&action.channel_id), id);
        let req = self.request(Method::PUT, &url).json(action);
        self.send(req, &url).await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelActionsApi for HttpActionsClient {
    async fn fetch_channel_actions(
        &self,
        channel_id: &str,
        trigger_type: TriggerType,
    ) -> Result<Vec<ChannelAction>> {
        let url = format!(
            "{}?trigger_type={}",
            self.channel_url(channel_id),
            trigger_type.as_str()
        );
        let req = self.request(Method::GET, &url);
        let actions = self.send(req, &url).await?.json().await?;
        Ok(actions)
    }

    async fn check_and_send_message_on_join(&self, channel_id: &str) -> Result<bool> {
        let url = format!(
            "{}/check-and-send-message-on-join",
            self.channel_url(channel_id)
        );
        let req = self.request(Method::GET, &url);
        let data: CheckAndSendResponse = self.send(req, &url).await?.json().await?;
        Ok(data.viewed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
