use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::appsettings::DiscordSettings;

use super::{Notification, NotificationSink};

const API_BASE: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts notifications to one Discord text channel through the REST API.
pub struct DiscordChannelSink {
    client: reqwest::Client,
    api_base: String,
    channel_id: String,
}

impl DiscordChannelSink {
    pub fn new(settings: &DiscordSettings) -> anyhow::Result<Self> {
        Self::with_api_base(settings, API_BASE)
    }

    pub fn with_api_base(settings: &DiscordSettings, api_base: &str) -> anyhow::Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bot {}", settings.token))
            .context("Discord token is not a valid header value")?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("imsakiyah/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_owned(),
            channel_id: settings.channel_id.clone(),
        })
    }
}

#[async_trait]
impl NotificationSink for DiscordChannelSink {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, self.channel_id);
        let response = self
            .client
            .post(&url)
            .json(&message_body(notification))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Discord rejected message with {status}: {text}");
        }

        Ok(())
    }
}

fn message_body(notification: &Notification) -> Value {
    let allowed_mentions = match &notification.mention_role {
        Some(role) => json!({ "roles": [role] }),
        None => json!({ "parse": [] }),
    };

    json!({
        "content": notification.content.trim(),
        "embeds": notification.embeds,
        "allowed_mentions": allowed_mentions,
    })
}
