pub mod discord;
pub mod message;

use async_trait::async_trait;

use message::Embed;

/// A message for the announcement channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub content: String,
    pub embeds: Vec<Embed>,
    /// Role allowed to be pinged by this message; no mentions otherwise.
    pub mention_role: Option<String>,
}

#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Watching,
    Listening,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub text: String,
    pub kind: ActivityKind,
}

#[async_trait]
pub trait PresenceSink: Send + Sync + 'static {
    async fn set_presence(&self, presence: &Presence) -> anyhow::Result<()>;
}

/// Presence sink for deployments without a gateway session; only logs.
pub struct LogPresenceSink;

#[async_trait]
impl PresenceSink for LogPresenceSink {
    async fn set_presence(&self, presence: &Presence) -> anyhow::Result<()> {
        log::info!("[PRESENCE] {:?} {}", presence.kind, presence.text);
        Ok(())
    }
}
