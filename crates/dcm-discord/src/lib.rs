//! Discord adapter (REST v10, reqwest).
//!
//! Implements the core `ChatPort` over the Discord HTTP API. Rate-limit and
//! reconnect handling are deliberately absent: any API failure is fatal to
//! the run, wrapped with the operation that hit it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, multipart, Response};

use dcm_core::{
    domain::{ChannelId, FetchedMessage, MessageId, MessageRef},
    ports::ChatPort,
    Error, Result,
};

pub mod wire;

const API_BASE: &str = "https://discord.com/api/v10";

pub struct DiscordClient {
    http: reqwest::Client,
    auth: String,
}

impl DiscordClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport("discord client build", e))?;
        Ok(Self {
            http,
            auth: format!("Bot {token}"),
        })
    }

    async fn check(op: &'static str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::transport(
            op,
            format!("{status} {}", body.chars().take(200).collect::<String>()),
        ))
    }
}

#[async_trait]
impl ChatPort for DiscordClient {
    async fn history_before(
        &self,
        channel: &ChannelId,
        limit: usize,
        before: Option<&MessageId>,
    ) -> Result<Vec<FetchedMessage>> {
        const OP: &str = "discord history fetch";

        let mut req = self
            .http
            .get(format!("{API_BASE}/channels/{channel}/messages"))
            .header(AUTHORIZATION, self.auth.as_str())
            .query(&[("limit", limit.to_string())]);
        if let Some(before) = before {
            req = req.query(&[("before", before.0.clone())]);
        }

        let resp = req.send().await.map_err(|e| Error::transport(OP, e))?;
        let page: Vec<wire::Message> = Self::check(OP, resp)
            .await?
            .json()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        page.into_iter().map(wire::Message::into_fetched).collect()
    }

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<MessageRef> {
        const OP: &str = "discord message send";

        let resp = self
            .http
            .post(format!("{API_BASE}/channels/{channel}/messages"))
            .header(AUTHORIZATION, self.auth.as_str())
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        let msg: wire::Created = Self::check(OP, resp)
            .await?
            .json()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        Ok(MessageRef {
            channel_id: channel.clone(),
            message_id: MessageId(msg.id),
        })
    }

    async fn pin(&self, msg: &MessageRef) -> Result<()> {
        const OP: &str = "discord message pin";

        let resp = self
            .http
            .put(format!(
                "{API_BASE}/channels/{}/pins/{}",
                msg.channel_id, msg.message_id
            ))
            .header(AUTHORIZATION, self.auth.as_str())
            .send()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        Self::check(OP, resp).await?;
        Ok(())
    }

    async fn send_file(
        &self,
        channel: &ChannelId,
        filename: &str,
        path: &Path,
    ) -> Result<MessageRef> {
        const OP: &str = "discord file upload";

        let bytes = tokio::fs::read(path).await?;
        let form = multipart::Form::new().part(
            "files[0]",
            multipart::Part::bytes(bytes).file_name(filename.to_string()),
        );

        let resp = self
            .http
            .post(format!("{API_BASE}/channels/{channel}/messages"))
            .header(AUTHORIZATION, self.auth.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        let msg: wire::Created = Self::check(OP, resp)
            .await?
            .json()
            .await
            .map_err(|e| Error::transport(OP, e))?;

        Ok(MessageRef {
            channel_id: channel.clone(),
            message_id: MessageId(msg.id),
        })
    }
}
