use crate::config::{Config, NO_NEWS_TEXT, Site};
use crate::error::{Error, Result};
use crate::record::{AlertRow, Observation};
use crate::util::truncate;
use csv::WriterBuilder;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CHAT_TIMEOUT: Duration = Duration::from_secs(15);
const ROW_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of a sink that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent,
    Skipped(&'static str),
}

/// Chat message body: a plain-text line plus optional Slack blocks.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
}

impl ChatMessage {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            blocks: None,
        }
    }

    pub fn alert(site: &Site, obs: &Observation) -> Self {
        let text = format!(
            ":bird: *{}* near *{}* - {} (obs {})",
            obs.com_name,
            site.name,
            obs.loc_name.as_deref().unwrap_or("Unknown"),
            obs.obs_dt
        );
        let map_link = format!("https://www.google.com/maps?q={},{}", obs.lat, obs.lng);
        let blocks = json!([
            {"type": "section", "text": {"type": "mrkdwn", "text": text}},
            {"type": "context", "elements": [
                {"type": "mrkdwn", "text": format!("<{}|Open map>", map_link)}
            ]}
        ]);

        Self {
            text,
            blocks: Some(blocks),
        }
    }
}

/// Fans each new sighting out to the chat webhook, the row webhook and the local log.
pub struct Notifier {
    client: Client,
    chat_url: Option<String>,
    row_url: Option<String>,
    csv_path: Option<PathBuf>,
}

impl Notifier {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            chat_url: config.chat_webhook_url.clone(),
            row_url: config.row_webhook_url.clone(),
            csv_path: config.csv_path.clone(),
        }
    }

    /// Run every sink for one sighting. A failing sink never stops the others.
    pub async fn alert(&self, site: &Site, obs: &Observation) {
        let message = ChatMessage::alert(site, obs);
        let row = AlertRow::new(site, obs);

        let (chat, sheet) = futures::join!(self.post_chat(&message), self.post_row(&row));

        if let Err(e) = chat {
            warn!("Chat post failed: {}", e);
        }
        match sheet {
            Ok(Delivery::Sent) => info!("Row sent to sheet webhook"),
            Ok(Delivery::Skipped(reason)) => debug!("Row webhook skipped: {}", reason),
            Err(e) => warn!("Row webhook: {}", e),
        }

        if let Some(path) = &self.csv_path {
            if let Err(e) = append_csv(path, &row) {
                warn!("Could not append to {}: {}", path.display(), e);
            }
        }
    }

    /// Heartbeat posted when a run found nothing new.
    pub async fn no_news(&self) {
        if let Err(e) = self.post_chat(&ChatMessage::plain(NO_NEWS_TEXT)).await {
            warn!("Couldn't post '{}': {}", NO_NEWS_TEXT, e);
        }
    }

    pub async fn post_chat(&self, message: &ChatMessage) -> Result<Delivery> {
        let Some(url) = &self.chat_url else {
            debug!("No chat webhook configured, dropping: {}", message.text);
            return Ok(Delivery::Skipped("no chat webhook configured"));
        };
        self.post_json("chat webhook", url, message, CHAT_TIMEOUT).await
    }

    pub async fn post_row(&self, row: &AlertRow) -> Result<Delivery> {
        let Some(url) = &self.row_url else {
            return Ok(Delivery::Skipped("no row webhook configured"));
        };
        self.post_json("row webhook", url, row, ROW_TIMEOUT).await
    }

    async fn post_json<T: Serialize>(
        &self,
        sink: &'static str,
        url: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<Delivery> {
        let response = self
            .client
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| Error::Notify { sink, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(Delivery::Sent);
        }

        let text = response.text().await.unwrap_or_default();
        Err(Error::NotifyStatus {
            sink,
            status: status.as_u16(),
            body: truncate(&text, 200).to_string(),
        })
    }
}

/// Append one row to the CSV log, writing the header only when the file is new.
pub fn append_csv(path: &Path, row: &AlertRow) -> Result<()> {
    let is_new = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(csv::Error::from)?;
    let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);

    writer.serialize(row)?;
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
