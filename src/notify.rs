//! Optional Discord webhook for end-of-run summaries.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

const USERNAME: &str = "Gazetteer";
/// Discord rejects embed descriptions longer than 4096 characters
const MAX_DESCRIPTION: usize = 4000;
const GREEN: u32 = 0x2E_CC_71;
const RED: u32 = 0xE7_4C_3C;

/// How a batch job ended, with its operator-facing text
#[derive(Debug, Clone, Copy)]
pub enum RunOutcome<'a> {
    /// Job finished; carries the report details
    Completed(&'a str),
    /// Job aborted; carries the error chain
    Failed(&'a str),
}

#[derive(Serialize, Debug)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
}

#[derive(Serialize, Debug)]
struct WebhookBody {
    username: &'static str,
    embeds: [Embed; 1],
}

/// Webhook body for one finished run
fn run_summary(mode: &str, outcome: RunOutcome<'_>, at: DateTime<Utc>) -> WebhookBody {
    let (verb, text, color) = match outcome {
        RunOutcome::Completed(text) => ("complete", text, GREEN),
        RunOutcome::Failed(text) => ("failed", text, RED),
    };
    let description = match text.trim() {
        "" => "(no details)".to_string(),
        text => truncate(text, MAX_DESCRIPTION),
    };
    WebhookBody {
        username: USERNAME,
        embeds: [Embed {
            title: format!("{mode} {verb}"),
            description,
            color,
            timestamp: at.to_rfc3339(),
        }],
    }
}

pub struct DiscordWebhook {
    url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    /// Post the run summary. A run never fails because of this, so errors are
    /// only logged.
    pub async fn report(&self, mode: &str, outcome: RunOutcome<'_>) {
        let body = run_summary(mode, outcome, Utc::now());
        match self.post(&body).await {
            Ok(()) => info!("Posted run summary: {}", body.embeds[0].title),
            Err(e) => warn!("Discord notification not sent: {:#}", e),
        }
    }

    async fn post(&self, body: &WebhookBody) -> Result<()> {
        let response = self.client.post(&self.url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("webhook answered {}: {}", status, text.trim());
        }
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
