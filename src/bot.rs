//! Telegram delivery adapter: long-polling receive loop, command dispatch,
//! chunked sends. Core failures never escape a handler; what the user sees is
//! decided by the error kind, the full cause goes to the log.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ReportError;
use crate::report;

const TELEGRAM_API: &str = "https://api.telegram.org";
const MAX_MESSAGE_LEN: usize = 4000;
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

const HELP_TEXT: &str = "Бот показывает график отключений света.\n\
                         /start — получить текущий график\n\
                         /help — эта справка";
const USAGE_HINT: &str =
    "Не понимаю эту команду. Отправьте /start, чтобы получить график отключений, или /help.";
const APOLOGY_TEXT: &str = "Что-то пошло не так. Попробуйте ещё раз позже.";
const NO_DATA_TEXT: &str = "Данных об отключениях пока нет.";

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Other,
}

/// First word decides the command; a `@botname` suffix and extra arguments are
/// ignored.
fn command_of(text: &str) -> Command {
    let first = text.split_whitespace().next().unwrap_or("");
    let first = first.split('@').next().unwrap_or(first);
    match first {
        "/start" => Command::Start,
        "/help" => Command::Help,
        _ => Command::Other,
    }
}

/// Consecutive chunks of at most `max_chars` characters, in order, with no
/// awareness of line boundaries. Empty text yields no chunks.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut count = 0;
    for ch in text.chars() {
        buf.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut buf));
            count = 0;
        }
    }
    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

pub struct Bot {
    http: Client,
    config: Config,
}

/// Long-lived receive loop. SIGINT and SIGTERM both end it gracefully; every
/// update is handled in its own task so slow fetches do not hold up polling.
pub async fn run(config: Config) -> Result<()> {
    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    let bot = Arc::new(Bot {
        http: Client::new(),
        config,
    });
    let mut offset = 0i64;

    info!("Bot is up, waiting for commands");
    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down");
                break;
            }
            polled = bot.poll_updates(offset) => match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let bot = Arc::clone(&bot);
                        tokio::spawn(async move { bot.handle_update(update).await });
                    }
                }
                Err(e) => {
                    warn!("getUpdates failed: {e:#}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    info!("Bot stopped");
    Ok(())
}

impl Bot {
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", TELEGRAM_API, self.config.bot_token, method)
    }

    async fn poll_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&[("timeout", POLL_TIMEOUT_SECS as i64), ("offset", offset)])
            .send()
            .await?
            .error_for_status()?;

        let parsed: UpdatesResponse = response.json().await?;
        if !parsed.ok {
            bail!("getUpdates replied ok=false");
        }
        Ok(parsed.result)
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let chat_id = message.chat.id;
        let text = message.text.unwrap_or_default();

        let reply = match command_of(&text) {
            Command::Start => {
                self.send_report(chat_id).await;
                return;
            }
            Command::Help => HELP_TEXT,
            Command::Other => USAGE_HINT,
        };
        if let Err(e) = self.send_message(chat_id, reply).await {
            warn!("Failed to reply in chat {chat_id}: {e:#}");
        }
    }

    /// The "start" flow: build the report and deliver it in order, one message
    /// per chunk.
    async fn send_report(&self, chat_id: i64) {
        let report = report::outage_report(
            &self.http,
            &self.config.schedule_url,
            &self.config.feeders,
        )
        .await;

        let reply = match report {
            Ok(text) if text.is_empty() => NO_DATA_TEXT.to_string(),
            Ok(text) => {
                for chunk in chunk_text(&text, MAX_MESSAGE_LEN) {
                    if let Err(e) = self.send_message(chat_id, &chunk).await {
                        warn!("Failed to send report chunk to chat {chat_id}: {e:#}");
                        return;
                    }
                }
                return;
            }
            Err(e @ (ReportError::NotFound | ReportError::EmptyPayload)) => {
                info!("No schedule data: {e}");
                NO_DATA_TEXT.to_string()
            }
            Err(ReportError::UpstreamStatus(status)) => {
                warn!("Upstream reported status {status:?}");
                format!("Источник вернул статус: {status}")
            }
            Err(e) => {
                warn!("Report failed: {e}");
                APOLOGY_TEXT.to_string()
            }
        };
        if let Err(e) = self.send_message(chat_id, &reply).await {
            warn!("Failed to reply in chat {chat_id}: {e:#}");
        }
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        self.http
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .context("sendMessage rejected")?;
        Ok(())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_dispatch() {
        assert_eq!(command_of("/start"), Command::Start);
        assert_eq!(command_of("/start@gpv_bot now"), Command::Start);
        assert_eq!(command_of("/help"), Command::Help);
        assert_eq!(command_of("hello"), Command::Other);
        assert_eq!(command_of(""), Command::Other);
        assert_eq!(command_of("/started"), Command::Other);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("abc", 4000), vec!["abc"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 4000).is_empty());
    }

    #[test]
    fn long_text_splits_in_order() {
        let text = "a".repeat(4000) + &"b".repeat(4000) + "c";
        let chunks = chunk_text(&text, 4000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "a".repeat(4000));
        assert_eq!(chunks[1], "b".repeat(4000));
        assert_eq!(chunks[2], "c");
    }

    #[test]
    fn exact_fit_has_no_empty_tail() {
        assert_eq!(chunk_text(&"x".repeat(8000), 4000).len(), 2);
    }

    #[test]
    fn chunking_counts_characters_not_bytes() {
        let text = "д".repeat(5);
        let chunks = chunk_text(&text, 2);
        assert_eq!(chunks, vec!["дд", "дд", "д"]);
    }

    #[test]
    fn updates_response_deserializes() {
        let raw = r#"{"ok": true, "result": [
            {"update_id": 7, "message": {"chat": {"id": 42}, "text": "/start"}},
            {"update_id": 8, "message": {"chat": {"id": 42}}}
        ]}"#;
        let parsed: UpdatesResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.result.len(), 2);
        assert_eq!(parsed.result[0].update_id, 7);
        assert_eq!(parsed.result[0].message.as_ref().unwrap().chat.id, 42);
        assert!(parsed.result[1].message.as_ref().unwrap().text.is_none());
    }
}
