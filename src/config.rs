use anyhow::{Context, Result};

const DEFAULT_FEEDERS: &str = "GPV5.1";

/// Process-wide settings, read once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: String,
    /// URL of the provider page carrying the embedded schedule.
    pub schedule_url: String,
    /// Feeder identifiers the report is restricted to.
    pub feeders: Vec<String>,
}

impl Config {
    /// Read configuration from the environment. Missing required variables
    /// are a startup error.
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("BOT_TOKEN")
            .context("BOT_TOKEN environment variable must be set")?;
        let schedule_url = std::env::var("SCHEDULE_URL")
            .context("SCHEDULE_URL environment variable must be set")?;
        let feeders =
            parse_feeders(&std::env::var("FEEDERS").unwrap_or_else(|_| DEFAULT_FEEDERS.into()));

        Ok(Self {
            bot_token,
            schedule_url,
            feeders,
        })
    }
}

/// Split a comma-separated feeder list, dropping empty entries.
fn parse_feeders(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ── Tests ──
