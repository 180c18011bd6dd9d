use std::path::PathBuf;

use anyhow::{Context, Result};
use rollcall_engine::EngineConfig;

/// Typed server configuration. Every recognized option is a field here;
/// there is no pass-through settings map.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub slash_token: String,
    pub channel: String,
    pub bot_name: String,
    pub bot_icon: String,
    pub present_reaction: String,
    pub absent_reaction: String,
    pub report_window: u32,
    pub prompt_text: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token =
            std::env::var("ROLLCALL_BOT_TOKEN").context("ROLLCALL_BOT_TOKEN is not set")?;
        let slash_token =
            std::env::var("ROLLCALL_SLASH_TOKEN").context("ROLLCALL_SLASH_TOKEN is not set")?;

        let port: u16 = std::env::var("ROLLCALL_PORT")
            .unwrap_or_else(|_| "3100".into())
            .parse()
            .context("ROLLCALL_PORT is not a port number")?;
        let report_window: u32 = std::env::var("ROLLCALL_REPORT_WINDOW")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .context("ROLLCALL_REPORT_WINDOW is not a number")?;

        Ok(Self {
            bot_token,
            slash_token,
            channel: std::env::var("ROLLCALL_CHANNEL").unwrap_or_else(|_| "general".into()),
            bot_name: std::env::var("ROLLCALL_BOT_NAME")
                .unwrap_or_else(|_| "attendance-bot".into()),
            bot_icon: std::env::var("ROLLCALL_BOT_ICON").unwrap_or_else(|_| ":memo:".into()),
            present_reaction: std::env::var("ROLLCALL_PRESENT_REACTION")
                .unwrap_or_else(|_| "thumbsup".into()),
            absent_reaction: std::env::var("ROLLCALL_ABSENT_REACTION")
                .unwrap_or_else(|_| "thumbsdown".into()),
            report_window,
            prompt_text: std::env::var("ROLLCALL_PROMPT_TEXT").unwrap_or_else(|_| {
                "Rehearsal day! Please indicate whether or not you can attend \
                 tonight by reacting with :thumbsup: (present) or :thumbsdown: \
                 (absent).\nTo RSVP on behalf of someone else, type /attendance \
                 for instructions."
                    .into()
            }),
            db_path: std::env::var("ROLLCALL_DB_PATH")
                .unwrap_or_else(|_| "rollcall.db".into())
                .into(),
            host: std::env::var("ROLLCALL_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            channel: self.channel.clone(),
            present_reaction: self.present_reaction.clone(),
            absent_reaction: self.absent_reaction.clone(),
            report_window: self.report_window,
            prompt_text: self.prompt_text.clone(),
        }
    }
}
