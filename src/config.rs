// src/config.rs
//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;

use crate::error::AppError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_INDEX_DIR: &str = "vector_index";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:10000";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

/// Mail relay settings as found in the environment.
///
/// Every field stays optional and the port stays unparsed: the lead notifier
/// decides at send time whether the relay is usable, so a half-configured
/// relay only disables lead emails instead of stopping the server.
#[derive(Debug, Clone, Default)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub lead_to: Option<String>,
    /// Sender address (`LEAD_FROM_EMAIL`). When unset the relay login is
    /// used, which then has to be a full email address.
    pub from_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub smtp: SmtpSettings,
    pub index_dir: PathBuf,
    pub top_k: usize,
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub admin_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let temperature = match get("OPENAI_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().map_err(|e| {
                AppError::Config(format!("invalid OPENAI_TEMPERATURE '{raw}': {e}"))
            })?,
            None => 1.0,
        };

        let top_k = match get("RETRIEVER_TOP_K") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(AppError::Config(
                        "RETRIEVER_TOP_K must be at least 1".to_string(),
                    ));
                }
                Ok(k) => k,
                Err(e) => {
                    return Err(AppError::Config(format!(
                        "invalid RETRIEVER_TOP_K '{raw}': {e}"
                    )));
                }
            },
            None => DEFAULT_TOP_K,
        };

        Ok(Self {
            openai: OpenAiConfig {
                api_key,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                chat_model: get("OPENAI_CHAT_MODEL")
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                embedding_model: get("OPENAI_EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                temperature,
            },
            smtp: SmtpSettings {
                host: get("SMTP_HOST"),
                port: get("SMTP_PORT"),
                username: get("SMTP_USER"),
                password: get("SMTP_PASS"),
                lead_to: get("LEAD_TO_EMAIL"),
                from_address: get("LEAD_FROM_EMAIL"),
            },
            index_dir: get("INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR)),
            top_k,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            admin_key: get("ADMIN_API_KEY"),
        })
    }
}
