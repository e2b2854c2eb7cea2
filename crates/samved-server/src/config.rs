use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use samved_llm::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub completion_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("SAMVED_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SAMVED_JWT_SECRET is unset or still a placeholder");
        }

        let api_key = lookup("GOOGLE_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            bail!("GOOGLE_API_KEY is unset");
        }

        let port: u16 = lookup("SAMVED_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SAMVED_PORT must be a port number")?;

        let timeout_secs: u64 = lookup("SAMVED_COMPLETION_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".into())
            .parse()
            .context("SAMVED_COMPLETION_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            bail!("SAMVED_COMPLETION_TIMEOUT_SECS must be positive");
        }

        Ok(Self {
            host: lookup("SAMVED_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: lookup("SAMVED_DB_PATH").unwrap_or_else(|| "samved.db".into()).into(),
            jwt_secret,
            api_key,
            model: lookup("SAMVED_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            base_url: lookup("SAMVED_GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            completion_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
