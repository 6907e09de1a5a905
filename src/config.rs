//! Configuration with TOML, environment variables, and CLI overrides.

use crate::error::CheckError;
use crate::scrapers::extractor::ExtractorSettings;
use crate::scrapers::retry::RetryPolicy;
use crate::scrapers::types::SearchRequest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://oporacountryliving.reserve-online.net/";
pub const LOCAL_CONFIG: &str = "availability.toml";

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Booking engine URL the search is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub search: SearchRequest,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Seconds between checks in loop mode
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// HTML email template
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Optional log file written alongside console output
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub email: EmailConfig,

    /// File the settings were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_interval_secs() -> u64 {
    300
}

fn default_template_path() -> PathBuf {
    PathBuf::from("templates/email_template.html")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search: SearchRequest::default(),
            browser: BrowserConfig::default(),
            retry: RetryConfig::default(),
            interval_secs: default_interval_secs(),
            template_path: default_template_path(),
            log_file: None,
            email: EmailConfig::default(),
            source: None,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Loads an explicit file, else `availability.toml` in the working directory, else defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new(LOCAL_CONFIG);
        if local_config.exists() {
            return Self::from_file(local_config);
        }

        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        self.email = self.email.with_env();
        self
    }

    pub fn target_url(&self) -> String {
        self.search.target_url(&self.base_url)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            table_timeout: Duration::from_secs(self.browser.page_timeout_secs),
            settle: Duration::from_secs(self.browser.settle_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_secs(self.retry.base_delay_secs),
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }
}

/// Chrome launch and page timing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
    /// Bound on page-load and results-table waits
    pub page_timeout_secs: u64,
    /// Pause after submitting the search form
    pub settle_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36".to_string(),
            page_timeout_secs: 30,
            settle_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 4,
            max_delay_secs: 10,
        }
    }
}

/// SMTP delivery settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; falls back to the login user
    pub from: Option<String>,
    pub recipients: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            from: None,
            recipients: Vec::new(),
        }
    }
}

// Keep the password out of debug logs.
impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl EmailConfig {
    /// Applies `EMAIL_USER`, `EMAIL_PASSWORD`, `EMAIL_RECIPIENTS`, `SMTP_HOST` and `SMTP_PORT`.
    pub fn with_env(mut self) -> Self {
        if let Ok(user) = std::env::var("EMAIL_USER") {
            self.username = Some(user);
        }

        if let Ok(password) = std::env::var("EMAIL_PASSWORD") {
            self.password = Some(password);
        }

        if let Ok(recipients) = std::env::var("EMAIL_RECIPIENTS") {
            self.recipients = parse_recipients(&recipients);
        }

        if let Ok(host) = std::env::var("SMTP_HOST") {
            self.smtp_host = host;
        }

        if let Ok(port) = std::env::var("SMTP_PORT") {
            if let Ok(p) = port.parse() {
                self.smtp_port = p;
            }
        }

        self
    }

    pub fn sender(&self) -> Result<&str, CheckError> {
        self.from
            .as_deref()
            .or(self.username.as_deref())
            .ok_or_else(|| CheckError::MailConfig("no sender address (set EMAIL_USER)".into()))
    }
}

/// Split a comma-separated recipient list, dropping blanks
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
