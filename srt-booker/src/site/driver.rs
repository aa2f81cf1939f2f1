//! Chrome session bootstrap over WebDriver.
//!
//! Checks that chromedriver is up before asking it for a session, so a
//! missing driver fails with a readable message instead of a connect error
//! deep inside the WebDriver client.

use std::time::Duration;

use fantoccini::ClientBuilder;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use super::webdriver::WebDriverSite;

/// Default chromedriver endpoint.
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Desktop Chrome user agent; the site serves a degraded page to headless UAs.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Errors from starting a browser session.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The status probe could not reach chromedriver
    #[error("cannot reach WebDriver at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// chromedriver answered with an error status
    #[error("WebDriver status {status}: {message}")]
    Status { status: u16, message: String },

    /// chromedriver is up but not accepting sessions
    #[error("WebDriver not ready: {0}")]
    NotReady(String),

    /// Session creation failed
    #[error("failed to start browser session: {0}")]
    Session(String),
}

/// Configuration for the browser session.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// chromedriver base URL
    pub webdriver_url: String,
    /// Run Chrome without a window
    pub headless: bool,
    /// User agent sent by Chrome
    pub user_agent: String,
    /// Window size in pixels (width, height)
    pub window_size: (u32, u32),
    /// How long to wait for page controls to appear, in seconds
    pub page_timeout_secs: u64,
    /// Pause after each form interaction, in milliseconds
    pub input_pause_ms: u64,
    /// Timeout for the status probe, in seconds
    pub probe_timeout_secs: u64,
}

impl BrowserConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_size: (1920, 1080),
            page_timeout_secs: 10,
            input_pause_ms: 500,
            probe_timeout_secs: 5,
        }
    }

    /// Set the chromedriver URL.
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    /// Run headless.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the pause after form interactions.
    pub fn with_input_pause(mut self, ms: u64) -> Self {
        self.input_pause_ms = ms;
        self
    }

    /// Returns the page control timeout as a Duration.
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Returns the input pause as a Duration.
    pub fn input_pause(&self) -> Duration {
        Duration::from_millis(self.input_pause_ms)
    }

    /// Chrome command-line arguments for this config.
    pub fn chrome_args(&self) -> Vec<String> {
        let (width, height) = self.window_size;
        let mut args = vec![
            format!("user-agent={}", self.user_agent),
            format!("window-size={width},{height}"),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    /// W3C capabilities requesting Chrome with [`BrowserConfig::chrome_args`].
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": self.chrome_args() }),
        );
        caps
    }

    fn base_url(&self) -> &str {
        self.webdriver_url.trim_end_matches('/')
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of the WebDriver `/status` endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    value: StatusValue,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    ready: bool,
    #[serde(default)]
    message: String,
}

/// Check that chromedriver is reachable and ready for a new session.
pub async fn probe(config: &BrowserConfig) -> Result<(), DriverError> {
    let url = format!("{}/status", config.base_url());
    let unreachable = |source| DriverError::Unreachable {
        url: url.clone(),
        source,
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.probe_timeout_secs))
        .build()
        .map_err(unreachable)?;

    let response = http.get(&url).send().await.map_err(unreachable)?;
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(DriverError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body: StatusResponse = response.json().await.map_err(unreachable)?;
    if !body.value.ready {
        return Err(DriverError::NotReady(body.value.message));
    }

    Ok(())
}

/// Probe chromedriver and open a Chrome session on it.
pub async fn connect(config: &BrowserConfig) -> Result<WebDriverSite, DriverError> {
    probe(config).await?;

    let mut builder = ClientBuilder::native();
    builder.capabilities(config.capabilities());

    let client = builder
        .connect(config.base_url())
        .await
        .map_err(|e| DriverError::Session(e.to_string()))?;

    info!(webdriver = %config.webdriver_url, headless = config.headless, "browser session started");

    Ok(WebDriverSite::new(client, config))
}
