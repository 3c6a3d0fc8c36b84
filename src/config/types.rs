use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default pause between requests, in seconds
pub const DEFAULT_SLEEP_TIME: f64 = 0.5;

/// Main configuration structure for Crawlkeep
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Pause between requests (seconds); the rate-limit backoff starts at ten times this
    #[serde(rename = "sleep-time")]
    pub sleep_time: f64,
}

impl CrawlerConfig {
    /// The per-request pause as a `Duration`
    ///
    /// Out-of-range values saturate; `validate` rejects them before a crawl starts.
    pub fn sleep_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.sleep_time).unwrap_or(if self.sleep_time > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        })
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            sleep_time: DEFAULT_SLEEP_TIME,
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("crawlkeep/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Storage location configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the per-crawl SQLite files
    pub directory: PathBuf,
}

impl StorageConfig {
    /// Resolves a datastore identifier to a database path
    ///
    /// `:memory:` is passed through untouched; any other name becomes
    /// `<directory>/<name>.sqlite3`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        if name == ":memory:" {
            return PathBuf::from(name);
        }
        self.directory.join(format!("{}.sqlite3", name))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("db"),
        }
    }
}
