use crate::{error::DataError, symbol::Symbol};
use smol_str::SmolStr;
use std::{path::PathBuf, time::Duration};
use tracing::warn;
use url::Url;

/// Binance bulk 24h statistics endpoint.
pub const DEFAULT_REST_URL: &str = "https://api.binance.com/api/v3/ticker/24hr";

/// Tonapi rates endpoint for the one asset not listed on the primary source.
pub const DEFAULT_SECONDARY_URL: &str = "https://tonapi.io/v2/rates?tokens=ton&currencies=usd";

/// Binance all-market 24h rolling ticker stream.
pub const DEFAULT_WS_URL: &str = "wss://stream.binance.com:9443/ws/!ticker@arr";

/// Feed configuration shared by the snapshot and live clients.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Primary snapshot REST URL
    pub rest_url: String,
    /// Secondary rates REST URL
    pub secondary_url: String,
    /// Token key in the secondary rates payload (eg/ `TON`)
    pub secondary_token: SmolStr,
    /// Currency key in the secondary rates payload (eg/ `USD`)
    pub secondary_currency: SmolStr,
    /// Symbol the secondary asset is published under (eg/ `TONUSDT`)
    pub secondary_symbol: Symbol,
    /// Live stream WebSocket URL
    pub ws_url: String,
    /// Interval between snapshot polls
    pub poll_interval: Duration,
    /// Ping interval to keep the live connection alive
    pub ping_interval: Duration,
    /// Reconnection delay after the live connection drops
    pub reconnect_delay: Duration,
    /// Idle period after which a silent live connection is treated as dead
    pub read_timeout: Duration,
    /// Timeout applied to each REST request
    pub request_timeout: Duration,
    /// Maximum channel buffer size for live batches
    pub channel_buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            secondary_url: DEFAULT_SECONDARY_URL.to_string(),
            secondary_token: SmolStr::new_static("TON"),
            secondary_currency: SmolStr::new_static("USD"),
            secondary_symbol: SmolStr::new_static("TONUSDT"),
            ws_url: DEFAULT_WS_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
            read_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(10),
            channel_buffer_size: 1000,
        }
    }
}

impl FeedConfig {
    /// Construct a [`FeedConfig`] from defaults overlaid with environment variables:
    /// - `TICKERBOARD_REST_URL`
    /// - `TICKERBOARD_SECONDARY_URL`
    /// - `TICKERBOARD_WS_URL`
    /// - `TICKERBOARD_POLL_SECS`
    ///
    /// Absent or invalid values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let url_or = |key: &str, default: String| match lookup(key) {
            Some(value) if Url::parse(&value).is_ok() => value,
            Some(value) => {
                warn!(%key, %value, "ignoring invalid URL from environment");
                default
            }
            None => default,
        };

        let poll_interval = lookup("TICKERBOARD_POLL_SECS")
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        Self {
            rest_url: url_or("TICKERBOARD_REST_URL", defaults.rest_url.clone()),
            secondary_url: url_or("TICKERBOARD_SECONDARY_URL", defaults.secondary_url.clone()),
            ws_url: url_or("TICKERBOARD_WS_URL", defaults.ws_url.clone()),
            poll_interval,
            ..defaults
        }
    }

    /// Check every endpoint parses as a URL and every interval is non-zero.
    pub fn validate(&self) -> Result<(), DataError> {
        for (name, value) in [
            ("rest_url", &self.rest_url),
            ("secondary_url", &self.secondary_url),
            ("ws_url", &self.ws_url),
        ] {
            Url::parse(value)
                .map_err(|error| DataError::Config(format!("{name} {value:?}: {error}")))?;
        }

        for (name, value) in [
            ("poll_interval", self.poll_interval),
            ("ping_interval", self.ping_interval),
            ("request_timeout", self.request_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            if value.is_zero() {
                return Err(DataError::Config(format!("{name} must be non-zero")));
            }
        }

        if self.channel_buffer_size == 0 {
            return Err(DataError::Config(
                "channel_buffer_size must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Set snapshot poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set live stream URL
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// Set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set live stream idle read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

/// Directory holding device-local state: `TICKERBOARD_DATA_DIR`, else the platform
/// data directory joined with `tickerboard`, else the working directory.
pub fn data_dir() -> PathBuf {
    std::env::var_os("TICKERBOARD_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::data_dir().map(|dir| dir.join("tickerboard")))
        .unwrap_or_else(|| PathBuf::from(".tickerboard"))
}
